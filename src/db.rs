use diesel::{
	prelude::*,
	r2d2::{self, ConnectionManager},
};

pub type DbPool = r2d2::Pool<ConnectionManager<PgConnection>>;

pub fn get_db_pool(database_url: &str) -> DbPool {
	let manager = ConnectionManager::<PgConnection>::new(database_url);
	r2d2::Pool::builder().build(manager).expect("Failed to create pool.")
}

pub async fn init(pool: &DbPool) -> Result<(), diesel::result::Error> {
	let mut conn = pool.get().expect("can not get the pool address");
	diesel::sql_query(
		"CREATE TABLE IF NOT EXISTS shop_users (
			id SERIAL PRIMARY KEY,
			username VARCHAR(150) NOT NULL UNIQUE,
			name VARCHAR(255) NOT NULL DEFAULT 'New Shop',
			password TEXT NOT NULL,
			status VARCHAR(20) NOT NULL DEFAULT 'pending',
			contact_phone VARCHAR(50) NOT NULL DEFAULT '',
			contact_email VARCHAR(255) NOT NULL DEFAULT '',
			bank_name VARCHAR(120) NOT NULL DEFAULT '',
			bank_account VARCHAR(64) NOT NULL DEFAULT '',
			totp_secret VARCHAR(64),
			totp_pending_secret VARCHAR(64),
			must_change_password BOOLEAN NOT NULL DEFAULT TRUE,
			wallet_balance NUMERIC(12, 2) NOT NULL DEFAULT 0,
			created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
		);",
	)
	.execute(&mut conn)?;
	diesel::sql_query(
		"CREATE TABLE IF NOT EXISTS login_attempts (
			id SERIAL PRIMARY KEY,
			username VARCHAR(150) NOT NULL,
			user_id INTEGER REFERENCES shop_users(id) ON DELETE SET NULL,
			ip_address VARCHAR(64),
			user_agent VARCHAR(512) NOT NULL DEFAULT '',
			success BOOLEAN NOT NULL DEFAULT FALSE,
			created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
		);",
	)
	.execute(&mut conn)?;
	diesel::sql_query(
		"CREATE TABLE IF NOT EXISTS games (
			id SERIAL PRIMARY KEY,
			shop_id INTEGER NOT NULL REFERENCES shop_users(id) ON DELETE CASCADE,
			game_code VARCHAR(40) NOT NULL UNIQUE,
			bet_amount NUMERIC(12, 2) NOT NULL,
			win_amount NUMERIC(12, 2) NOT NULL,
			num_players INTEGER NOT NULL,
			status VARCHAR(20) NOT NULL DEFAULT 'created',
			winners JSONB NOT NULL DEFAULT '[]',
			created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
			started_at TIMESTAMPTZ,
			ended_at TIMESTAMPTZ
		);",
	)
	.execute(&mut conn)?;
	diesel::sql_query(
		"CREATE TABLE IF NOT EXISTS cartellas (
			id SERIAL PRIMARY KEY,
			game_id INTEGER NOT NULL REFERENCES games(id) ON DELETE CASCADE,
			cartella_number INTEGER NOT NULL,
			board JSONB NOT NULL DEFAULT '[]',
			drawn_numbers JSONB NOT NULL DEFAULT '[]',
			UNIQUE (game_id, cartella_number)
		);",
	)
	.execute(&mut conn)?;
	diesel::sql_query(
		"CREATE TABLE IF NOT EXISTS transactions (
			id UUID PRIMARY KEY,
			shop_id INTEGER NOT NULL REFERENCES shop_users(id) ON DELETE CASCADE,
			tx_type VARCHAR(30) NOT NULL,
			amount NUMERIC(12, 2) NOT NULL,
			balance_before NUMERIC(12, 2) NOT NULL,
			balance_after NUMERIC(12, 2) NOT NULL,
			reference VARCHAR(120) NOT NULL DEFAULT '',
			created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
		);",
	)
	.execute(&mut conn)?;
	diesel::sql_query(
		"CREATE INDEX IF NOT EXISTS tx_shop_created_idx
			ON transactions (shop_id, created_at DESC);",
	)
	.execute(&mut conn)?;

	Ok(())
}
