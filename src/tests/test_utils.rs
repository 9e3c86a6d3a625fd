use crate::{
	config::Config,
	constants::{ONE_WEEK, SCOPE_SESSION},
	db::{self, DbPool},
	midware::jwt::Jwt,
};

pub const TEST_SECRET: &str = "test_secret";

pub fn test_config() -> Config {
	Config {
		secret_key: TEST_SECRET.to_string(),
		database_url: std::env::var("DATABASE_URL").unwrap_or_default(),
		bind_addr: "127.0.0.1:0".to_string(),
		debug: true,
		allowed_hosts: vec![],
		smtp: None,
	}
}

pub fn session_token(user_id: i32) -> String {
	Jwt::new(TEST_SECRET)
		.create_jwt(user_id.to_string(), SCOPE_SESSION, ONE_WEEK)
		.unwrap()
}

/// Pool for the DB-backed tests; those are `#[ignore]`d so plain
/// `cargo test` runs without a database.
pub fn test_pool() -> DbPool {
	let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for DB tests");
	db::get_db_pool(&url)
}

pub async fn init_schema(pool: &DbPool) {
	db::init(pool).await.expect("schema init failed");
}
