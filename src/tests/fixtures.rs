use bigdecimal::BigDecimal;
use diesel::prelude::*;

use crate::{
	models::{GameCreateRequest, NewShopUser, ShopStatus, ShopUser},
	schema::shop_users,
};

pub const TEST_PASSWORD: &str = "pass1234";

/// Inserts an active shop with a unique username so tests do not step on
/// each other's data.
pub fn create_active_shop(conn: &mut PgConnection, prefix: &str) -> ShopUser {
	let username = format!("{}-{}", prefix, uuid::Uuid::new_v4().simple());
	// Low bcrypt cost keeps the test suite fast.
	let hashed = bcrypt::hash(TEST_PASSWORD, 4).unwrap();
	diesel::insert_into(shop_users::table)
		.values(&NewShopUser {
			username: &username,
			name: "Test Shop",
			password: &hashed,
			status: ShopStatus::Active.as_str(),
			contact_phone: "",
			contact_email: "",
			wallet_balance: BigDecimal::from(0),
			must_change_password: false,
		})
		.get_result::<ShopUser>(conn)
		.unwrap()
}

pub fn small_game_request() -> GameCreateRequest {
	GameCreateRequest {
		bet_amount: BigDecimal::from(10),
		win_amount: BigDecimal::from(50),
		num_players: 2,
		cartella_numbers: Some(vec![vec![1, 2, 3], vec![4, 5, 6]]),
		cartella_count: None,
	}
}
