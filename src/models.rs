use crate::schema::*;
use bigdecimal::BigDecimal;
use diesel::{pg::Pg, prelude::*};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Queryable, Selectable, Serialize, Deserialize, Debug, Clone)]
#[diesel(table_name = shop_users)]
#[diesel(check_for_backend(Pg))]
pub struct ShopUser {
	pub id: i32,
	pub username: String,
	pub name: String,
	pub password: String,
	pub status: String,
	pub contact_phone: String,
	pub contact_email: String,
	pub bank_name: String,
	pub bank_account: String,
	pub totp_secret: Option<String>,
	pub totp_pending_secret: Option<String>,
	pub must_change_password: bool,
	pub wallet_balance: BigDecimal,
	pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Insertable)]
#[diesel(table_name = shop_users)]
pub struct NewShopUser<'a> {
	pub username: &'a str,
	pub name: &'a str,
	pub password: &'a str,
	pub status: &'a str,
	pub contact_phone: &'a str,
	pub contact_email: &'a str,
	pub wallet_balance: BigDecimal,
	pub must_change_password: bool,
}

#[derive(Queryable, Selectable, Serialize, Debug)]
#[diesel(table_name = login_attempts)]
#[diesel(check_for_backend(Pg))]
pub struct LoginAttempt {
	pub id: i32,
	pub username: String,
	pub user_id: Option<i32>,
	pub ip_address: Option<String>,
	pub user_agent: String,
	pub success: bool,
	pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Insertable)]
#[diesel(table_name = login_attempts)]
pub struct NewLoginAttempt<'a> {
	pub username: &'a str,
	pub user_id: Option<i32>,
	pub ip_address: Option<&'a str>,
	pub user_agent: &'a str,
	pub success: bool,
}

#[derive(Queryable, Selectable, Serialize, Debug, Clone)]
#[diesel(table_name = games)]
#[diesel(check_for_backend(Pg))]
pub struct Game {
	pub id: i32,
	pub shop_id: i32,
	pub game_code: String,
	pub bet_amount: BigDecimal,
	pub win_amount: BigDecimal,
	pub num_players: i32,
	pub status: String,
	pub winners: serde_json::Value,
	pub created_at: chrono::DateTime<chrono::Utc>,
	pub started_at: Option<chrono::DateTime<chrono::Utc>>,
	pub ended_at: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Insertable)]
#[diesel(table_name = games)]
pub struct NewGame<'a> {
	pub shop_id: i32,
	pub game_code: &'a str,
	pub bet_amount: BigDecimal,
	pub win_amount: BigDecimal,
	pub num_players: i32,
	pub status: &'a str,
	pub winners: serde_json::Value,
}

#[derive(Queryable, Selectable, Serialize, Debug, Clone)]
#[diesel(table_name = cartellas)]
#[diesel(check_for_backend(Pg))]
pub struct Cartella {
	pub id: i32,
	pub game_id: i32,
	pub cartella_number: i32,
	pub board: serde_json::Value,
	pub drawn_numbers: serde_json::Value,
}

#[derive(Insertable)]
#[diesel(table_name = cartellas)]
pub struct NewCartella {
	pub game_id: i32,
	pub cartella_number: i32,
	pub board: serde_json::Value,
	pub drawn_numbers: serde_json::Value,
}

impl Cartella {
	pub fn board_numbers(&self) -> Vec<i32> {
		serde_json::from_value(self.board.clone()).unwrap_or_default()
	}

	pub fn drawn_sequence(&self) -> Vec<i32> {
		serde_json::from_value(self.drawn_numbers.clone()).unwrap_or_default()
	}
}

#[derive(Queryable, Selectable, Insertable, Serialize, Debug, Clone)]
#[diesel(table_name = transactions)]
#[diesel(check_for_backend(Pg))]
pub struct Transaction {
	pub id: uuid::Uuid,
	pub shop_id: i32,
	pub tx_type: String,
	pub amount: BigDecimal,
	pub balance_before: BigDecimal,
	pub balance_after: BigDecimal,
	pub reference: String,
	pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TxType {
	Deposit,
	Withdrawal,
	BetDebit,
	BetCredit,
	Adjustment,
}

impl TxType {
	pub fn as_str(&self) -> &'static str {
		match self {
			TxType::Deposit => "deposit",
			TxType::Withdrawal => "withdrawal",
			TxType::BetDebit => "bet_debit",
			TxType::BetCredit => "bet_credit",
			TxType::Adjustment => "adjustment",
		}
	}

	pub fn is_credit(&self) -> bool {
		matches!(self, TxType::Deposit | TxType::BetCredit | TxType::Adjustment)
	}
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ShopStatus {
	Pending,
	Active,
	Suspended,
	Blocked,
}

impl ShopStatus {
	pub fn as_str(&self) -> &'static str {
		match self {
			ShopStatus::Pending => "pending",
			ShopStatus::Active => "active",
			ShopStatus::Suspended => "suspended",
			ShopStatus::Blocked => "blocked",
		}
	}
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum GameStatus {
	Created,
	Active,
	Closed,
}

impl GameStatus {
	pub fn as_str(&self) -> &'static str {
		match self {
			GameStatus::Created => "created",
			GameStatus::Active => "active",
			GameStatus::Closed => "closed",
		}
	}

	pub fn parse(s: &str) -> Option<Self> {
		match s {
			"created" => Some(GameStatus::Created),
			"active" => Some(GameStatus::Active),
			"closed" => Some(GameStatus::Closed),
			_ => None,
		}
	}

	// Lifecycle is strictly created -> active -> closed.
	pub fn can_transition_to(&self, next: GameStatus) -> bool {
		matches!(
			(self, next),
			(GameStatus::Created, GameStatus::Active) | (GameStatus::Active, GameStatus::Closed)
		)
	}
}

// ---------------------------------------------------------------------------
// Wire DTOs. Persistence entities above are never serialized to clients
// directly; each response shape is an explicit struct with a mapping fn.
// ---------------------------------------------------------------------------

#[derive(Serialize, Deserialize, Debug)]
pub struct ApiResponse<T> {
	pub status: String,
	pub data: Option<T>,
	pub error: Option<String>,
}

impl<T> ApiResponse<T> {
	pub fn success(data: T) -> Self {
		Self { status: "success".to_string(), data: Some(data), error: None }
	}

	pub fn error(detail: impl Into<String>) -> Self {
		Self { status: "error".to_string(), data: None, error: Some(detail.into()) }
	}
}

/// Public representation of a shop account. Credential and TOTP fields
/// never leave the server.
#[derive(Serialize, Deserialize, Debug)]
pub struct ShopUserPayload {
	pub id: i32,
	pub username: String,
	pub name: String,
	pub status: String,
	pub contact_phone: String,
	pub contact_email: String,
	pub bank_name: String,
	pub bank_account: String,
	pub totp_enabled: bool,
	pub must_change_password: bool,
	pub wallet_balance: BigDecimal,
	pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<&ShopUser> for ShopUserPayload {
	fn from(user: &ShopUser) -> Self {
		Self {
			id: user.id,
			username: user.username.clone(),
			name: user.name.clone(),
			status: user.status.clone(),
			contact_phone: user.contact_phone.clone(),
			contact_email: user.contact_email.clone(),
			bank_name: user.bank_name.clone(),
			bank_account: user.bank_account.clone(),
			totp_enabled: user.totp_secret.is_some(),
			must_change_password: user.must_change_password,
			wallet_balance: user.wallet_balance.clone(),
			created_at: user.created_at,
		}
	}
}

#[derive(Deserialize, Validate, Debug)]
pub struct RegisterRequest {
	#[validate(length(min = 3, max = 150))]
	pub username: String,
	#[validate(length(min = 8))]
	pub password: String,
	#[validate(length(max = 255))]
	pub name: Option<String>,
	#[validate(email)]
	pub contact_email: Option<String>,
	#[validate(length(max = 50))]
	pub contact_phone: Option<String>,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct LoginRequest {
	pub username: String,
	pub password: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct LoginResponse {
	pub token: String,
	pub totp_required: bool,
	pub requires_password_change: bool,
	pub user: ShopUserPayload,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct TotpCodeRequest {
	pub code: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct TotpSetupResponse {
	pub secret: String,
	pub otpauth_url: String,
}

#[derive(Deserialize, Validate, Debug)]
pub struct ChangePasswordRequest {
	pub current_password: String,
	#[validate(length(min = 8))]
	pub new_password: String,
}

#[derive(Deserialize, Debug)]
pub struct ForgotPasswordRequest {
	pub username: String,
}

#[derive(Deserialize, Validate, Debug)]
pub struct ResetPasswordRequest {
	pub token: String,
	#[validate(length(min = 8))]
	pub new_password: String,
}

#[derive(Deserialize, Validate, Debug)]
pub struct ProfileUpdateRequest {
	#[validate(length(min = 1, max = 255))]
	pub name: Option<String>,
	#[validate(length(max = 50))]
	pub contact_phone: Option<String>,
	#[validate(email)]
	pub contact_email: Option<String>,
	#[validate(length(max = 120))]
	pub bank_name: Option<String>,
	#[validate(length(max = 64))]
	pub bank_account: Option<String>,
}

#[derive(Deserialize, Serialize, Validate, Debug)]
pub struct GameCreateRequest {
	pub bet_amount: BigDecimal,
	pub win_amount: BigDecimal,
	#[validate(range(min = 1, max = 100))]
	pub num_players: i32,
	/// Explicit boards supplied by the client, one list per cartella.
	pub cartella_numbers: Option<Vec<Vec<i32>>>,
	/// Alternatively let the server generate this many random boards.
	#[validate(range(min = 1))]
	pub cartella_count: Option<i32>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct CartellaPayload {
	pub cartella_number: i32,
	pub board: Vec<i32>,
	pub drawn_numbers: Vec<i32>,
}

impl From<&Cartella> for CartellaPayload {
	fn from(c: &Cartella) -> Self {
		Self {
			cartella_number: c.cartella_number,
			board: c.board_numbers(),
			drawn_numbers: c.drawn_sequence(),
		}
	}
}

#[derive(Serialize, Deserialize, Debug)]
pub struct GamePayload {
	pub game_code: String,
	pub bet_amount: BigDecimal,
	pub win_amount: BigDecimal,
	pub num_players: i32,
	pub status: String,
	pub winners: Vec<i32>,
	pub cartellas: Vec<CartellaPayload>,
	pub created_at: chrono::DateTime<chrono::Utc>,
	pub started_at: Option<chrono::DateTime<chrono::Utc>>,
	pub ended_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl GamePayload {
	pub fn from_parts(game: &Game, cartellas: &[Cartella]) -> Self {
		Self {
			game_code: game.game_code.clone(),
			bet_amount: game.bet_amount.clone(),
			win_amount: game.win_amount.clone(),
			num_players: game.num_players,
			status: game.status.clone(),
			winners: serde_json::from_value(game.winners.clone()).unwrap_or_default(),
			cartellas: cartellas.iter().map(CartellaPayload::from).collect(),
			created_at: game.created_at,
			started_at: game.started_at,
			ended_at: game.ended_at,
		}
	}
}

#[derive(Deserialize, Serialize, Debug)]
pub struct GameCloseRequest {
	pub winners: Vec<i32>,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct ClaimRequest {
	pub cartella_number: i32,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ClaimResponse {
	pub game_code: String,
	pub cartella_number: i32,
	pub is_bingo: bool,
	pub matched_count: usize,
	pub required_count: usize,
	pub missing_numbers: Vec<i32>,
}

/// Per-cartella slice of `GameDrawsPayload`.
#[derive(Serialize, Deserialize, Debug)]
pub struct CartellaDrawsPayload {
	pub cartella_number: i32,
	pub drawn_numbers: Vec<i32>,
}

/// Draw sequences of a whole game, for the shop back office.
#[derive(Serialize, Deserialize, Debug)]
pub struct GameDrawsPayload {
	pub game_code: String,
	pub cartella_draw_sequences: Vec<CartellaDrawsPayload>,
}

/// Read-only cartella view served without a token, for player displays.
#[derive(Serialize, Deserialize, Debug)]
pub struct PublicCartellaPayload {
	pub game_code: String,
	pub cartella_number: i32,
	pub board: Vec<i32>,
	pub drawn_numbers: Vec<i32>,
	pub status: String,
	pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct DrawResponse {
	pub game_code: String,
	pub cartella_number: i32,
	pub number: i32,
	pub drawn_numbers: Vec<i32>,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct AmountRequest {
	pub amount: BigDecimal,
	pub reference: Option<String>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct TransactionPayload {
	pub id: uuid::Uuid,
	pub tx_type: String,
	pub amount: BigDecimal,
	pub balance_before: BigDecimal,
	pub balance_after: BigDecimal,
	pub reference: String,
	pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<&Transaction> for TransactionPayload {
	fn from(tx: &Transaction) -> Self {
		Self {
			id: tx.id,
			tx_type: tx.tx_type.clone(),
			amount: tx.amount.clone(),
			balance_before: tx.balance_before.clone(),
			balance_after: tx.balance_after.clone(),
			reference: tx.reference.clone(),
			created_at: tx.created_at,
		}
	}
}
