pub const AUTHORIZATION: &str = "Authorization";
pub const EMPTY: &str = "";
pub const MESSAGE_INVALID_TOKEN: &str = "Invalid or missing token";

// Token lifetimes, in seconds.
pub const ONE_WEEK: usize = 60 * 60 * 24 * 7;
pub const PENDING_2FA_TTL: usize = 5 * 60;
pub const PASSWORD_RESET_TTL: usize = 30 * 60;

// JWT scopes. A session token is a fully logged-in shop; a totp token only
// authorizes the second-factor verification step.
pub const SCOPE_SESSION: &str = "session";
pub const SCOPE_TOTP: &str = "totp";
pub const SCOPE_PASSWORD_RESET: &str = "password_reset";

// Routes that skip the JWT middleware entirely. The public cartella draw
// route is matched separately in midware::jwt because of its path params.
pub const IGNORE_ROUTES: [&str; 4] = [
	"/api/auth/login",
	"/api/auth/register",
	"/api/auth/password/forgot",
	"/api/auth/password/reset",
];

// Bingo numbers run 1..=75, five per column (B-I-N-G-O).
pub const BINGO_MAX_NUMBER: i32 = 75;
pub const BOARD_COLUMN_RANGES: [(i32, i32); 5] = [(1, 15), (16, 30), (31, 45), (46, 60), (61, 75)];
pub const BOARD_NUMBERS_PER_COLUMN: usize = 5;

pub const MAX_CARTELLAS_PER_PLAYER: usize = 4;
pub const HISTORY_LIMIT: i64 = 200;

pub const TOTP_STEP_SECONDS: u64 = 30;
pub const TOTP_DIGITS: u32 = 6;
pub const TOTP_ISSUER: &str = "LuluBingo";
