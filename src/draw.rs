use diesel::prelude::*;
use rand::seq::SliceRandom;
use std::collections::HashSet;

use crate::{
	constants::{BINGO_MAX_NUMBER, BOARD_COLUMN_RANGES, BOARD_NUMBERS_PER_COLUMN},
	errors::ApiError,
	models::{Cartella, Game, GameStatus},
	schema::{cartellas, games},
};

#[derive(Debug)]
pub struct DrawResult {
	pub game_code: String,
	pub cartella_number: i32,
	pub number: i32,
	pub drawn_numbers: Vec<i32>,
}

/// Numbers still eligible for a cartella given its drawn sequence.
pub fn eligible_numbers(drawn: &[i32]) -> Vec<i32> {
	let taken: HashSet<i32> = drawn.iter().copied().collect();
	(1..=BINGO_MAX_NUMBER).filter(|n| !taken.contains(n)).collect()
}

/// A 25-number board: five numbers from each BINGO column range, distinct
/// within the column.
pub fn generate_board() -> Vec<i32> {
	let mut rng = rand::thread_rng();
	let mut board = Vec::with_capacity(BOARD_COLUMN_RANGES.len() * BOARD_NUMBERS_PER_COLUMN);
	for (min_n, max_n) in BOARD_COLUMN_RANGES {
		let mut column: Vec<i32> = (min_n..=max_n).collect();
		column.shuffle(&mut rng);
		board.extend(column.into_iter().take(BOARD_NUMBERS_PER_COLUMN));
	}
	board
}

pub struct ClaimOutcome {
	pub is_bingo: bool,
	pub matched_count: usize,
	pub required_count: usize,
	pub missing_numbers: Vec<i32>,
}

/// Checks a cartella board against the numbers drawn for it so far.
pub fn evaluate_claim(board: &[i32], drawn: &[i32]) -> ClaimOutcome {
	let drawn_set: HashSet<i32> = drawn.iter().copied().collect();
	let missing: Vec<i32> = board.iter().copied().filter(|n| !drawn_set.contains(n)).collect();
	ClaimOutcome {
		is_bingo: missing.is_empty() && !board.is_empty(),
		matched_count: board.len() - missing.len(),
		required_count: board.len(),
		missing_numbers: missing,
	}
}

/// Draws the next number for one cartella of an active game.
///
/// Runs in a single database transaction with the cartella row locked
/// `FOR UPDATE`: two concurrent draws on the same cartella serialize, so
/// they can never pick the same number. The appended sequence is persisted
/// before the number is returned.
pub fn draw_next(
	conn: &mut PgConnection,
	game_code: &str,
	cartella_number: i32,
) -> Result<DrawResult, ApiError> {
	conn.transaction::<DrawResult, ApiError, _>(|conn| {
		let game = games::table
			.filter(games::game_code.eq(game_code))
			.select(Game::as_select())
			.first::<Game>(conn)
			.optional()?
			.ok_or(ApiError::NotFound("Game"))?;
		// Only active games accept draws; anything else is invisible to
		// the public endpoint.
		if game.status != GameStatus::Active.as_str() {
			return Err(ApiError::NotFound("Game"));
		}

		let cartella = cartellas::table
			.filter(cartellas::game_id.eq(game.id))
			.filter(cartellas::cartella_number.eq(cartella_number))
			.select(Cartella::as_select())
			.for_update()
			.first::<Cartella>(conn)
			.optional()?
			.ok_or(ApiError::NotFound("Cartella"))?;

		let mut drawn = cartella.drawn_sequence();
		let remaining = eligible_numbers(&drawn);
		let number = *remaining.choose(&mut rand::thread_rng()).ok_or(ApiError::AlreadyExhausted)?;

		drawn.push(number);
		diesel::update(cartellas::table.filter(cartellas::id.eq(cartella.id)))
			.set(cartellas::drawn_numbers.eq(serde_json::json!(drawn)))
			.execute(conn)?;

		log::info!(
			"Game {} cartella {}: drew {} ({} of {})",
			game_code,
			cartella_number,
			number,
			drawn.len(),
			BINGO_MAX_NUMBER
		);

		Ok(DrawResult {
			game_code: game.game_code,
			cartella_number,
			number,
			drawn_numbers: drawn,
		})
	})
}

/// Slug base for a game code. Capped at 30 chars so base, dash and
/// suffix always fit the VARCHAR(40) game_code column.
pub(crate) fn code_base(username: &str) -> String {
	let base: String = username
		.to_lowercase()
		.chars()
		.map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
		.take(30)
		.collect();
	if base.is_empty() {
		"game".to_string()
	} else {
		base
	}
}

/// Allocates a unique, human-readable game code: shop username plus a
/// numeric suffix, bumping the suffix on collision.
pub fn unique_game_code(conn: &mut PgConnection, username: &str) -> Result<String, ApiError> {
	use rand::Rng;
	let base = code_base(username);
	let mut suffix: u32 = rand::thread_rng().gen_range(1000..10000);
	loop {
		let candidate = format!("{}-{}", base, suffix);
		let exists: i64 = games::table
			.filter(games::game_code.eq(&candidate))
			.count()
			.get_result(conn)?;
		if exists == 0 {
			return Ok(candidate);
		}
		suffix += 1;
	}
}
