use actix_web::{http::StatusCode, web, App};
use actix_web::test::{call_service, init_service, read_body_json, TestRequest};
use bigdecimal::BigDecimal;
use diesel::prelude::*;

use std::collections::HashSet;

use crate::{
	constants::BINGO_MAX_NUMBER,
	db::DbPool,
	draw, game_routes, ledger,
	midware::jwt::Authentication,
	models::{
		ApiResponse, ClaimRequest, ClaimResponse, DrawResponse, Game, GameCloseRequest,
		GameDrawsPayload, GamePayload, GameStatus, NewCartella, NewGame, PublicCartellaPayload,
		TxType,
	},
	schema::{cartellas, games, shop_users},
	tests::{fixtures, test_utils::{self, TEST_SECRET}},
};

macro_rules! game_app {
	($pool:expr) => {
		init_service(
			App::new()
				.app_data(web::Data::new($pool.clone()))
				.app_data(web::Data::new(test_utils::test_config()))
				.wrap(Authentication::new(TEST_SECRET))
				.configure(game_routes::init),
		)
		.await
	};
}

/// Inserts an active game with one cartella directly, bypassing the HTTP
/// surface, for tests that hammer the draw path.
fn insert_active_game(pool: &DbPool, shop_id: i32, board: &[i32]) -> String {
	let mut conn = pool.get().unwrap();
	let code = format!("contend-{}", &uuid::Uuid::new_v4().simple().to_string()[..12]);
	let game = diesel::insert_into(games::table)
		.values(&NewGame {
			shop_id,
			game_code: &code,
			bet_amount: BigDecimal::from(10),
			win_amount: BigDecimal::from(50),
			num_players: 1,
			status: GameStatus::Active.as_str(),
			winners: serde_json::json!([]),
		})
		.get_result::<Game>(&mut conn)
		.unwrap();
	diesel::insert_into(cartellas::table)
		.values(&NewCartella {
			game_id: game.id,
			cartella_number: 1,
			board: serde_json::json!(board),
			drawn_numbers: serde_json::json!([]),
		})
		.execute(&mut conn)
		.unwrap();
	code
}

fn set_drawn(pool: &DbPool, game_code: &str, cartella_number: i32, drawn: &[i32]) {
	let mut conn = pool.get().unwrap();
	let target = cartellas::table
		.filter(cartellas::cartella_number.eq(cartella_number))
		.filter(cartellas::game_id.eq_any(
			games::table.filter(games::game_code.eq(game_code)).select(games::id),
		));
	diesel::update(target)
		.set(cartellas::drawn_numbers.eq(serde_json::json!(drawn)))
		.execute(&mut conn)
		.unwrap();
}

#[actix_web::test]
#[ignore = "requires a running Postgres (set DATABASE_URL)"]
async fn game_flows_from_created_to_closed() {
	let pool = test_utils::test_pool();
	test_utils::init_schema(&pool).await;
	let user = fixtures::create_active_shop(&mut pool.get().unwrap(), "lifecycle");
	let token = test_utils::session_token(user.id);
	ledger::apply_transaction(
		&mut pool.get().unwrap(),
		user.id,
		TxType::Deposit,
		&BigDecimal::from(50),
		"",
	)
	.unwrap();

	let app = game_app!(pool);

	let req = TestRequest::post()
		.uri("/api/games/games")
		.insert_header(("Authorization", format!("Token {}", token)))
		.set_json(fixtures::small_game_request())
		.to_request();
	let resp = call_service(&app, req).await;
	assert_eq!(resp.status(), StatusCode::CREATED);
	let body: ApiResponse<GamePayload> = read_body_json(resp).await;
	let game = body.data.unwrap();
	assert_eq!(game.status, "created");
	assert_eq!(game.cartellas.len(), 2);
	assert!(game.started_at.is_none());
	let code = game.game_code;

	// Closing before activation is not a legal transition.
	let req = TestRequest::post()
		.uri(&format!("/api/games/games/{}/close", code))
		.insert_header(("Authorization", format!("Token {}", token)))
		.set_json(GameCloseRequest { winners: vec![1] })
		.to_request();
	let resp = call_service(&app, req).await;
	assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

	let req = TestRequest::post()
		.uri(&format!("/api/games/games/{}/activate", code))
		.insert_header(("Authorization", format!("Token {}", token)))
		.to_request();
	let resp = call_service(&app, req).await;
	assert_eq!(resp.status(), StatusCode::OK);
	let body: ApiResponse<GamePayload> = read_body_json(resp).await;
	let game = body.data.unwrap();
	assert_eq!(game.status, "active");
	assert!(game.started_at.is_some());

	// Bet of 10 per cartella, two cartellas: 50 - 20 = 30 left.
	let balance: BigDecimal = shop_users::table
		.filter(shop_users::id.eq(user.id))
		.select(shop_users::wallet_balance)
		.first(&mut pool.get().unwrap())
		.unwrap();
	assert_eq!(balance, BigDecimal::from(30));

	// Activating twice is rejected.
	let req = TestRequest::post()
		.uri(&format!("/api/games/games/{}/activate", code))
		.insert_header(("Authorization", format!("Token {}", token)))
		.to_request();
	let resp = call_service(&app, req).await;
	assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

	// Unknown winner numbers are rejected before the game closes.
	let req = TestRequest::post()
		.uri(&format!("/api/games/games/{}/close", code))
		.insert_header(("Authorization", format!("Token {}", token)))
		.set_json(GameCloseRequest { winners: vec![9] })
		.to_request();
	let resp = call_service(&app, req).await;
	assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

	let req = TestRequest::post()
		.uri(&format!("/api/games/games/{}/close", code))
		.insert_header(("Authorization", format!("Token {}", token)))
		.set_json(GameCloseRequest { winners: vec![2] })
		.to_request();
	let resp = call_service(&app, req).await;
	assert_eq!(resp.status(), StatusCode::OK);
	let body: ApiResponse<GamePayload> = read_body_json(resp).await;
	let game = body.data.unwrap();
	assert_eq!(game.status, "closed");
	assert_eq!(game.winners, vec![2]);
	assert!(game.ended_at.is_some());
}

#[actix_web::test]
#[ignore = "requires a running Postgres (set DATABASE_URL)"]
async fn activation_fails_without_funds() {
	let pool = test_utils::test_pool();
	test_utils::init_schema(&pool).await;
	let user = fixtures::create_active_shop(&mut pool.get().unwrap(), "no-funds");
	let token = test_utils::session_token(user.id);
	let app = game_app!(pool);

	let req = TestRequest::post()
		.uri("/api/games/games")
		.insert_header(("Authorization", format!("Token {}", token)))
		.set_json(fixtures::small_game_request())
		.to_request();
	let resp = call_service(&app, req).await;
	let body: ApiResponse<GamePayload> = read_body_json(resp).await;
	let code = body.data.unwrap().game_code;

	let req = TestRequest::post()
		.uri(&format!("/api/games/games/{}/activate", code))
		.insert_header(("Authorization", format!("Token {}", token)))
		.to_request();
	let resp = call_service(&app, req).await;
	assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

	// The failed activation rolls back: the game is still created.
	let req = TestRequest::get()
		.uri(&format!("/api/games/games/{}", code))
		.insert_header(("Authorization", format!("Token {}", token)))
		.to_request();
	let resp = call_service(&app, req).await;
	let body: ApiResponse<GamePayload> = read_body_json(resp).await;
	assert_eq!(body.data.unwrap().status, "created");
}

#[actix_web::test]
#[ignore = "requires a running Postgres (set DATABASE_URL)"]
async fn public_draw_needs_no_token_and_exhausts_cleanly() {
	let pool = test_utils::test_pool();
	test_utils::init_schema(&pool).await;
	let user = fixtures::create_active_shop(&mut pool.get().unwrap(), "draw");
	let token = test_utils::session_token(user.id);
	ledger::apply_transaction(
		&mut pool.get().unwrap(),
		user.id,
		TxType::Deposit,
		&BigDecimal::from(50),
		"",
	)
	.unwrap();
	let app = game_app!(pool);

	let req = TestRequest::post()
		.uri("/api/games/games")
		.insert_header(("Authorization", format!("Token {}", token)))
		.set_json(fixtures::small_game_request())
		.to_request();
	let resp = call_service(&app, req).await;
	let body: ApiResponse<GamePayload> = read_body_json(resp).await;
	let code = body.data.unwrap().game_code;

	// The game is not active yet: the public endpoint hides it.
	let req = TestRequest::get()
		.uri(&format!("/api/games/games/{}/cartellas/1/draw", code))
		.to_request();
	let resp = call_service(&app, req).await;
	assert_eq!(resp.status(), StatusCode::NOT_FOUND);

	let req = TestRequest::post()
		.uri(&format!("/api/games/games/{}/activate", code))
		.insert_header(("Authorization", format!("Token {}", token)))
		.to_request();
	assert_eq!(call_service(&app, req).await.status(), StatusCode::OK);

	// No Authorization header on the draw itself.
	let req = TestRequest::get()
		.uri(&format!("/api/games/games/{}/cartellas/1/draw", code))
		.to_request();
	let resp = call_service(&app, req).await;
	assert_eq!(resp.status(), StatusCode::OK);
	let body: ApiResponse<DrawResponse> = read_body_json(resp).await;
	let drawn = body.data.unwrap();
	assert!(drawn.number >= 1 && drawn.number <= BINGO_MAX_NUMBER);
	assert_eq!(drawn.drawn_numbers, vec![drawn.number]);

	// Unknown cartella on a known game.
	let req = TestRequest::get()
		.uri(&format!("/api/games/games/{}/cartellas/9/draw", code))
		.to_request();
	assert_eq!(call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

	// Leave exactly one eligible number, then draw twice.
	let almost_all: Vec<i32> = (1..BINGO_MAX_NUMBER).collect();
	set_drawn(&pool, &code, 2, &almost_all);

	let req = TestRequest::get()
		.uri(&format!("/api/games/games/{}/cartellas/2/draw", code))
		.to_request();
	let resp = call_service(&app, req).await;
	assert_eq!(resp.status(), StatusCode::OK);
	let body: ApiResponse<DrawResponse> = read_body_json(resp).await;
	let drawn = body.data.unwrap();
	assert_eq!(drawn.number, BINGO_MAX_NUMBER);
	assert_eq!(drawn.drawn_numbers.len(), BINGO_MAX_NUMBER as usize);

	let req = TestRequest::get()
		.uri(&format!("/api/games/games/{}/cartellas/2/draw", code))
		.to_request();
	assert_eq!(call_service(&app, req).await.status(), StatusCode::CONFLICT);
}

#[actix_web::test]
#[ignore = "requires a running Postgres (set DATABASE_URL)"]
async fn concurrent_draws_never_repeat_a_number() {
	let pool = test_utils::test_pool();
	test_utils::init_schema(&pool).await;
	let user = fixtures::create_active_shop(&mut pool.get().unwrap(), "contend-draw");
	let code = insert_active_game(&pool, user.id, &[1, 2, 3]);

	// Five threads race for 100 draws total; only 75 numbers exist. The
	// cartella row lock serializes them, so no number repeats.
	let handles: Vec<_> = (0..5)
		.map(|_| {
			let pool = pool.clone();
			let code = code.clone();
			std::thread::spawn(move || {
				let mut conn = pool.get().unwrap();
				let mut numbers = Vec::new();
				for _ in 0..20 {
					if let Ok(result) = draw::draw_next(&mut conn, &code, 1) {
						numbers.push(result.number);
					}
				}
				numbers
			})
		})
		.collect();

	let mut all_numbers = Vec::new();
	for handle in handles {
		all_numbers.extend(handle.join().unwrap());
	}
	assert_eq!(all_numbers.len(), BINGO_MAX_NUMBER as usize);
	let distinct: HashSet<i32> = all_numbers.iter().copied().collect();
	assert_eq!(distinct.len(), BINGO_MAX_NUMBER as usize);

	// The persisted sequence agrees.
	let mut conn = pool.get().unwrap();
	let err = draw::draw_next(&mut conn, &code, 1).unwrap_err();
	assert!(matches!(err, crate::errors::ApiError::AlreadyExhausted));
}

#[actix_web::test]
#[ignore = "requires a running Postgres (set DATABASE_URL)"]
async fn claim_reflects_drawn_coverage() {
	let pool = test_utils::test_pool();
	test_utils::init_schema(&pool).await;
	let user = fixtures::create_active_shop(&mut pool.get().unwrap(), "claim");
	let token = test_utils::session_token(user.id);
	let app = game_app!(pool);

	let req = TestRequest::post()
		.uri("/api/games/games")
		.insert_header(("Authorization", format!("Token {}", token)))
		.set_json(fixtures::small_game_request())
		.to_request();
	let resp = call_service(&app, req).await;
	let body: ApiResponse<GamePayload> = read_body_json(resp).await;
	let code = body.data.unwrap().game_code;

	// Nothing drawn yet: not a bingo.
	let req = TestRequest::post()
		.uri(&format!("/api/games/games/{}/claim", code))
		.insert_header(("Authorization", format!("Token {}", token)))
		.set_json(ClaimRequest { cartella_number: 1 })
		.to_request();
	let resp = call_service(&app, req).await;
	assert_eq!(resp.status(), StatusCode::OK);
	let body: ApiResponse<ClaimResponse> = read_body_json(resp).await;
	let claim = body.data.unwrap();
	assert!(!claim.is_bingo);
	assert_eq!(claim.matched_count, 0);
	assert_eq!(claim.missing_numbers, vec![1, 2, 3]);

	// Mark the full board (plus noise) as drawn.
	set_drawn(&pool, &code, 1, &[7, 3, 1, 2, 50]);

	let req = TestRequest::post()
		.uri(&format!("/api/games/games/{}/claim", code))
		.insert_header(("Authorization", format!("Token {}", token)))
		.set_json(ClaimRequest { cartella_number: 1 })
		.to_request();
	let resp = call_service(&app, req).await;
	let body: ApiResponse<ClaimResponse> = read_body_json(resp).await;
	let claim = body.data.unwrap();
	assert!(claim.is_bingo);
	assert_eq!(claim.matched_count, 3);
	assert!(claim.missing_numbers.is_empty());
}

#[actix_web::test]
#[ignore = "requires a running Postgres (set DATABASE_URL)"]
async fn games_are_scoped_to_their_shop() {
	let pool = test_utils::test_pool();
	test_utils::init_schema(&pool).await;
	let mut conn = pool.get().unwrap();
	let owner = fixtures::create_active_shop(&mut conn, "owner");
	let other = fixtures::create_active_shop(&mut conn, "other");
	drop(conn);
	let owner_token = test_utils::session_token(owner.id);
	let other_token = test_utils::session_token(other.id);
	let app = game_app!(pool);

	let req = TestRequest::post()
		.uri("/api/games/games")
		.insert_header(("Authorization", format!("Token {}", owner_token)))
		.set_json(fixtures::small_game_request())
		.to_request();
	let resp = call_service(&app, req).await;
	let body: ApiResponse<GamePayload> = read_body_json(resp).await;
	let code = body.data.unwrap().game_code;

	let req = TestRequest::get()
		.uri(&format!("/api/games/games/{}", code))
		.insert_header(("Authorization", format!("Token {}", other_token)))
		.to_request();
	assert_eq!(call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

	let req = TestRequest::get()
		.uri("/api/games/games")
		.insert_header(("Authorization", format!("Token {}", other_token)))
		.to_request();
	let resp = call_service(&app, req).await;
	let body: ApiResponse<Vec<GamePayload>> = read_body_json(resp).await;
	assert!(body.data.unwrap().is_empty());
}

#[actix_web::test]
#[ignore = "requires a running Postgres (set DATABASE_URL)"]
async fn draw_sequences_view_is_shop_scoped() {
	let pool = test_utils::test_pool();
	test_utils::init_schema(&pool).await;
	let mut conn = pool.get().unwrap();
	let owner = fixtures::create_active_shop(&mut conn, "draws-view");
	let other = fixtures::create_active_shop(&mut conn, "draws-other");
	drop(conn);
	let owner_token = test_utils::session_token(owner.id);
	let other_token = test_utils::session_token(other.id);
	let app = game_app!(pool);

	let req = TestRequest::post()
		.uri("/api/games/games")
		.insert_header(("Authorization", format!("Token {}", owner_token)))
		.set_json(fixtures::small_game_request())
		.to_request();
	let resp = call_service(&app, req).await;
	let body: ApiResponse<GamePayload> = read_body_json(resp).await;
	let code = body.data.unwrap().game_code;
	set_drawn(&pool, &code, 1, &[5, 9]);

	// No token: rejected by the middleware.
	let req = TestRequest::get().uri(&format!("/api/games/games/{}/draw", code)).to_request();
	assert_eq!(call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);

	let req = TestRequest::get()
		.uri(&format!("/api/games/games/{}/draw", code))
		.insert_header(("Authorization", format!("Token {}", owner_token)))
		.to_request();
	let resp = call_service(&app, req).await;
	assert_eq!(resp.status(), StatusCode::OK);
	let body: ApiResponse<GameDrawsPayload> = read_body_json(resp).await;
	let draws = body.data.unwrap();
	assert_eq!(draws.game_code, code);
	assert_eq!(draws.cartella_draw_sequences.len(), 2);
	assert_eq!(draws.cartella_draw_sequences[0].cartella_number, 1);
	assert_eq!(draws.cartella_draw_sequences[0].drawn_numbers, vec![5, 9]);
	assert!(draws.cartella_draw_sequences[1].drawn_numbers.is_empty());

	// Another shop cannot read the sequences.
	let req = TestRequest::get()
		.uri(&format!("/api/games/games/{}/draw", code))
		.insert_header(("Authorization", format!("Token {}", other_token)))
		.to_request();
	assert_eq!(call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
#[ignore = "requires a running Postgres (set DATABASE_URL)"]
async fn public_cartella_view_needs_no_token() {
	let pool = test_utils::test_pool();
	test_utils::init_schema(&pool).await;
	let user = fixtures::create_active_shop(&mut pool.get().unwrap(), "public-view");
	let token = test_utils::session_token(user.id);
	let app = game_app!(pool);

	let req = TestRequest::post()
		.uri("/api/games/games")
		.insert_header(("Authorization", format!("Token {}", token)))
		.set_json(fixtures::small_game_request())
		.to_request();
	let resp = call_service(&app, req).await;
	let body: ApiResponse<GamePayload> = read_body_json(resp).await;
	let code = body.data.unwrap().game_code;
	set_drawn(&pool, &code, 1, &[2]);

	// Readable without a token even though the game is not active yet.
	let req = TestRequest::get().uri(&format!("/api/games/game/{}/cartella/1", code)).to_request();
	let resp = call_service(&app, req).await;
	assert_eq!(resp.status(), StatusCode::OK);
	let body: ApiResponse<PublicCartellaPayload> = read_body_json(resp).await;
	let view = body.data.unwrap();
	assert_eq!(view.game_code, code);
	assert_eq!(view.cartella_number, 1);
	assert_eq!(view.board, vec![1, 2, 3]);
	assert_eq!(view.drawn_numbers, vec![2]);
	assert_eq!(view.status, "created");

	let req = TestRequest::get().uri(&format!("/api/games/game/{}/cartella/9", code)).to_request();
	assert_eq!(call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

	let req = TestRequest::get().uri("/api/games/game/no-such-game/cartella/1").to_request();
	assert_eq!(call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
#[ignore = "requires a running Postgres (set DATABASE_URL)"]
async fn server_generated_boards_are_valid() {
	let pool = test_utils::test_pool();
	test_utils::init_schema(&pool).await;
	let user = fixtures::create_active_shop(&mut pool.get().unwrap(), "gen-boards");
	let token = test_utils::session_token(user.id);
	let app = game_app!(pool);

	let mut request = fixtures::small_game_request();
	request.cartella_numbers = None;
	request.cartella_count = Some(3);
	let req = TestRequest::post()
		.uri("/api/games/games")
		.insert_header(("Authorization", format!("Token {}", token)))
		.set_json(request)
		.to_request();
	let resp = call_service(&app, req).await;
	assert_eq!(resp.status(), StatusCode::CREATED);
	let body: ApiResponse<GamePayload> = read_body_json(resp).await;
	let game = body.data.unwrap();
	assert_eq!(game.cartellas.len(), 3);
	for cartella in &game.cartellas {
		assert_eq!(cartella.board.len(), 25);
		assert!(cartella.board.iter().all(|n| (1..=BINGO_MAX_NUMBER).contains(n)));
		assert!(cartella.drawn_numbers.is_empty());
	}
}
