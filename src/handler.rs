use actix_web::{web, HttpRequest, HttpResponse};
use bcrypt::{hash, verify, DEFAULT_COST};
use bigdecimal::BigDecimal;
use diesel::prelude::*;
use validator::Validate;

use crate::{
	config::Config,
	constants::{
		HISTORY_LIMIT, MAX_CARTELLAS_PER_PLAYER, ONE_WEEK, PASSWORD_RESET_TTL, PENDING_2FA_TTL,
		SCOPE_PASSWORD_RESET, SCOPE_SESSION, SCOPE_TOTP,
	},
	db::DbPool,
	draw,
	errors::ApiError,
	ledger,
	midware::jwt::Jwt,
	models::{
		ApiResponse, AmountRequest, Cartella, CartellaDrawsPayload, ChangePasswordRequest,
		ClaimRequest, ClaimResponse, DrawResponse, ForgotPasswordRequest, Game, GameCloseRequest,
		GameCreateRequest, GameDrawsPayload, GamePayload, GameStatus, LoginRequest, LoginResponse,
		NewCartella, NewGame, NewShopUser, ProfileUpdateRequest, PublicCartellaPayload,
		RegisterRequest, ResetPasswordRequest, ShopStatus, ShopUser, ShopUserPayload,
		TotpCodeRequest, TotpSetupResponse, TransactionPayload, TxType,
	},
	repo,
	schema::{cartellas, games, shop_users},
	totp,
};

pub struct AuthHandler {}

impl AuthHandler {
	pub async fn register(
		pool: web::Data<DbPool>,
		req: web::Json<RegisterRequest>,
	) -> Result<HttpResponse, ApiError> {
		req.validate()?;
		let mut conn = pool.get()?;
		let username = req.username.trim().to_lowercase();

		if repo::find_by_username(&mut conn, &username)?.is_some() {
			return Err(ApiError::validation("Username already taken"));
		}

		let hashed = hash(req.password.as_bytes(), DEFAULT_COST)?;
		let new_user = NewShopUser {
			username: &username,
			name: req.name.as_deref().unwrap_or(&username),
			password: &hashed,
			// New shops stay pending until an administrator activates them.
			status: ShopStatus::Pending.as_str(),
			contact_phone: req.contact_phone.as_deref().unwrap_or(""),
			contact_email: req.contact_email.as_deref().unwrap_or(""),
			wallet_balance: BigDecimal::from(0),
			must_change_password: false,
		};
		let user = diesel::insert_into(shop_users::table)
			.values(&new_user)
			.get_result::<ShopUser>(&mut conn)?;

		log::info!("Registered shop {} ({})", user.username, user.id);
		Ok(HttpResponse::Created().json(ApiResponse::success(ShopUserPayload::from(&user))))
	}

	pub async fn login(
		pool: web::Data<DbPool>,
		config: web::Data<Config>,
		req: web::Json<LoginRequest>,
		http_req: HttpRequest,
	) -> Result<HttpResponse, ApiError> {
		let mut conn = pool.get()?;
		let (ip, user_agent) = repo::client_meta(&http_req);
		let username = req.username.trim().to_lowercase();

		let user = match repo::find_by_username(&mut conn, &username)? {
			Some(user) => user,
			None => {
				repo::record_login_attempt(
					&mut conn,
					&username,
					None,
					false,
					ip.as_deref(),
					&user_agent,
				)?;
				return Err(ApiError::InvalidCredentials);
			},
		};

		if !verify(req.password.as_bytes(), &user.password)? {
			repo::record_login_attempt(
				&mut conn,
				&username,
				None,
				false,
				ip.as_deref(),
				&user_agent,
			)?;
			return Err(ApiError::InvalidCredentials);
		}

		if user.status != ShopStatus::Active.as_str() {
			repo::record_login_attempt(
				&mut conn,
				&username,
				None,
				false,
				ip.as_deref(),
				&user_agent,
			)?;
			return Err(ApiError::validation("Shop is not active. Contact support."));
		}

		repo::record_login_attempt(
			&mut conn,
			&username,
			Some(user.id),
			true,
			ip.as_deref(),
			&user_agent,
		)?;

		let jwt = Jwt::new(&config.secret_key);
		let totp_required = user.totp_secret.is_some();
		let token = if totp_required {
			// Short-lived token that only unlocks the 2FA verify endpoint.
			jwt.create_jwt(user.id.to_string(), SCOPE_TOTP, PENDING_2FA_TTL)?
		} else {
			jwt.create_jwt(user.id.to_string(), SCOPE_SESSION, ONE_WEEK)?
		};

		log::info!("Login successful for shop {} (totp_required: {})", username, totp_required);
		Ok(HttpResponse::Ok().json(ApiResponse::success(LoginResponse {
			token,
			totp_required,
			requires_password_change: user.must_change_password,
			user: ShopUserPayload::from(&user),
		})))
	}

	pub async fn verify_2fa(
		pool: web::Data<DbPool>,
		config: web::Data<Config>,
		req: web::Json<TotpCodeRequest>,
		http_req: HttpRequest,
	) -> Result<HttpResponse, ApiError> {
		let user_id = repo::authenticate(&http_req, &config, SCOPE_TOTP)?;
		let mut conn = pool.get()?;
		let user = repo::find_by_id(&mut conn, user_id)?;
		let (ip, user_agent) = repo::client_meta(&http_req);

		let secret = user
			.totp_secret
			.as_deref()
			.ok_or_else(|| ApiError::validation("Two-factor authentication is not enabled"))?;

		if !totp::verify_now(secret, &req.code) {
			repo::record_login_attempt(
				&mut conn,
				&user.username,
				None,
				false,
				ip.as_deref(),
				&user_agent,
			)?;
			return Err(ApiError::InvalidCode);
		}

		let token = Jwt::new(&config.secret_key).create_jwt(
			user.id.to_string(),
			SCOPE_SESSION,
			ONE_WEEK,
		)?;
		log::info!("2FA verification passed for shop {}", user.username);
		Ok(HttpResponse::Ok().json(ApiResponse::success(LoginResponse {
			token,
			totp_required: false,
			requires_password_change: user.must_change_password,
			user: ShopUserPayload::from(&user),
		})))
	}

	pub async fn setup_2fa(
		pool: web::Data<DbPool>,
		config: web::Data<Config>,
		http_req: HttpRequest,
	) -> Result<HttpResponse, ApiError> {
		let user_id = repo::authenticate(&http_req, &config, SCOPE_SESSION)?;
		let mut conn = pool.get()?;
		let user = repo::find_by_id(&mut conn, user_id)?;

		let secret = totp::generate_secret();
		diesel::update(shop_users::table.filter(shop_users::id.eq(user.id)))
			.set(shop_users::totp_pending_secret.eq(Some(secret.as_str())))
			.execute(&mut conn)?;

		Ok(HttpResponse::Ok().json(ApiResponse::success(TotpSetupResponse {
			otpauth_url: totp::provisioning_uri(&secret, &user.username),
			secret,
		})))
	}

	pub async fn enable_2fa(
		pool: web::Data<DbPool>,
		config: web::Data<Config>,
		req: web::Json<TotpCodeRequest>,
		http_req: HttpRequest,
	) -> Result<HttpResponse, ApiError> {
		let user_id = repo::authenticate(&http_req, &config, SCOPE_SESSION)?;
		let mut conn = pool.get()?;
		let user = repo::find_by_id(&mut conn, user_id)?;

		let pending = user
			.totp_pending_secret
			.as_deref()
			.ok_or_else(|| ApiError::validation("Run 2FA setup first"))?;
		if !totp::verify_now(pending, &req.code) {
			return Err(ApiError::InvalidCode);
		}

		diesel::update(shop_users::table.filter(shop_users::id.eq(user.id)))
			.set((
				shop_users::totp_secret.eq(Some(pending)),
				shop_users::totp_pending_secret.eq(None::<String>),
			))
			.execute(&mut conn)?;

		log::info!("2FA enabled for shop {}", user.username);
		let user = repo::find_by_id(&mut conn, user_id)?;
		Ok(HttpResponse::Ok().json(ApiResponse::success(ShopUserPayload::from(&user))))
	}

	pub async fn disable_2fa(
		pool: web::Data<DbPool>,
		config: web::Data<Config>,
		req: web::Json<TotpCodeRequest>,
		http_req: HttpRequest,
	) -> Result<HttpResponse, ApiError> {
		let user_id = repo::authenticate(&http_req, &config, SCOPE_SESSION)?;
		let mut conn = pool.get()?;
		let user = repo::find_by_id(&mut conn, user_id)?;

		let secret = user
			.totp_secret
			.as_deref()
			.ok_or_else(|| ApiError::validation("Two-factor authentication is not enabled"))?;
		if !totp::verify_now(secret, &req.code) {
			return Err(ApiError::InvalidCode);
		}

		diesel::update(shop_users::table.filter(shop_users::id.eq(user.id)))
			.set((
				shop_users::totp_secret.eq(None::<String>),
				shop_users::totp_pending_secret.eq(None::<String>),
			))
			.execute(&mut conn)?;

		log::info!("2FA disabled for shop {}", user.username);
		let user = repo::find_by_id(&mut conn, user_id)?;
		Ok(HttpResponse::Ok().json(ApiResponse::success(ShopUserPayload::from(&user))))
	}

	pub async fn me(
		pool: web::Data<DbPool>,
		config: web::Data<Config>,
		http_req: HttpRequest,
	) -> Result<HttpResponse, ApiError> {
		let user_id = repo::authenticate(&http_req, &config, SCOPE_SESSION)?;
		let mut conn = pool.get()?;
		let user = repo::find_by_id(&mut conn, user_id)?;
		Ok(HttpResponse::Ok().json(ApiResponse::success(ShopUserPayload::from(&user))))
	}

	pub async fn change_password(
		pool: web::Data<DbPool>,
		config: web::Data<Config>,
		req: web::Json<ChangePasswordRequest>,
		http_req: HttpRequest,
	) -> Result<HttpResponse, ApiError> {
		req.validate()?;
		let user_id = repo::authenticate(&http_req, &config, SCOPE_SESSION)?;
		let mut conn = pool.get()?;
		let user = repo::find_by_id(&mut conn, user_id)?;

		if !verify(req.current_password.as_bytes(), &user.password)? {
			return Err(ApiError::validation("Current password is incorrect."));
		}

		let hashed = hash(req.new_password.as_bytes(), DEFAULT_COST)?;
		let user = diesel::update(shop_users::table.filter(shop_users::id.eq(user.id)))
			.set((shop_users::password.eq(&hashed), shop_users::must_change_password.eq(false)))
			.get_result::<ShopUser>(&mut conn)?;

		let token = Jwt::new(&config.secret_key).create_jwt(
			user.id.to_string(),
			SCOPE_SESSION,
			ONE_WEEK,
		)?;
		log::info!("Password changed for shop {}", user.username);
		Ok(HttpResponse::Ok().json(ApiResponse::success(LoginResponse {
			token,
			totp_required: false,
			requires_password_change: false,
			user: ShopUserPayload::from(&user),
		})))
	}

	pub async fn forgot_password(
		pool: web::Data<DbPool>,
		config: web::Data<Config>,
		req: web::Json<ForgotPasswordRequest>,
	) -> Result<HttpResponse, ApiError> {
		let mut conn = pool.get()?;
		let username = req.username.trim().to_lowercase();

		// Same response for known and unknown accounts.
		if let Some(user) = repo::find_by_username(&mut conn, &username)? {
			if user.contact_email.is_empty() {
				log::warn!("Password reset requested for {} with no contact email", username);
			} else {
				let token = Jwt::new(&config.secret_key).create_jwt(
					user.id.to_string(),
					SCOPE_PASSWORD_RESET,
					PASSWORD_RESET_TTL,
				)?;
				repo::send_password_reset_email(config.smtp.as_ref(), &user.contact_email, &token);
			}
		}

		Ok(HttpResponse::Ok().json(ApiResponse::success(
			"If the account exists, a reset email has been sent".to_string(),
		)))
	}

	pub async fn reset_password(
		pool: web::Data<DbPool>,
		config: web::Data<Config>,
		req: web::Json<ResetPasswordRequest>,
	) -> Result<HttpResponse, ApiError> {
		req.validate()?;
		let claims = repo::verify_scoped_token(&config.secret_key, &req.token, SCOPE_PASSWORD_RESET)
			.map_err(|_| ApiError::InvalidCode)?;
		let user_id = claims.sub.parse::<i32>().map_err(|_| ApiError::InvalidCode)?;

		let mut conn = pool.get()?;
		let hashed = hash(req.new_password.as_bytes(), DEFAULT_COST)?;
		let user = diesel::update(shop_users::table.filter(shop_users::id.eq(user_id)))
			.set((shop_users::password.eq(&hashed), shop_users::must_change_password.eq(false)))
			.get_result::<ShopUser>(&mut conn)
			.optional()?
			.ok_or(ApiError::NotFound("Shop"))?;

		log::info!("Password reset completed for shop {}", user.username);
		Ok(HttpResponse::Ok().json(ApiResponse::success("Password has been reset".to_string())))
	}

	pub async fn get_profile(
		pool: web::Data<DbPool>,
		config: web::Data<Config>,
		http_req: HttpRequest,
	) -> Result<HttpResponse, ApiError> {
		let user_id = repo::authenticate(&http_req, &config, SCOPE_SESSION)?;
		let mut conn = pool.get()?;
		let user = repo::find_by_id(&mut conn, user_id)?;
		Ok(HttpResponse::Ok().json(ApiResponse::success(ShopUserPayload::from(&user))))
	}

	pub async fn update_profile(
		pool: web::Data<DbPool>,
		config: web::Data<Config>,
		req: web::Json<ProfileUpdateRequest>,
		http_req: HttpRequest,
	) -> Result<HttpResponse, ApiError> {
		req.validate()?;
		let user_id = repo::authenticate(&http_req, &config, SCOPE_SESSION)?;
		let mut conn = pool.get()?;

		// diesel rejects an all-None changeset; an empty body is a no-op.
		if req.name.is_none()
			&& req.contact_phone.is_none()
			&& req.contact_email.is_none()
			&& req.bank_name.is_none()
			&& req.bank_account.is_none()
		{
			let user = repo::find_by_id(&mut conn, user_id)?;
			return Ok(HttpResponse::Ok().json(ApiResponse::success(ShopUserPayload::from(&user))));
		}

		let user = diesel::update(shop_users::table.filter(shop_users::id.eq(user_id)))
			.set((
				req.name.as_ref().map(|v| shop_users::name.eq(v)),
				req.contact_phone.as_ref().map(|v| shop_users::contact_phone.eq(v)),
				req.contact_email.as_ref().map(|v| shop_users::contact_email.eq(v)),
				req.bank_name.as_ref().map(|v| shop_users::bank_name.eq(v)),
				req.bank_account.as_ref().map(|v| shop_users::bank_account.eq(v)),
			))
			.get_result::<ShopUser>(&mut conn)
			.optional()?
			.ok_or(ApiError::NotFound("Shop"))?;

		log::info!("Profile updated for shop {}", user.username);
		Ok(HttpResponse::Ok().json(ApiResponse::success(ShopUserPayload::from(&user))))
	}
}

pub struct GameHandler {}

impl GameHandler {
	fn shop_game(conn: &mut PgConnection, code: &str, shop_id: i32) -> Result<Game, ApiError> {
		games::table
			.filter(games::game_code.eq(code))
			.filter(games::shop_id.eq(shop_id))
			.select(Game::as_select())
			.first::<Game>(conn)
			.optional()?
			.ok_or(ApiError::NotFound("Game"))
	}

	fn game_cartellas(conn: &mut PgConnection, game_id: i32) -> Result<Vec<Cartella>, ApiError> {
		let rows = cartellas::table
			.filter(cartellas::game_id.eq(game_id))
			.order(cartellas::cartella_number.asc())
			.select(Cartella::as_select())
			.load::<Cartella>(conn)?;
		Ok(rows)
	}

	pub async fn list_games(
		pool: web::Data<DbPool>,
		config: web::Data<Config>,
		http_req: HttpRequest,
	) -> Result<HttpResponse, ApiError> {
		let user_id = repo::authenticate(&http_req, &config, SCOPE_SESSION)?;
		let mut conn = pool.get()?;

		let rows = games::table
			.filter(games::shop_id.eq(user_id))
			.order(games::created_at.desc())
			.select(Game::as_select())
			.load::<Game>(&mut conn)?;

		let mut payloads = Vec::with_capacity(rows.len());
		for game in &rows {
			let cartellas = Self::game_cartellas(&mut conn, game.id)?;
			payloads.push(GamePayload::from_parts(game, &cartellas));
		}
		Ok(HttpResponse::Ok().json(ApiResponse::success(payloads)))
	}

	pub async fn create_game(
		pool: web::Data<DbPool>,
		config: web::Data<Config>,
		req: web::Json<GameCreateRequest>,
		http_req: HttpRequest,
	) -> Result<HttpResponse, ApiError> {
		req.validate()?;
		let user_id = repo::authenticate(&http_req, &config, SCOPE_SESSION)?;
		let mut conn = pool.get()?;
		let user = repo::find_by_id(&mut conn, user_id)?;

		if req.bet_amount <= BigDecimal::from(0) {
			return Err(ApiError::validation("Bet amount must be positive"));
		}
		if req.win_amount < BigDecimal::from(0) {
			return Err(ApiError::validation("Win amount cannot be negative"));
		}

		let boards: Vec<Vec<i32>> = match (&req.cartella_numbers, req.cartella_count) {
			(Some(boards), None) => {
				if boards.is_empty() {
					return Err(ApiError::validation("Provide at least one cartella"));
				}
				if boards.iter().any(|b| b.is_empty()) {
					return Err(ApiError::validation("Cartella numbers cannot be empty"));
				}
				for board in boards {
					for n in board {
						if *n < 1 || *n > crate::constants::BINGO_MAX_NUMBER {
							return Err(ApiError::validation(
								"Cartella numbers must be between 1 and 75",
							));
						}
					}
				}
				boards.clone()
			},
			(None, Some(count)) => (0..count).map(|_| draw::generate_board()).collect(),
			_ => {
				return Err(ApiError::validation(
					"Provide either cartella_numbers or cartella_count",
				))
			},
		};

		let max_cartellas = req.num_players as usize * MAX_CARTELLAS_PER_PLAYER;
		if boards.len() > max_cartellas {
			return Err(ApiError::validation("Total cartellas exceed allowed 4 per player"));
		}

		let game_code = draw::unique_game_code(&mut conn, &user.username)?;

		let payload = conn.transaction::<GamePayload, ApiError, _>(|conn| {
			let game = diesel::insert_into(games::table)
				.values(&NewGame {
					shop_id: user.id,
					game_code: &game_code,
					bet_amount: req.bet_amount.clone(),
					win_amount: req.win_amount.clone(),
					num_players: req.num_players,
					status: GameStatus::Created.as_str(),
					winners: serde_json::json!([]),
				})
				.get_result::<Game>(conn)?;

			let new_cartellas: Vec<NewCartella> = boards
				.iter()
				.enumerate()
				.map(|(index, board)| NewCartella {
					game_id: game.id,
					cartella_number: index as i32 + 1,
					board: serde_json::json!(board),
					drawn_numbers: serde_json::json!([]),
				})
				.collect();
			diesel::insert_into(cartellas::table).values(&new_cartellas).execute(conn)?;

			let cartellas = Self::game_cartellas(conn, game.id)?;
			Ok(GamePayload::from_parts(&game, &cartellas))
		})?;

		log::info!(
			"Created game {} for shop {} with {} cartellas",
			game_code,
			user.username,
			boards.len()
		);
		Ok(HttpResponse::Created().json(ApiResponse::success(payload)))
	}

	pub async fn game_detail(
		pool: web::Data<DbPool>,
		config: web::Data<Config>,
		path: web::Path<String>,
		http_req: HttpRequest,
	) -> Result<HttpResponse, ApiError> {
		let user_id = repo::authenticate(&http_req, &config, SCOPE_SESSION)?;
		let mut conn = pool.get()?;
		let game = Self::shop_game(&mut conn, &path.into_inner(), user_id)?;
		let cartellas = Self::game_cartellas(&mut conn, game.id)?;
		Ok(HttpResponse::Ok()
			.json(ApiResponse::success(GamePayload::from_parts(&game, &cartellas))))
	}

	/// created -> active. Debits the total bet from the shop wallet in the
	/// same database transaction that flips the status.
	pub async fn activate_game(
		pool: web::Data<DbPool>,
		config: web::Data<Config>,
		path: web::Path<String>,
		http_req: HttpRequest,
	) -> Result<HttpResponse, ApiError> {
		let user_id = repo::authenticate(&http_req, &config, SCOPE_SESSION)?;
		let mut conn = pool.get()?;
		let code = path.into_inner();

		let payload = conn.transaction::<GamePayload, ApiError, _>(|conn| {
			let game = games::table
				.filter(games::game_code.eq(&code))
				.filter(games::shop_id.eq(user_id))
				.select(Game::as_select())
				.for_update()
				.first::<Game>(conn)
				.optional()?
				.ok_or(ApiError::NotFound("Game"))?;

			let current = GameStatus::parse(&game.status)
				.ok_or_else(|| ApiError::validation("Unknown game status"))?;
			if !current.can_transition_to(GameStatus::Active) {
				return Err(ApiError::validation("Invalid status transition"));
			}

			let cartellas = Self::game_cartellas(conn, game.id)?;
			let total_bet = &game.bet_amount * BigDecimal::from(cartellas.len() as i64);
			ledger::apply_transaction(
				conn,
				user_id,
				TxType::BetDebit,
				&total_bet,
				&format!("game:{}:bet", game.game_code),
			)?;

			let game = diesel::update(games::table.filter(games::id.eq(game.id)))
				.set((
					games::status.eq(GameStatus::Active.as_str()),
					games::started_at.eq(Some(chrono::Utc::now())),
				))
				.get_result::<Game>(conn)?;

			Ok(GamePayload::from_parts(&game, &cartellas))
		})?;

		log::info!("Activated game {} for shop {}", code, user_id);
		Ok(HttpResponse::Ok().json(ApiResponse::success(payload)))
	}

	/// active -> closed, recording the winning cartella numbers.
	pub async fn close_game(
		pool: web::Data<DbPool>,
		config: web::Data<Config>,
		path: web::Path<String>,
		req: web::Json<GameCloseRequest>,
		http_req: HttpRequest,
	) -> Result<HttpResponse, ApiError> {
		let user_id = repo::authenticate(&http_req, &config, SCOPE_SESSION)?;
		let mut conn = pool.get()?;
		let code = path.into_inner();

		let payload = conn.transaction::<GamePayload, ApiError, _>(|conn| {
			let game = games::table
				.filter(games::game_code.eq(&code))
				.filter(games::shop_id.eq(user_id))
				.select(Game::as_select())
				.for_update()
				.first::<Game>(conn)
				.optional()?
				.ok_or(ApiError::NotFound("Game"))?;

			let current = GameStatus::parse(&game.status)
				.ok_or_else(|| ApiError::validation("Unknown game status"))?;
			if !current.can_transition_to(GameStatus::Closed) {
				return Err(ApiError::validation("Invalid status transition"));
			}

			let cartellas = Self::game_cartellas(conn, game.id)?;
			let known: Vec<i32> = cartellas.iter().map(|c| c.cartella_number).collect();
			if req.winners.iter().any(|w| !known.contains(w)) {
				return Err(ApiError::validation("Unknown winning cartella number"));
			}

			let game = diesel::update(games::table.filter(games::id.eq(game.id)))
				.set((
					games::status.eq(GameStatus::Closed.as_str()),
					games::winners.eq(serde_json::json!(req.winners)),
					games::ended_at.eq(Some(chrono::Utc::now())),
				))
				.get_result::<Game>(conn)?;

			Ok(GamePayload::from_parts(&game, &cartellas))
		})?;

		log::info!("Closed game {} for shop {}", code, user_id);
		Ok(HttpResponse::Ok().json(ApiResponse::success(payload)))
	}

	pub async fn claim(
		pool: web::Data<DbPool>,
		config: web::Data<Config>,
		path: web::Path<String>,
		req: web::Json<ClaimRequest>,
		http_req: HttpRequest,
	) -> Result<HttpResponse, ApiError> {
		let user_id = repo::authenticate(&http_req, &config, SCOPE_SESSION)?;
		let mut conn = pool.get()?;
		let game = Self::shop_game(&mut conn, &path.into_inner(), user_id)?;

		let cartella = cartellas::table
			.filter(cartellas::game_id.eq(game.id))
			.filter(cartellas::cartella_number.eq(req.cartella_number))
			.select(Cartella::as_select())
			.first::<Cartella>(&mut conn)
			.optional()?
			.ok_or(ApiError::NotFound("Cartella"))?;

		let outcome = draw::evaluate_claim(&cartella.board_numbers(), &cartella.drawn_sequence());
		Ok(HttpResponse::Ok().json(ApiResponse::success(ClaimResponse {
			game_code: game.game_code,
			cartella_number: cartella.cartella_number,
			is_bingo: outcome.is_bingo,
			matched_count: outcome.matched_count,
			required_count: outcome.required_count,
			missing_numbers: outcome.missing_numbers,
		})))
	}

	/// All draw sequences of one game, for the owning shop.
	pub async fn game_draws(
		pool: web::Data<DbPool>,
		config: web::Data<Config>,
		path: web::Path<String>,
		http_req: HttpRequest,
	) -> Result<HttpResponse, ApiError> {
		let user_id = repo::authenticate(&http_req, &config, SCOPE_SESSION)?;
		let mut conn = pool.get()?;
		let game = Self::shop_game(&mut conn, &path.into_inner(), user_id)?;
		let cartellas = Self::game_cartellas(&mut conn, game.id)?;
		Ok(HttpResponse::Ok().json(ApiResponse::success(GameDrawsPayload {
			game_code: game.game_code,
			cartella_draw_sequences: cartellas
				.iter()
				.map(|c| CartellaDrawsPayload {
					cartella_number: c.cartella_number,
					drawn_numbers: c.drawn_sequence(),
				})
				.collect(),
		})))
	}

	/// Public read-only view of one cartella, regardless of game status.
	pub async fn public_cartella(
		pool: web::Data<DbPool>,
		path: web::Path<(String, i32)>,
	) -> Result<HttpResponse, ApiError> {
		let (code, cartella_number) = path.into_inner();
		let mut conn = pool.get()?;

		let game = games::table
			.filter(games::game_code.eq(&code))
			.select(Game::as_select())
			.first::<Game>(&mut conn)
			.optional()?
			.ok_or(ApiError::NotFound("Game"))?;

		let cartella = cartellas::table
			.filter(cartellas::game_id.eq(game.id))
			.filter(cartellas::cartella_number.eq(cartella_number))
			.select(Cartella::as_select())
			.first::<Cartella>(&mut conn)
			.optional()?
			.ok_or(ApiError::NotFound("Cartella"))?;

		Ok(HttpResponse::Ok().json(ApiResponse::success(PublicCartellaPayload {
			game_code: game.game_code,
			cartella_number: cartella.cartella_number,
			board: cartella.board_numbers(),
			drawn_numbers: cartella.drawn_sequence(),
			status: game.status,
			created_at: game.created_at,
		})))
	}

	/// Public endpoint: no token required. Rate limiting is an open
	/// question and deliberately not implemented here.
	pub async fn public_draw(
		pool: web::Data<DbPool>,
		path: web::Path<(String, i32)>,
	) -> Result<HttpResponse, ApiError> {
		let (code, cartella_number) = path.into_inner();
		let mut conn = pool.get()?;
		let result = draw::draw_next(&mut conn, &code, cartella_number)?;
		Ok(HttpResponse::Ok().json(ApiResponse::success(DrawResponse {
			game_code: result.game_code,
			cartella_number: result.cartella_number,
			number: result.number,
			drawn_numbers: result.drawn_numbers,
		})))
	}
}

pub struct TransactionHandler {}

impl TransactionHandler {
	pub async fn deposit(
		pool: web::Data<DbPool>,
		config: web::Data<Config>,
		req: web::Json<AmountRequest>,
		http_req: HttpRequest,
	) -> Result<HttpResponse, ApiError> {
		let user_id = repo::authenticate(&http_req, &config, SCOPE_SESSION)?;
		let mut conn = pool.get()?;
		let tx = ledger::apply_transaction(
			&mut conn,
			user_id,
			TxType::Deposit,
			&req.amount,
			req.reference.as_deref().unwrap_or(""),
		)?;
		Ok(HttpResponse::Created().json(ApiResponse::success(TransactionPayload::from(&tx))))
	}

	pub async fn withdraw(
		pool: web::Data<DbPool>,
		config: web::Data<Config>,
		req: web::Json<AmountRequest>,
		http_req: HttpRequest,
	) -> Result<HttpResponse, ApiError> {
		let user_id = repo::authenticate(&http_req, &config, SCOPE_SESSION)?;
		let mut conn = pool.get()?;
		let tx = ledger::apply_transaction(
			&mut conn,
			user_id,
			TxType::Withdrawal,
			&req.amount,
			req.reference.as_deref().unwrap_or(""),
		)?;
		Ok(HttpResponse::Created().json(ApiResponse::success(TransactionPayload::from(&tx))))
	}

	pub async fn history(
		pool: web::Data<DbPool>,
		config: web::Data<Config>,
		http_req: HttpRequest,
	) -> Result<HttpResponse, ApiError> {
		let user_id = repo::authenticate(&http_req, &config, SCOPE_SESSION)?;
		let mut conn = pool.get()?;
		let txs = ledger::history(&mut conn, user_id, HISTORY_LIMIT)?;
		let payloads: Vec<TransactionPayload> =
			txs.iter().map(TransactionPayload::from).collect();
		Ok(HttpResponse::Ok().json(ApiResponse::success(payloads)))
	}
}
