use actix_web::{http::header, HttpRequest};
use diesel::prelude::*;
use lettre::{
	message::header::ContentType, transport::smtp::authentication::Credentials, Message,
	SmtpTransport, Transport,
};

use crate::{
	config::{Config, SmtpConfig},
	constants::AUTHORIZATION,
	errors::ApiError,
	midware::jwt::{strip_token_prefix, Claims, Jwt},
	models::{NewLoginAttempt, ShopUser},
	schema::{login_attempts, shop_users},
};

pub fn find_by_username(
	conn: &mut PgConnection,
	username: &str,
) -> Result<Option<ShopUser>, ApiError> {
	let user = shop_users::table
		.filter(shop_users::username.eq(username))
		.select(ShopUser::as_select())
		.first::<ShopUser>(conn)
		.optional()?;
	Ok(user)
}

pub fn find_by_id(conn: &mut PgConnection, id: i32) -> Result<ShopUser, ApiError> {
	shop_users::table
		.filter(shop_users::id.eq(id))
		.select(ShopUser::as_select())
		.first::<ShopUser>(conn)
		.optional()?
		.ok_or(ApiError::NotFound("Shop"))
}

/// Appends one row to the login audit. Failures never get a user link so a
/// deactivated account cannot be probed through the audit trail.
pub fn record_login_attempt(
	conn: &mut PgConnection,
	username: &str,
	user_id: Option<i32>,
	success: bool,
	ip_address: Option<&str>,
	user_agent: &str,
) -> Result<(), ApiError> {
	let user_agent: String = user_agent.chars().take(512).collect();
	let attempt = NewLoginAttempt {
		username,
		user_id: if success { user_id } else { None },
		ip_address,
		user_agent: &user_agent,
		success,
	};
	diesel::insert_into(login_attempts::table).values(&attempt).execute(conn)?;
	Ok(())
}

/// Client metadata for the login audit: (ip, user agent).
pub fn client_meta(req: &HttpRequest) -> (Option<String>, String) {
	let ip = req.connection_info().realip_remote_addr().map(str::to_string);
	let user_agent = req
		.headers()
		.get(header::USER_AGENT)
		.and_then(|h| h.to_str().ok())
		.unwrap_or("")
		.to_string();
	(ip, user_agent)
}

/// Decodes the request token and checks its scope. Handlers use this to
/// resolve the acting shop; the middleware has already rejected requests
/// with no valid signature, but the scope check here is what keeps a
/// pending-2FA token out of regular endpoints.
pub fn authenticate(req: &HttpRequest, config: &Config, scope: &str) -> Result<i32, ApiError> {
	let token = req
		.headers()
		.get(AUTHORIZATION)
		.and_then(|h| h.to_str().ok())
		.and_then(strip_token_prefix)
		.ok_or(ApiError::Unauthorized)?;

	let claims = verify_scoped_token(&config.secret_key, token, scope)?;
	claims.sub.parse::<i32>().map_err(|_| ApiError::Unauthorized)
}

pub fn verify_scoped_token(secret: &str, token: &str, scope: &str) -> Result<Claims, ApiError> {
	let claims = Jwt::new(secret).verify_jwt(token).map_err(|e| {
		log::error!("Token validation error: {:?}", e);
		ApiError::Unauthorized
	})?;
	if claims.scope != scope {
		return Err(ApiError::Unauthorized);
	}
	Ok(claims)
}

/// Sends the password reset code. Mail problems are logged and swallowed:
/// a broken relay must not reveal whether the account exists.
pub fn send_password_reset_email(smtp: Option<&SmtpConfig>, to_email: &str, reset_token: &str) {
	let Some(smtp) = smtp else {
		log::warn!("SMTP is not configured; skipping password reset email");
		return;
	};

	let body = format!(
		"Hello,

A password reset was requested for your LULU Bingo shop account.

Use the following reset token within the next 30 minutes:

{}

If you did not request this, please ignore this message or contact support.

This mailbox is not monitored. Please do not reply to this email.",
		reset_token,
	);

	let email = Message::builder()
		.from(match smtp.from_address.parse() {
			Ok(addr) => addr,
			Err(e) => {
				log::error!("Invalid EMAIL_FROM address: {:?}", e);
				return;
			},
		})
		.to(match to_email.parse() {
			Ok(addr) => addr,
			Err(e) => {
				log::error!("Invalid recipient address: {:?}", e);
				return;
			},
		})
		.subject("LULU Bingo password reset")
		.header(ContentType::TEXT_PLAIN)
		.body(body);

	let email = match email {
		Ok(email) => email,
		Err(e) => {
			log::error!("Could not build reset email: {:?}", e);
			return;
		},
	};

	let creds = Credentials::new(smtp.username.clone(), smtp.password.clone());
	let mailer = match SmtpTransport::relay(&smtp.host) {
		Ok(builder) => builder.credentials(creds).build(),
		Err(e) => {
			log::error!("Could not reach SMTP relay: {:?}", e);
			return;
		},
	};

	match mailer.send(&email) {
		Ok(_) => log::info!("Password reset email sent to {}", to_email),
		Err(e) => log::error!("Could not send reset email: {:?}", e),
	}
}
