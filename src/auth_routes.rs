use crate::handler::AuthHandler;
use actix_web::web;

pub fn init(cfg: &mut web::ServiceConfig) {
	cfg.service(
		web::scope("/api/auth")
			.route("/register", web::post().to(AuthHandler::register))
			.route("/login", web::post().to(AuthHandler::login))
			.route("/me", web::get().to(AuthHandler::me))
			.route("/password/change", web::post().to(AuthHandler::change_password))
			.route("/password/forgot", web::post().to(AuthHandler::forgot_password))
			.route("/password/reset", web::post().to(AuthHandler::reset_password))
			.route("/2fa/setup", web::post().to(AuthHandler::setup_2fa))
			.route("/2fa/enable", web::post().to(AuthHandler::enable_2fa))
			.route("/2fa/disable", web::post().to(AuthHandler::disable_2fa))
			.route("/2fa/verify", web::post().to(AuthHandler::verify_2fa)),
	)
	.route("/api/shop/profile", web::get().to(AuthHandler::get_profile))
	.route("/api/shop/profile", web::put().to(AuthHandler::update_profile));
}
