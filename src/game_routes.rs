use crate::handler::GameHandler;
use actix_web::web;

pub fn init(cfg: &mut web::ServiceConfig) {
	cfg.service(
		web::scope("/api/games")
			.route("/games", web::get().to(GameHandler::list_games))
			.route("/games", web::post().to(GameHandler::create_game))
			// Public endpoints, whitelisted in the JWT middleware.
			.route(
				"/games/{code}/cartellas/{cartella_number}/draw",
				web::get().to(GameHandler::public_draw),
			)
			.route(
				"/game/{code}/cartella/{cartella_number}",
				web::get().to(GameHandler::public_cartella),
			)
			.route("/games/{code}/draw", web::get().to(GameHandler::game_draws))
			.route("/games/{code}/activate", web::post().to(GameHandler::activate_game))
			.route("/games/{code}/close", web::post().to(GameHandler::close_game))
			.route("/games/{code}/claim", web::post().to(GameHandler::claim))
			.route("/games/{code}", web::get().to(GameHandler::game_detail)),
	);
}
