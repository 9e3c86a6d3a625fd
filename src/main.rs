mod auth_routes;
mod config;
mod constants;
mod db;
mod draw;
mod errors;
mod game_routes;
mod handler;
mod ledger;
mod midware;
mod models;
mod repo;
mod schema;
#[cfg(test)]
mod tests;
mod totp;
mod transaction_routes;

use actix_cors::Cors;
use actix_web::{
	http::header,
	web::{self},
	App, HttpServer,
};

use config::Config;
use dotenv::dotenv;
use env_logger::Env;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
	dotenv().ok();
	env_logger::init_from_env(Env::default().default_filter_or("info"));
	let config = Config::from_env();
	let pool = db::get_db_pool(&config.database_url);
	if let Err(e) = db::init(&pool).await {
		panic!("Unable to initialize the db. Err: {:?}", e);
	}
	log::info!("Listening on: {}..", config.bind_addr);
	let bind_addr = config.bind_addr.clone();

	HttpServer::new(move || {
		// Credentials cannot be combined with a wildcard origin, so the
		// permissive mode (DEBUG or no ALLOWED_HOSTS) goes without them.
		let cors = if config.debug || config.allowed_hosts.is_empty() {
			Cors::default().allow_any_origin().allow_any_method().allow_any_header()
		} else {
			config
				.allowed_hosts
				.iter()
				.fold(Cors::default(), |cors, host| cors.allowed_origin(host))
				.allow_any_method()
				.allow_any_header()
				.supports_credentials()
		}
		.expose_headers(vec![header::CONTENT_DISPOSITION])
		.max_age(3600);

		App::new()
			.app_data(web::Data::new(pool.clone()))
			.app_data(web::Data::new(config.clone()))
			.wrap(cors)
			.wrap(actix_web::middleware::Logger::default())
			.wrap(midware::jwt::Authentication::new(&config.secret_key))
			.configure(auth_routes::init)
			.configure(game_routes::init)
			.configure(transaction_routes::init)
	})
	.bind(&bind_addr)?
	.run()
	.await
}
