use crate::handler::TransactionHandler;
use actix_web::web;

pub fn init(cfg: &mut web::ServiceConfig) {
	cfg.service(
		web::scope("/api/transactions")
			.route("/deposit", web::post().to(TransactionHandler::deposit))
			.route("/withdraw", web::post().to(TransactionHandler::withdraw))
			.route("/history", web::get().to(TransactionHandler::history)),
	);
}
