use std::env;

/// Runtime configuration, read once at startup and passed around as app
/// data instead of being re-read from the environment in handlers.
#[derive(Clone, Debug)]
pub struct Config {
	pub secret_key: String,
	pub database_url: String,
	pub bind_addr: String,
	pub debug: bool,
	pub allowed_hosts: Vec<String>,
	pub smtp: Option<SmtpConfig>,
}

#[derive(Clone, Debug)]
pub struct SmtpConfig {
	pub host: String,
	pub username: String,
	pub password: String,
	pub from_address: String,
}

impl Config {
	pub fn from_env() -> Self {
		let secret_key = env::var("SECRET_KEY").expect("SECRET_KEY can not be found in .env file");
		let database_url =
			env::var("DATABASE_URL").expect("DATABASE_URL can not be found in .env file");
		let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:8000".to_string());
		let debug = env::var("DEBUG")
			.map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
			.unwrap_or(false);
		let allowed_hosts = env::var("ALLOWED_HOSTS")
			.map(|v| {
				v.split(',')
					.map(|h| h.trim().to_string())
					.filter(|h| !h.is_empty())
					.collect()
			})
			.unwrap_or_default();

		let smtp = match (
			env::var("SMTP_HOST"),
			env::var("SMTP_USERNAME"),
			env::var("SMTP_PASSWORD"),
		) {
			(Ok(host), Ok(username), Ok(password)) => Some(SmtpConfig {
				from_address: env::var("EMAIL_FROM").unwrap_or_else(|_| username.clone()),
				host,
				username,
				password,
			}),
			_ => None,
		};

		Self { secret_key, database_url, bind_addr, debug, allowed_hosts, smtp }
	}
}
