use actix_web::{http::StatusCode, HttpResponse, ResponseError};

use crate::models::ApiResponse;

/// Domain error taxonomy. Every handler returns `Result<_, ApiError>` and
/// lets actix turn the error into the JSON envelope via `ResponseError`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
	#[error("{0}")]
	Validation(String),
	#[error("{0} not found")]
	NotFound(&'static str),
	#[error("All cartella numbers have already been drawn")]
	AlreadyExhausted,
	#[error("Insufficient balance")]
	InsufficientFunds,
	#[error("Invalid credentials")]
	InvalidCredentials,
	#[error("Invalid or expired code")]
	InvalidCode,
	#[error("Invalid or missing token")]
	Unauthorized,
	#[error("Not allowed")]
	Forbidden,
	#[error("Database error")]
	Db(#[from] diesel::result::Error),
	#[error("Database connection error")]
	Pool(#[from] diesel::r2d2::PoolError),
	#[error("Internal error")]
	Hash(#[from] bcrypt::BcryptError),
	#[error("Internal error")]
	Token(#[from] jsonwebtoken::errors::Error),
}

impl ResponseError for ApiError {
	fn status_code(&self) -> StatusCode {
		match self {
			ApiError::Validation(_) | ApiError::InsufficientFunds => StatusCode::BAD_REQUEST,
			ApiError::NotFound(_) => StatusCode::NOT_FOUND,
			ApiError::AlreadyExhausted => StatusCode::CONFLICT,
			ApiError::InvalidCredentials | ApiError::InvalidCode | ApiError::Unauthorized => {
				StatusCode::UNAUTHORIZED
			},
			ApiError::Forbidden => StatusCode::FORBIDDEN,
			ApiError::Db(_) | ApiError::Pool(_) | ApiError::Hash(_) | ApiError::Token(_) => {
				StatusCode::INTERNAL_SERVER_ERROR
			},
		}
	}

	fn error_response(&self) -> HttpResponse {
		let status = self.status_code();
		let detail = if status.is_server_error() {
			log::error!("Internal error: {:?}", self);
			"Internal server error".to_string()
		} else {
			self.to_string()
		};
		HttpResponse::build(status).json(ApiResponse::<()>::error(detail))
	}
}

impl ApiError {
	pub fn validation(detail: impl Into<String>) -> Self {
		ApiError::Validation(detail.into())
	}
}

impl From<validator::ValidationErrors> for ApiError {
	fn from(e: validator::ValidationErrors) -> Self {
		ApiError::Validation(e.to_string())
	}
}
