use crate::constants::{AUTHORIZATION, EMPTY, IGNORE_ROUTES, MESSAGE_INVALID_TOKEN};
use actix_service::forward_ready;
use actix_web::{
	body::EitherBody,
	dev::{Service, ServiceRequest, ServiceResponse, Transform},
	http::Method,
	Error as AxError, HttpMessage, HttpResponse,
};
use chrono::Utc;
use futures::future::{ok, LocalBoxFuture, Ready};
use jsonwebtoken::{decode, encode, errors::Error, DecodingKey, EncodingKey, Header, Validation};
use log::error;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
	pub iat: usize,
	pub exp: usize,
	pub sub: String,
	pub scope: String,
}

#[derive(Serialize, Deserialize)]
pub struct ResponseBody {
	message: String,
	data: String,
}

impl ResponseBody {
	fn new(m: &str, d: &str) -> Self {
		Self { message: String::from(m), data: String::from(d) }
	}
}

pub struct Jwt {
	secret: String,
}

impl Jwt {
	pub fn new(s: &str) -> Self {
		Self { secret: s.to_string() }
	}

	pub fn create_jwt(&self, user_id: String, scope: &str, ttl: usize) -> Result<String, Error> {
		let now = Utc::now().timestamp() as usize;
		let claims = Claims { iat: now, exp: now + ttl, sub: user_id, scope: scope.to_string() };
		encode(&Header::default(), &claims, &EncodingKey::from_secret(self.secret.as_ref()))
	}

	pub fn verify_jwt(&self, token: &str) -> Result<Claims, Error> {
		decode::<Claims>(
			token,
			&DecodingKey::from_secret(self.secret.as_ref()),
			&Validation::default(),
		)
		.map(|data| data.claims)
	}
}

/// The API uses `Authorization: Token <jwt>`; `Bearer` is accepted too.
pub fn strip_token_prefix(header_value: &str) -> Option<&str> {
	let lower = header_value.to_ascii_lowercase();
	for prefix in ["token ", "bearer "] {
		if lower.starts_with(prefix) {
			return Some(header_value[prefix.len()..].trim());
		}
	}
	None
}

/// Routes served without any token: the ignore list, the public cartella
/// draw endpoint (`/api/games/games/{code}/cartellas/{n}/draw`) and the
/// public cartella view (`/api/games/game/{code}/cartella/{n}`).
pub fn is_public_route(path: &str) -> bool {
	if IGNORE_ROUTES.iter().any(|route| path.starts_with(route)) {
		return true;
	}
	if path.starts_with("/api/games/games/") && path.contains("/cartellas/") && path.ends_with("/draw")
	{
		return true;
	}
	path.starts_with("/api/games/game/") && path.contains("/cartella/")
}

pub struct Authentication {
	secret: String,
}

impl Authentication {
	pub fn new(secret: &str) -> Self {
		Self { secret: secret.to_string() }
	}
}

impl<S, B> Transform<S, ServiceRequest> for Authentication
where
	S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = AxError>,
	S::Future: 'static,
	B: 'static,
{
	type Response = ServiceResponse<EitherBody<B>>;
	type Error = AxError;
	type InitError = ();
	type Transform = AuthenticationMiddleware<S>;
	type Future = Ready<Result<Self::Transform, Self::InitError>>;

	fn new_transform(&self, service: S) -> Self::Future {
		ok(AuthenticationMiddleware { jwt: Jwt::new(&self.secret), service })
	}
}

pub struct AuthenticationMiddleware<S> {
	jwt: Jwt,
	service: S,
}

impl<S, B> Service<ServiceRequest> for AuthenticationMiddleware<S>
where
	S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = AxError>,
	S::Future: 'static,
	B: 'static,
{
	type Response = ServiceResponse<EitherBody<B>>;
	type Error = AxError;
	type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

	forward_ready!(service);

	fn call(&self, req: ServiceRequest) -> Self::Future {
		let mut authenticate_pass =
			Method::OPTIONS == *req.method() || is_public_route(req.path());

		if !authenticate_pass {
			if let Some(authen_header) = req.headers().get(AUTHORIZATION) {
				if let Ok(authen_str) = authen_header.to_str() {
					if let Some(token) = strip_token_prefix(authen_str) {
						match self.jwt.verify_jwt(token) {
							Ok(claims) => {
								req.extensions_mut().insert(claims);
								authenticate_pass = true;
							},
							Err(e) => error!("Invalid token: {:?}", e),
						}
					}
				}
			}
		}

		if !authenticate_pass {
			let (request, _pl) = req.into_parts();
			let response = HttpResponse::Unauthorized()
				.json(ResponseBody::new(MESSAGE_INVALID_TOKEN, EMPTY))
				.map_into_right_body();

			return Box::pin(async { Ok(ServiceResponse::new(request, response)) });
		}

		let res = self.service.call(req);

		Box::pin(async move { res.await.map(ServiceResponse::map_into_left_body) })
	}
}
