use hmac::{Hmac, Mac};
use rand::RngCore;
use sha1::Sha1;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::constants::{TOTP_DIGITS, TOTP_ISSUER, TOTP_STEP_SECONDS};

type HmacSha1 = Hmac<Sha1>;

/// RFC 6238 TOTP over HMAC-SHA1, the variant standard authenticator apps
/// implement. Secrets are stored base32-encoded (RFC 4648, no padding).
pub fn generate_secret() -> String {
	let mut bytes = [0u8; 20];
	rand::thread_rng().fill_bytes(&mut bytes);
	base32::encode(base32::Alphabet::Rfc4648 { padding: false }, &bytes)
}

pub fn provisioning_uri(secret: &str, username: &str) -> String {
	format!(
		"otpauth://totp/{}:{}?secret={}&issuer={}&digits={}&period={}",
		TOTP_ISSUER, username, secret, TOTP_ISSUER, TOTP_DIGITS, TOTP_STEP_SECONDS
	)
}

fn hotp(key: &[u8], counter: u64) -> u32 {
	// HMAC accepts keys of any length, so this cannot fail.
	let mut mac = HmacSha1::new_from_slice(key).expect("hmac key of any length");
	mac.update(&counter.to_be_bytes());
	let digest = mac.finalize().into_bytes();
	let offset = (digest[digest.len() - 1] & 0x0f) as usize;
	let bin = ((u32::from(digest[offset]) & 0x7f) << 24)
		| (u32::from(digest[offset + 1]) << 16)
		| (u32::from(digest[offset + 2]) << 8)
		| u32::from(digest[offset + 3]);
	bin % 10u32.pow(TOTP_DIGITS)
}

pub fn code_at(secret: &str, unix_time: u64) -> Option<String> {
	let key = base32::decode(base32::Alphabet::Rfc4648 { padding: false }, secret)?;
	let counter = unix_time / TOTP_STEP_SECONDS;
	Some(format!("{:0width$}", hotp(&key, counter), width = TOTP_DIGITS as usize))
}

/// Accepts the current step and one step of clock skew in either direction.
pub fn verify_at(secret: &str, code: &str, unix_time: u64) -> bool {
	let code = code.trim();
	if code.len() != TOTP_DIGITS as usize || !code.bytes().all(|b| b.is_ascii_digit()) {
		return false;
	}
	for skew in [-1i64, 0, 1] {
		let t = unix_time as i64 + skew * TOTP_STEP_SECONDS as i64;
		if t < 0 {
			continue;
		}
		if let Some(expected) = code_at(secret, t as u64) {
			if expected == code {
				return true;
			}
		}
	}
	false
}

pub fn verify_now(secret: &str, code: &str) -> bool {
	let now = SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.map(|d| d.as_secs())
		.unwrap_or(0);
	verify_at(secret, code, now)
}
