//! Session cookies carry the session token along with an HMAC of it,
//! so only tokens this process signed are ever looked up.

use std::sync::Arc;

use axum::http::{header, HeaderMap};
use hmac::{Hmac, Mac};
use sha2::Sha256;

/// The name of the cookie holding the session token
pub const SESSION_COOKIE: &str = "campusguessr_session";

type HmacSha256 = Hmac<Sha256>;

#[derive(Clone)]
pub struct CookieSigner {
    secret: Arc<[u8]>,
}

impl CookieSigner {
    pub fn new(secret: &str) -> Self {
        Self {
            secret: secret.as_bytes().into(),
        }
    }

    fn mac(&self, token: &str) -> HmacSha256 {
        let mut mac =
            HmacSha256::new_from_slice(&self.secret).expect("HMAC takes keys of any length");
        mac.update(token.as_bytes());
        mac
    }

    /// Returns `<token>.<signature>`
    pub fn sign(&self, token: &str) -> String {
        let signature = self.mac(token).finalize().into_bytes();
        format!("{}.{}", token, hex::encode(signature))
    }

    /// Returns the token if the signature matches
    pub fn verify<'a>(&self, value: &'a str) -> Option<&'a str> {
        let (token, signature) = value.rsplit_once('.')?;
        let signature = hex::decode(signature).ok()?;

        self.mac(token).verify_slice(&signature).ok()?;
        Some(token)
    }

    /// Finds the session cookie in the request headers and verifies it
    pub fn session_token<'a>(&self, headers: &'a HeaderMap) -> Option<&'a str> {
        find_cookie(headers, SESSION_COOKIE).and_then(|value| self.verify(value))
    }

    /// The `Set-Cookie` value starting a session
    pub fn session_cookie(&self, token: &str) -> String {
        format!(
            "{}={}; HttpOnly; SameSite=Lax; Path=/",
            SESSION_COOKIE,
            self.sign(token)
        )
    }
}

/// The `Set-Cookie` value ending a session
pub fn removal_cookie() -> String {
    format!(
        "{}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0",
        SESSION_COOKIE
    )
}

fn find_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
}
