//! Admin session guard.
//!
//! A successful login sets the `admin-auth` cookie to a signed, expiring
//! token. Handlers only ever see [`AdminSession::authorized`]; credential
//! material stays in this module.

use std::future::{ready, Ready};

use actix_web::cookie::{time::Duration, Cookie, SameSite};
use actix_web::{dev::Payload, web, FromRequest, HttpRequest};
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::AppError;

pub const SESSION_COOKIE: &str = "admin-auth";
const ADMIN_SUBJECT: &str = "admin";

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    iat: usize,
    exp: usize,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Holds the admin credentials and signing key. Registered once as app data.
pub struct SessionGuard {
    username: String,
    password: String,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl_hours: i64,
    cookie_secure: bool,
}

impl SessionGuard {
    pub fn new(config: &Config) -> Self {
        SessionGuard {
            username: config.admin_username.clone(),
            password: config.admin_password.clone(),
            encoding_key: EncodingKey::from_secret(config.session_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.session_secret.as_bytes()),
            ttl_hours: config.session_ttl_hours,
            cookie_secure: config.cookie_secure,
        }
    }

    /// Check credentials and hand back the session cookie to set.
    pub fn login(&self, request: &LoginRequest) -> Result<Cookie<'static>, AppError> {
        let (username, password) = match (
            request.username.as_deref().filter(|u| !u.is_empty()),
            request.password.as_deref().filter(|p| !p.is_empty()),
        ) {
            (Some(u), Some(p)) => (u, p),
            _ => return Err(AppError::bad_request("Username and password are required")),
        };

        // Evaluate both so timing does not reveal which one was wrong
        let user_ok = constant_time_eq(username.as_bytes(), self.username.as_bytes());
        let pass_ok = constant_time_eq(password.as_bytes(), self.password.as_bytes());
        if !(user_ok & pass_ok) {
            warn!("[AUTH] Rejected admin login for '{}'", username);
            return Err(AppError::Unauthorized);
        }

        let token = self.issue_token().map_err(|e| {
            log::error!("[AUTH] Failed to sign session token: {:?}", e);
            AppError::Internal
        })?;
        info!("[AUTH] Admin logged in");

        Ok(Cookie::build(SESSION_COOKIE, token)
            .path("/")
            .http_only(true)
            .secure(self.cookie_secure)
            .same_site(SameSite::Lax)
            .max_age(Duration::hours(self.ttl_hours))
            .finish())
    }

    /// A cookie that overwrites and expires the session cookie.
    pub fn logout_cookie(&self) -> Cookie<'static> {
        Cookie::build(SESSION_COOKIE, "")
            .path("/")
            .http_only(true)
            .secure(self.cookie_secure)
            .same_site(SameSite::Lax)
            .max_age(Duration::seconds(0))
            .finish()
    }

    pub fn issue_token(&self) -> Result<String, jsonwebtoken::errors::Error> {
        let now = Utc::now();
        let claims = Claims {
            sub: ADMIN_SUBJECT.to_string(),
            iat: now.timestamp() as usize,
            exp: (now + chrono::Duration::hours(self.ttl_hours)).timestamp() as usize,
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
    }

    pub fn verify(&self, token: &str) -> bool {
        match decode::<Claims>(token, &self.decoding_key, &Validation::new(Algorithm::HS256)) {
            Ok(data) => data.claims.sub == ADMIN_SUBJECT,
            Err(e) => {
                debug!("[AUTH] Session token rejected: {}", e);
                false
            }
        }
    }
}

/// Per-request authorization fact extracted from the session cookie.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdminSession {
    pub authorized: bool,
}

impl FromRequest for AdminSession {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let authorized = match (req.app_data::<web::Data<SessionGuard>>(), req.cookie(SESSION_COOKIE)) {
            (Some(guard), Some(cookie)) => guard.verify(cookie.value()),
            (None, _) => {
                log::error!("[AUTH] SessionGuard missing from app data");
                false
            }
            (_, None) => false,
        };
        if !authorized {
            debug!("[AUTH] No valid admin session for {}", req.path());
        }
        ready(Ok(AdminSession { authorized }))
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    let mut diff = a.len() ^ b.len();
    for (i, x) in a.iter().enumerate() {
        let y = b.get(i % b.len().max(1)).copied().unwrap_or(0);
        diff |= usize::from(x ^ y);
    }
    diff == 0
}
