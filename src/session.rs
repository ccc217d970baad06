//! Signed session tokens.
//!
//! A token is `base64url(json claims) "." base64url(hmac-sha256(claims))`. It
//! is handed to browsers as an HttpOnly cookie and to scripted clients in the
//! sign-in response, which send it back as `Authorization: Bearer <token>`.
//! Handlers never look at headers themselves: they take a [`CurrentSession`]
//! and pass the `Option<Session>` inside it down to the service layer.

use std::convert::Infallible;

use anyhow::{Result, bail};
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{HeaderMap, header, request::Parts},
};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::handler::AppState;
use crate::model::User;

type HmacSha256 = Hmac<Sha256>;

pub const SESSION_COOKIE: &str = "bookcatalog.session-token";
const SESSION_TTL_DAYS: i64 = 30;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub image: Option<String>,
}

impl SessionUser {
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|n| !n.is_empty())
            .or(self.email.as_deref())
            .unwrap_or("Account")
    }
}

impl From<&User> for SessionUser {
    fn from(user: &User) -> Self {
        SessionUser {
            id: user.id.clone(),
            name: user.name.clone(),
            email: Some(user.email.clone()),
            image: user.image.clone(),
        }
    }
}

/// Who is calling. Built from a verified token; never from client-supplied ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub user: SessionUser,
    pub expires: DateTime<Utc>,
}

impl Session {
    pub fn user_id(&self) -> &str {
        &self.user.id
    }
}

pub struct SessionIssuer {
    key: Vec<u8>,
    secure_cookie: bool,
    ttl: Duration,
}

impl SessionIssuer {
    pub fn new(secret: &str, secure_cookie: bool) -> Result<Self> {
        if secret.trim().is_empty() {
            bail!("session secret must not be empty");
        }
        Ok(SessionIssuer {
            key: secret.as_bytes().to_vec(),
            secure_cookie,
            ttl: Duration::days(SESSION_TTL_DAYS),
        })
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    fn mac(&self) -> Result<HmacSha256> {
        HmacSha256::new_from_slice(&self.key).map_err(|e| anyhow::anyhow!("invalid session key: {e}"))
    }

    pub fn issue(&self, user: &User) -> Result<(Session, String)> {
        let session = Session {
            user: SessionUser::from(user),
            expires: Utc::now() + self.ttl,
        };

        let claims = serde_json::to_vec(&session)?;
        let mut mac = self.mac()?;
        mac.update(&claims);
        let signature = mac.finalize().into_bytes();

        let token = format!("{}.{}", URL_SAFE_NO_PAD.encode(&claims), URL_SAFE_NO_PAD.encode(signature));
        Ok((session, token))
    }

    /// Returns the session if the token is well formed, correctly signed and not expired.
    pub fn verify(&self, token: &str) -> Option<Session> {
        let (claims_b64, signature_b64) = token.split_once('.')?;
        let claims = URL_SAFE_NO_PAD.decode(claims_b64).ok()?;
        let signature = URL_SAFE_NO_PAD.decode(signature_b64).ok()?;

        let mut mac = self.mac().ok()?;
        mac.update(&claims);
        if mac.verify_slice(&signature).is_err() {
            tracing::debug!("rejected session token with a bad signature");
            return None;
        }

        let session: Session = serde_json::from_slice(&claims).ok()?;
        if session.expires <= Utc::now() {
            tracing::debug!(user_id = %session.user.id, "rejected expired session token");
            return None;
        }
        Some(session)
    }

    pub fn cookie(&self, token: &str) -> String {
        let max_age = self.ttl.num_seconds().max(0);
        let mut cookie = format!("{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age}");
        if self.secure_cookie {
            cookie.push_str("; Secure");
        }
        cookie
    }

    pub fn clear_cookie(&self) -> String {
        let mut cookie = format!("{SESSION_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0");
        if self.secure_cookie {
            cookie.push_str("; Secure");
        }
        cookie
    }

    pub fn from_headers(&self, headers: &HeaderMap) -> Option<Session> {
        token_from_headers(headers).and_then(|token| self.verify(&token))
    }
}

/// Bearer token first, then the session cookie.
pub fn token_from_headers(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());
    if bearer.is_some() {
        return bearer;
    }

    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.to_string())
        .filter(|v| !v.is_empty())
}

/// Extractor for the caller's identity. A missing or invalid token is `None`, not a rejection.
#[derive(Debug, Clone)]
pub struct CurrentSession(pub Option<Session>);

#[async_trait]
impl FromRequestParts<AppState> for CurrentSession {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        Ok(CurrentSession(state.sessions.from_headers(&parts.headers)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn user() -> User {
        User {
            id: "user-1".into(),
            name: Some("Ada".into()),
            email: "ada@example.com".into(),
            image: None,
            password_hash: String::new(),
            created_at: "2026-01-01T00:00:00.000000Z".into(),
        }
    }

    #[test]
    fn issued_tokens_verify() {
        let issuer = SessionIssuer::new("secret", false).unwrap();
        let (session, token) = issuer.issue(&user()).unwrap();
        assert_eq!(issuer.verify(&token), Some(session));
    }

    #[test]
    fn tokens_from_another_secret_are_rejected() {
        let ours = SessionIssuer::new("secret", false).unwrap();
        let theirs = SessionIssuer::new("other-secret", false).unwrap();
        let (_, token) = theirs.issue(&user()).unwrap();
        assert_eq!(ours.verify(&token), None);
    }

    #[test]
    fn tampered_claims_are_rejected() {
        let issuer = SessionIssuer::new("secret", false).unwrap();
        let (_, token) = issuer.issue(&user()).unwrap();
        let (_, signature) = token.split_once('.').unwrap();

        let mut forged = issuer.issue(&user()).unwrap().0;
        forged.user.id = "user-2".into();
        let forged_claims = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&forged).unwrap());

        assert_eq!(issuer.verify(&format!("{forged_claims}.{signature}")), None);
        assert_eq!(issuer.verify("garbage"), None);
        assert_eq!(issuer.verify(""), None);
    }

    #[test]
    fn expired_tokens_are_rejected() {
        let issuer = SessionIssuer::new("secret", false)
            .unwrap()
            .with_ttl(Duration::seconds(-1));
        let (_, token) = issuer.issue(&user()).unwrap();
        assert_eq!(issuer.verify(&token), None);
    }

    #[test]
    fn empty_secret_is_refused() {
        assert!(SessionIssuer::new("  ", false).is_err());
    }

    #[test]
    fn token_is_read_from_cookie_or_bearer() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_str(&format!("theme=dark; {SESSION_COOKIE}=abc.def")).unwrap(),
        );
        assert_eq!(token_from_headers(&headers).as_deref(), Some("abc.def"));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer xyz.uvw"));
        assert_eq!(token_from_headers(&headers).as_deref(), Some("xyz.uvw"));

        assert_eq!(token_from_headers(&HeaderMap::new()), None);
    }

    #[test]
    fn secure_flag_follows_base_url() {
        let plain = SessionIssuer::new("secret", false).unwrap();
        let secure = SessionIssuer::new("secret", true).unwrap();
        assert!(!plain.cookie("t").contains("Secure"));
        assert!(secure.cookie("t").ends_with("; Secure"));
        assert!(plain.clear_cookie().contains("Max-Age=0"));
    }
}
