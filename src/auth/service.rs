use serde::Serialize;

use super::password::{hash_password, verify_password};
use crate::db::Database;
use crate::error::ApiError;
use crate::model::{Credentials, Registration};
use crate::session::{Session, SessionIssuer};

const MIN_PASSWORD_LEN: usize = 8;
const INVALID_CREDENTIALS: &str = "Invalid email or password";

#[derive(Debug, Clone, Serialize)]
pub struct SignedIn {
    #[serde(flatten)]
    pub session: Session,
    pub token: String,
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

async fn run_blocking<T, F>(f: F) -> anyhow::Result<T>
where
    F: FnOnce() -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| anyhow::anyhow!("password task failed: {e}"))?
}

pub async fn register(db: &Database, issuer: &SessionIssuer, input: Registration) -> Result<SignedIn, ApiError> {
    let email = normalize_email(&input.email);
    if email.is_empty() || !email.contains('@') {
        return Err(ApiError::Validation("A valid email is required".to_string()));
    }
    if input.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::Validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    let name = non_blank(input.name);
    let image = non_blank(input.image);

    let password = input.password;
    let hash = run_blocking(move || hash_password(&password))
        .await
        .map_err(ApiError::internal("Failed to register"))?;

    let user = db
        .create_user(&email, name.as_deref(), image.as_deref(), &hash)
        .await
        .map_err(ApiError::internal("Failed to register"))?
        .ok_or_else(|| ApiError::Conflict("Email is already registered".to_string()))?;

    let (session, token) = issuer.issue(&user).map_err(ApiError::internal("Failed to register"))?;
    tracing::info!(user_id = %user.id, "registered user");
    Ok(SignedIn { session, token })
}

pub async fn sign_in(db: &Database, issuer: &SessionIssuer, input: Credentials) -> Result<SignedIn, ApiError> {
    let email = normalize_email(&input.email);
    let user = db
        .find_user_by_email(&email)
        .await
        .map_err(ApiError::internal("Failed to sign in"))?;

    let Some(user) = user else {
        tracing::info!("sign-in attempt for unknown email");
        return Err(ApiError::Unauthorized(INVALID_CREDENTIALS));
    };

    let hash = user.password_hash.clone();
    let password = input.password;
    let valid = run_blocking(move || Ok(verify_password(&hash, &password)))
        .await
        .map_err(ApiError::internal("Failed to sign in"))?;
    if !valid {
        tracing::info!(user_id = %user.id, "sign-in attempt with a wrong password");
        return Err(ApiError::Unauthorized(INVALID_CREDENTIALS));
    }

    let (session, token) = issuer.issue(&user).map_err(ApiError::internal("Failed to sign in"))?;
    tracing::info!(user_id = %user.id, "signed in");
    Ok(SignedIn { session, token })
}
