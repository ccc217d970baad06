use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::Path;

use anyhow::{Context, Result};
use rand::RngCore;

const SECRET_BYTES: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupOutcome {
    Created,
    AlreadyExists,
}

/// 32 random bytes, hex encoded.
pub fn generate_secret() -> String {
    let mut bytes = [0u8; SECRET_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

pub fn env_template(secret: &str) -> String {
    format!(
        r#"# Database
DATABASE_URL="bookcatalog.db"
# DATABASE_SYNC_URL="libsql://your-database.turso.io"
# DATABASE_AUTH_TOKEN="your-auth-token"

# Sessions
SESSION_SECRET="{secret}"
BASE_URL="http://localhost:3000"

# Google OAuth (Optional)
GOOGLE_CLIENT_ID="your-google-client-id"
GOOGLE_CLIENT_SECRET="your-google-client-secret"
"#
    )
}

/// Writes a fresh env file at `path`. An existing file is never touched.
pub fn ensure_env_file(path: &Path) -> Result<SetupOutcome> {
    let mut file = match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::AlreadyExists => return Ok(SetupOutcome::AlreadyExists),
        Err(e) => return Err(e).with_context(|| format!("failed to create {}", path.display())),
    };

    file.write_all(env_template(&generate_secret()).as_bytes())
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(SetupOutcome::Created)
}

pub fn run(path: &Path) -> Result<()> {
    match ensure_env_file(path)? {
        SetupOutcome::Created => {
            tracing::info!(path = %path.display(), "created env file with a fresh session secret");
            println!("Created {} with default values.", path.display());
            println!("Set DATABASE_URL (and the sync settings if you use a replica) before starting.");
        }
        SetupOutcome::AlreadyExists => {
            println!("{} already exists, skipping creation.", path.display());
        }
    }

    println!();
    println!("Next steps:");
    println!("1. Review the values in {}", path.display());
    println!("2. Run: bookcatalog serve");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secret_line(contents: &str) -> &str {
        contents
            .lines()
            .find(|l| l.starts_with("SESSION_SECRET="))
            .unwrap()
    }

    #[test]
    fn secrets_are_64_hex_chars_and_fresh() {
        let a = generate_secret();
        let b = generate_secret();
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }

    #[test]
    fn creates_once_and_leaves_existing_file_alone() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env.local");

        assert_eq!(ensure_env_file(&path).unwrap(), SetupOutcome::Created);
        let first = std::fs::read_to_string(&path).unwrap();
        let secret = secret_line(&first).trim_start_matches("SESSION_SECRET=").trim_matches('"');
        assert_eq!(secret.len(), 64);
        assert!(first.contains(r#"GOOGLE_CLIENT_ID="your-google-client-id""#));

        assert_eq!(ensure_env_file(&path).unwrap(), SetupOutcome::AlreadyExists);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), first);
    }

    #[test]
    fn existing_user_file_is_not_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env.local");
        std::fs::write(&path, "SESSION_SECRET=mine\n").unwrap();

        assert_eq!(ensure_env_file(&path).unwrap(), SetupOutcome::AlreadyExists);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "SESSION_SECRET=mine\n");
    }
}
