use crate::config::Config;
use crate::model::*;
use anyhow::{Context, Result};
use chrono::{SecondsFormat, Utc};
use libsql::{Builder, Connection, Database as LibsqlDatabase, Row};
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;
use uuid::Uuid;

pub const IN_MEMORY: &str = ":memory:";

const MIGRATIONS_TABLE: &str = include_str!("migrations/system/000_migrations_table.sql");

const MIGRATIONS: &[(&str, &str)] = &[("001_schema.sql", include_str!("migrations/001_schema.sql"))];

const SELECT_BOOKS: &str = r#"
SELECT
    books.id,
    books.title,
    books.author,
    books.genre,
    books.created_at,
    books.user_id,
    users.name,
    users.email
FROM books
LEFT JOIN users ON users.id = books.user_id
"#;

const SELECT_USERS: &str = "SELECT id, name, email, image, password_hash, created_at FROM users";

pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub struct Database {
    db: LibsqlDatabase,
    conn: Connection,
    replica: bool,
}

impl Database {
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn is_replica(sync_url: &Option<String>, auth_token: &Option<String>) -> bool {
        sync_url.is_some() && auth_token.is_some()
    }

    pub async fn sync(&self) -> Result<()> {
        if self.replica {
            self.db
                .sync()
                .await
                .map_err(|e| anyhow::anyhow!("sync failed: {}", e))?;
        }
        Ok(())
    }

    async fn applied_migrations(conn: &Connection) -> Result<HashSet<String>> {
        let mut rows = conn.query("SELECT name FROM _migrations", ()).await?;
        let mut applied = HashSet::new();
        while let Some(row) = rows.next().await? {
            applied.insert(row.get::<String>(0)?);
        }
        Ok(applied)
    }

    /// Applies every embedded migration not yet recorded, each in its own
    /// transaction together with its bookkeeping row. Returns what ran.
    async fn migrate(conn: &Connection) -> Result<Vec<&'static str>> {
        conn.execute_batch(MIGRATIONS_TABLE)
            .await
            .context("failed to create the migrations table")?;

        let applied = Self::applied_migrations(conn).await?;
        let mut ran = vec![];
        for &(name, sql) in MIGRATIONS {
            if applied.contains(name) {
                continue;
            }

            tracing::info!(migration = name, "[db] applying migration");
            let tx = conn.transaction().await?;
            tx.execute_batch(sql)
                .await
                .with_context(|| format!("failed to execute migration {name}"))?;
            tx.execute(
                "INSERT INTO _migrations (name, applied_at) VALUES (?, ?)",
                libsql::params![name, now_timestamp()],
            )
            .await?;
            tx.commit().await?;
            ran.push(name);
        }
        Ok(ran)
    }

    /// Opens the database named in the config. Relative paths resolve against `data_dir`.
    pub async fn new(cfg: &Config, data_dir: &Path) -> Result<Self> {
        let sync_url = cfg.app.sync_url.clone();
        let auth_token = cfg.app.auth_token.clone();

        if cfg.app.get_db() == IN_MEMORY {
            return Self::open_local(IN_MEMORY).await;
        }

        let path = data_dir.join(cfg.app.get_db());
        let db = match (&sync_url, &auth_token) {
            (Some(url), Some(token)) => {
                tracing::info!("[db] running in synced database mode (offline writes)");
                let sync_interval = Duration::from_secs(cfg.app.sync_interval_seconds);
                Builder::new_synced_database(&path, url.clone(), token.clone())
                    .sync_interval(sync_interval)
                    .build()
                    .await?
            }
            _ => {
                tracing::info!(path = ?path, "[db] running in local mode");
                Builder::new_local(&path).build().await?
            }
        };

        Self::init(db, Self::is_replica(&sync_url, &auth_token)).await
    }

    pub async fn open_local(path: &str) -> Result<Self> {
        let db = Builder::new_local(path).build().await?;
        Self::init(db, false).await
    }

    async fn init(db: LibsqlDatabase, replica: bool) -> Result<Self> {
        let conn = db.connect()?;
        conn.query("SELECT 1", ()).await?;
        conn.execute_batch("PRAGMA foreign_keys = ON;").await?;

        Self::migrate(&conn).await?;

        Ok(Database { db, conn, replica })
    }

    fn book_from_row(row: &Row) -> Result<Book> {
        Ok(Book {
            id: row.get(0)?,
            title: row.get(1)?,
            author: row.get(2)?,
            genre: row.get(3)?,
            created_at: row.get(4)?,
            user_id: row.get(5)?,
            user: BookOwner {
                name: row.get::<Option<String>>(6)?,
                email: row.get::<Option<String>>(7)?,
            },
        })
    }

    fn user_from_row(row: &Row) -> Result<User> {
        Ok(User {
            id: row.get(0)?,
            name: row.get::<Option<String>>(1)?,
            email: row.get(2)?,
            image: row.get::<Option<String>>(3)?,
            password_hash: row.get(4)?,
            created_at: row.get(5)?,
        })
    }

    /// Every book, newest first. Books created within the same microsecond
    /// fall back to insertion order.
    pub async fn list_books(&self) -> Result<Vec<Book>> {
        let query = format!("{SELECT_BOOKS} ORDER BY books.created_at DESC, books.rowid DESC");
        let mut rows = self.conn.query(&query, ()).await?;
        let mut books = vec![];

        while let Some(row) = rows.next().await? {
            books.push(Self::book_from_row(&row)?);
        }

        Ok(books)
    }

    pub async fn get_book(&self, book_id: &str) -> Result<Option<Book>> {
        let query = format!("{SELECT_BOOKS} WHERE books.id = ?");
        let mut rows = self.conn.query(&query, libsql::params![book_id]).await?;

        match rows.next().await? {
            Some(row) => Ok(Some(Self::book_from_row(&row)?)),
            None => Ok(None),
        }
    }

    pub async fn insert_book(&self, user_id: &str, book: &NewBook) -> Result<Book> {
        let id = Uuid::new_v4().to_string();
        let created_at = now_timestamp();

        self.conn
            .execute(
                "INSERT INTO books (id, title, author, genre, created_at, user_id) VALUES (?, ?, ?, ?, ?, ?)",
                libsql::params![
                    id.as_str(),
                    book.title.as_str(),
                    book.author.as_str(),
                    book.genre.as_str(),
                    created_at.as_str(),
                    user_id
                ],
            )
            .await?;

        match self.get_book(&id).await? {
            Some(book) => Ok(book),
            None => anyhow::bail!("book {} vanished right after insert", id),
        }
    }

    /// Returns whether a row was removed.
    pub async fn delete_book(&self, book_id: &str) -> Result<bool> {
        let deleted = self
            .conn
            .execute("DELETE FROM books WHERE id = ?", libsql::params![book_id])
            .await?;
        Ok(deleted > 0)
    }

    /// Inserts a user, or returns `None` when the email is already registered.
    pub async fn create_user(
        &self,
        email: &str,
        name: Option<&str>,
        image: Option<&str>,
        password_hash: &str,
    ) -> Result<Option<User>> {
        let id = Uuid::new_v4().to_string();
        let inserted = self
            .conn
            .execute(
                r#"
                INSERT INTO users (id, name, email, image, password_hash, created_at)
                VALUES (?, ?, ?, ?, ?, ?)
                ON CONFLICT(email) DO NOTHING
                "#,
                libsql::params![id.as_str(), name, email, image, password_hash, now_timestamp()],
            )
            .await?;

        if inserted == 0 {
            return Ok(None);
        }

        self.get_user(&id).await
    }

    pub async fn get_user(&self, user_id: &str) -> Result<Option<User>> {
        let query = format!("{SELECT_USERS} WHERE id = ?");
        let mut rows = self.conn.query(&query, libsql::params![user_id]).await?;

        match rows.next().await? {
            Some(row) => Ok(Some(Self::user_from_row(&row)?)),
            None => Ok(None),
        }
    }

    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let query = format!("{SELECT_USERS} WHERE email = ?");
        let mut rows = self.conn.query(&query, libsql::params![email]).await?;

        match rows.next().await? {
            Some(row) => Ok(Some(Self::user_from_row(&row)?)),
            None => Ok(None),
        }
    }
}
