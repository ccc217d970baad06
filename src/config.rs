use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use serde::Deserialize;
use serde_yaml;
use std::env;
use std::fs;
use std::path::PathBuf;

pub const DEFAULT_ENV_FILE: &str = ".env.local";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_BASE_URL: &str = "http://localhost:3000";
const PLACEHOLDER_PREFIX: &str = "your-";

#[derive(Parser, Debug)]
#[command(name = "bookcatalog")]
#[command(about = "Runs the book catalog service", long_about = None)]
pub struct Cli {
    /// YAML config file. Without it, configuration comes from the environment.
    #[arg(short = 'c', long = "config", global = true)]
    pub config_path: Option<String>,

    #[arg(long = "env-file", default_value = DEFAULT_ENV_FILE, global = true)]
    pub env_file: String,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP server (default).
    Serve,
    /// Write a local environment file with a fresh session secret, unless one exists.
    Setup,
    /// Talk to a running server.
    Books {
        #[arg(long, env = "BOOKCATALOG_URL", default_value = DEFAULT_BASE_URL)]
        url: String,
        #[arg(long, env = "BOOKCATALOG_EMAIL")]
        email: Option<String>,
        #[arg(long, env = "BOOKCATALOG_PASSWORD", hide_env_values = true)]
        password: Option<String>,
        #[command(subcommand)]
        action: BooksCommand,
    },
}

#[derive(Subcommand, Debug)]
pub enum BooksCommand {
    List,
    Add {
        #[arg(long)]
        title: String,
        #[arg(long)]
        author: String,
        #[arg(long)]
        genre: String,
    },
    Delete {
        id: String,
        /// Skip the confirmation prompt.
        #[arg(short = 'y', long = "yes")]
        yes: bool,
    },
}

pub fn default_config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".bookcatalog")
}

pub fn default_config_path() -> PathBuf {
    default_config_dir().join("config.yaml")
}

#[derive(Debug, Deserialize, Clone)]
pub struct App {
    database: String,
    #[serde(default = "default_port")]
    port: u16,
    #[serde(default)]
    pub sync_url: Option<String>,
    #[serde(default)]
    pub auth_token: Option<String>,
    #[serde(default = "default_sync_interval")]
    pub sync_interval_seconds: u64,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_sync_interval() -> u64 {
    60
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct Auth {
    secret: String,
    #[serde(default = "default_base_url")]
    base_url: String,
    #[serde(default)]
    pub google_client_id: Option<String>,
    #[serde(default)]
    pub google_client_secret: Option<String>,
}

impl App {
    pub fn get_db(&self) -> &str {
        &self.database
    }

    pub fn get_port(&self) -> u16 {
        self.port
    }
}

impl Auth {
    pub fn get_secret(&self) -> &str {
        &self.secret
    }

    pub fn get_base_url(&self) -> &str {
        &self.base_url
    }

    pub fn secure_cookies(&self) -> bool {
        self.base_url.starts_with("https://")
    }

    pub fn google_enabled(&self) -> bool {
        self.google_client_id.is_some() && self.google_client_secret.is_some()
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub app: App,
    pub auth: Auth,
}

impl Config {
    pub fn new(path: &str) -> Result<Self> {
        let yaml_str = fs::read_to_string(path)?;
        let cfg = Config::from_yaml(&yaml_str, |name| env::var(name).ok())?;
        Ok(cfg)
    }

    pub fn from_env() -> Result<Self> {
        Config::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the config from flat variables, the way `.env.local` lays them out.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let Some(database) = lookup("DATABASE_URL") else {
            bail!("DATABASE_URL is not set; run `bookcatalog setup` to create {}", DEFAULT_ENV_FILE);
        };
        let Some(secret) = lookup("SESSION_SECRET") else {
            bail!("SESSION_SECRET is not set; run `bookcatalog setup` to create {}", DEFAULT_ENV_FILE);
        };
        let port = match lookup("PORT") {
            Some(port) => port.parse::<u16>()?,
            None => DEFAULT_PORT,
        };
        let sync_interval_seconds = match lookup("DATABASE_SYNC_INTERVAL") {
            Some(secs) => secs.parse::<u64>()?,
            None => default_sync_interval(),
        };

        let cfg = Config {
            app: App {
                database,
                port,
                sync_url: lookup("DATABASE_SYNC_URL"),
                auth_token: lookup("DATABASE_AUTH_TOKEN"),
                sync_interval_seconds,
            },
            auth: Auth {
                secret,
                base_url: lookup("BASE_URL").unwrap_or_else(default_base_url),
                google_client_id: lookup("GOOGLE_CLIENT_ID"),
                google_client_secret: lookup("GOOGLE_CLIENT_SECRET"),
            },
        };
        cfg.normalized()
    }

    pub fn from_yaml<F>(yaml_str: &str, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let yaml_with_env = Config::substitute_env_vars(yaml_str, lookup)?;
        let config: Config = serde_yaml::from_str(&yaml_with_env)?;
        config.normalized()
    }

    /// Blank and placeholder optionals count as unset; the secret must be present.
    fn normalized(mut self) -> Result<Self> {
        self.app.sync_url = non_blank(self.app.sync_url.take());
        self.app.auth_token = non_blank(self.app.auth_token.take());
        self.auth.google_client_id = non_placeholder(self.auth.google_client_id.take());
        self.auth.google_client_secret = non_placeholder(self.auth.google_client_secret.take());

        if self.auth.secret.trim().is_empty() {
            bail!("session secret must not be empty");
        }
        if self.app.database.trim().is_empty() {
            bail!("database location must not be empty");
        }
        Ok(self)
    }

    /// Expands `${VAR}` and `${VAR:-default}`. An unset variable without a default
    /// expands to nothing; an unterminated `${` is left as written.
    fn substitute_env_vars<F>(yaml_str: &str, lookup: F) -> Result<String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut out = String::with_capacity(yaml_str.len());
        let mut rest = yaml_str;

        while let Some(open) = rest.find("${") {
            let Some(len) = rest[open + 2..].find('}') else {
                break;
            };
            out.push_str(&rest[..open]);

            let expr = &rest[open + 2..open + 2 + len];
            let (name, default) = match expr.split_once(":-") {
                Some((name, default)) => (name, Some(default)),
                None => (expr, None),
            };
            match (lookup(name), default) {
                (Some(value), _) => out.push_str(&value),
                (None, Some(default)) => out.push_str(default),
                (None, None) => tracing::warn!(var = name, "environment variable not set"),
            }

            rest = &rest[open + 2 + len + 1..];
        }
        out.push_str(rest);

        Ok(out)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn non_placeholder(value: Option<String>) -> Option<String> {
    non_blank(value).filter(|v| !v.starts_with(PLACEHOLDER_PREFIX))
}
