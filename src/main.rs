use std::path::{Path, PathBuf};

use bookcatalog::config::{Cli, Command, Config, default_config_dir, default_config_path};
use bookcatalog::{cli, server, setup};
use clap::Parser;
use tracing_subscriber::EnvFilter;

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .without_time()
            .init();
    }
}

/// With --config, the data directory is the config file's directory. Otherwise
/// the environment wins, falling back to ~/.bookcatalog/config.yaml when no
/// DATABASE_URL is set and that file exists.
fn load_config(config_path: Option<String>) -> (anyhow::Result<Config>, PathBuf) {
    match config_path {
        Some(path) => {
            let path = PathBuf::from(path);
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from("."));
            (Config::new(&path.to_string_lossy()), dir)
        }
        None => {
            let fallback = default_config_path();
            if std::env::var_os("DATABASE_URL").is_none() && fallback.exists() {
                (Config::new(&fallback.to_string_lossy()), default_config_dir())
            } else {
                (Config::from_env(), PathBuf::from("."))
            }
        }
    }
}

#[tokio::main]
async fn main() {
    let args = Cli::parse();

    let env_file = PathBuf::from(&args.env_file);
    if env_file.exists() {
        if let Err(e) = dotenvy::from_path(&env_file) {
            eprintln!("failed to load {}: {}", env_file.display(), e);
            std::process::exit(1);
        }
    }

    match args.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            init_tracing(true);
            let (cfg, data_dir) = load_config(args.config_path);
            let cfg = cfg.unwrap_or_else(|e| {
                tracing::error!(error = %format!("{e:#}"), "failed to load config");
                std::process::exit(1);
            });
            if let Err(e) = std::fs::create_dir_all(&data_dir) {
                tracing::error!(error = %e, path = ?data_dir, "failed to create data directory");
                std::process::exit(1);
            }
            server::run(cfg, &data_dir).await;
        }
        Command::Setup => {
            init_tracing(false);
            if let Err(e) = setup::run(&env_file) {
                eprintln!("setup failed: {e:#}");
                std::process::exit(1);
            }
        }
        Command::Books {
            url,
            email,
            password,
            action,
        } => {
            init_tracing(false);
            if let Err(e) = cli::run_books(&url, email, password, action).await {
                eprintln!("error: {e:#}");
                std::process::exit(1);
            }
        }
    }
}
