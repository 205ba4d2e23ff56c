mod cli;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;

use cli::{Cli, Commands};
use sb_cache::MediaCache;
use sb_core::config::Config;
use sb_server::{lanip, AppContext, ConfigStore};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG if set, otherwise derive defaults from --verbose.
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "streambox=trace,sb_server=trace,sb_cache=debug,sb_scan=debug,sb_db=debug,tower_http=debug"
                .to_string()
        } else {
            "streambox=info,sb_server=info,sb_cache=info,tower_http=warn".to_string()
        }
    });
    tracing_subscriber::fmt().with_env_filter(&env_filter).init();

    match cli.command {
        Commands::Start { host, port, no_db } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(start_server(host, port, no_db, cli.config))
        }
        Commands::Validate { config } => validate_config(config.or(cli.config).as_deref()),
        Commands::Version => {
            println!("streambox {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

async fn start_server(
    host: String,
    port: Option<u16>,
    no_db: bool,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let cfg_path = config_path.unwrap_or_else(default_config_path);
    tracing::info!(config = %cfg_path.display(), "loading configuration");

    let store = ConfigStore::load_or_init(cfg_path.clone())
        .with_context(|| format!("failed to load config at {}", cfg_path.display()))?;
    let cfg = store.snapshot();
    let port = port.unwrap_or_else(|| cfg.effective_port());

    let db = if no_db {
        tracing::info!("running without an index database");
        None
    } else {
        let db_path = cfg_path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join("streambox.db");
        tracing::info!(db = %db_path.display(), "initializing media index");
        Some(
            sb_db::init_pool(&db_path.to_string_lossy())
                .with_context(|| format!("failed to initialize index at {}", db_path.display()))?,
        )
    };

    let disk_cache = PathBuf::from(format!("{}.media_cache.json", cfg_path.display()));
    let cache = MediaCache::new(db.clone(), disk_cache);
    let ctx = AppContext::new(db, store, cache.clone());

    let listener = tokio::net::TcpListener::bind((host.as_str(), port))
        .await
        .with_context(|| format!("failed to bind {host}:{port}"))?;

    for url in lanip::access_urls(port) {
        tracing::info!("serving at {url}");
        println!("serving at {url}");
    }

    maybe_open_browser(port);

    tokio::select! {
        result = sb_server::serve(ctx, listener) => {
            result.context("server error")?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutting down");
        }
    }
    cache.shutdown();
    Ok(())
}

/// config.json beside the executable, falling back to the working
/// directory when the executable path is unavailable.
fn default_config_path() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|d| d.to_path_buf()))
        .unwrap_or_else(|| PathBuf::from("."))
        .join("config.json")
}

/// Open the default browser at the local URL unless suppressed via
/// `MSP_NO_AUTO_OPEN=1`.
fn maybe_open_browser(port: u16) {
    if std::env::var("MSP_NO_AUTO_OPEN").map(|v| v == "1").unwrap_or(false) {
        return;
    }
    let url = format!("http://127.0.0.1:{port}/");
    let result = if cfg!(target_os = "macos") {
        std::process::Command::new("open").arg(&url).spawn()
    } else if cfg!(target_os = "windows") {
        std::process::Command::new("cmd")
            .args(["/C", "start", "", &url])
            .spawn()
    } else {
        std::process::Command::new("xdg-open").arg(&url).spawn()
    };
    if let Err(e) = result {
        tracing::debug!(error = %e, "browser auto-open failed");
    }
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    match path {
        Some(p) => {
            println!("Validating config: {}", p.display());
            let contents = std::fs::read_to_string(p)
                .with_context(|| format!("failed to read {}", p.display()))?;
            let config = Config::from_json(&contents)?;
            println!("✓ Configuration is valid");
            println!("  Port: {}", config.effective_port());
            println!("  Shares: {}", config.shares.len());
            for sh in &config.shares {
                println!("    {} -> {}", sh.label, sh.path);
            }
            println!(
                "  Blacklist rules: {} ext, {} file, {} folder",
                config.blacklist.extensions.len(),
                config.blacklist.filenames.len(),
                config.blacklist.folders.len()
            );
            println!("  Max items: {}", config.max_items);
        }
        None => {
            println!("No config file specified, using defaults");
            let config = Config::default();
            println!("  Port: {}", config.effective_port());
        }
    }
    Ok(())
}
