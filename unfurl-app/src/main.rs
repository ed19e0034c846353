use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use unfurl_common::observability::{LogConfig, init_logging};
use unfurl_config::{UnfurlConfig, UnfurlConfigLoader};
use unfurl_web::Unfurler;

mod server;

const DEFAULT_CONFIG_FILE: &str = "unfurl.yaml";

#[derive(Parser, Debug)]
#[command(name = "unfurl", version, about = "Fetch link preview metadata for URLs")]
struct Cli {
    /// YAML config file. Without it `./unfurl.yaml` is used when present.
    #[arg(long, short, global = true, env = "UNFURL_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Unfurl one URL and print the result as JSON.
    Get { url: String },
    /// Run the HTTP API.
    Serve {
        #[arg(long, env = "UNFURL_BIND", default_value = "0.0.0.0:8080")]
        bind: SocketAddr,
    },
    /// Print the effective configuration as YAML.
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 1) Load config (env wins)
    let cfg = load_config(cli.config.as_deref())?;

    if let Command::Config = cli.command {
        print!("{}", cfg.to_yaml()?);
        return Ok(());
    }

    init_logging(LogConfig {
        app_name: "unfurl",
        log_dir: cfg.logging.log_dir.clone(),
        emit_stderr: cfg.logging.emit_stderr,
        format: cfg.logging.format,
        default_filter: cfg.logging.filter.clone(),
    })?;

    let unfurler = Arc::new(Unfurler::from_config(&cfg)?);

    // 2) Ctrl-C cancels everything in flight
    let root = CancellationToken::new();
    tokio::spawn(cancel_on_signal(tokio::signal::ctrl_c(), root.clone()));

    match cli.command {
        Command::Get { url } => {
            let data = unfurler.unfurl(&url, &root).await?;
            println!("{}", serde_json::to_string_pretty(&data)?);
        }
        Command::Serve { bind } => {
            unfurler
                .initialize()
                .await
                .context("browser renderer is not available")?;
            let listener = tokio::net::TcpListener::bind(bind)
                .await
                .with_context(|| format!("failed to bind {bind}"))?;
            tracing::info!(addr = %bind, "unfurl server listening");
            server::serve(listener, server::AppState::new(unfurler, root)).await?;
        }
        Command::Config => {}
    }
    Ok(())
}

fn load_config(path: Option<&std::path::Path>) -> Result<UnfurlConfig> {
    let loader = match path {
        Some(p) => UnfurlConfigLoader::new().with_file(p),
        None => UnfurlConfigLoader::new().with_optional_file(DEFAULT_CONFIG_FILE),
    };
    loader
        .load()
        .with_context(|| match path {
            Some(p) => format!("failed to load config from {}", p.display()),
            None => "failed to load configuration".to_string(),
        })
}

/// Cancel `root` once `signal` fires. A listener that fails to install leaves
/// the token alone; in-flight work keeps running.
async fn cancel_on_signal<F>(signal: F, root: CancellationToken)
where
    F: Future<Output = std::io::Result<()>>,
{
    match signal.await {
        Ok(()) => {
            tracing::info!("ctrl-c received, shutting down");
            root.cancel();
        }
        Err(e) => tracing::error!(error = %e, "failed to listen for ctrl-c; shutdown signal disabled"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn signal_cancels_root() {
        let root = CancellationToken::new();
        cancel_on_signal(std::future::ready(Ok(())), root.clone()).await;
        assert!(root.is_cancelled());
    }

    #[tokio::test]
    async fn failed_listener_leaves_root_alone() {
        let root = CancellationToken::new();
        let err = std::io::Error::other("no signal handler");
        cancel_on_signal(std::future::ready(Err(err)), root.clone()).await;
        assert!(!root.is_cancelled());
    }

    #[test]
    fn cli_parses_serve_bind() {
        let cli = Cli::try_parse_from(["unfurl", "serve", "--bind", "127.0.0.1:9000"]).unwrap();
        match cli.command {
            Command::Serve { bind } => assert_eq!(bind.port(), 9000),
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
