use anyhow::Context;
use clap::Parser;
use crudbox_server::{App, Config};
use std::net::IpAddr;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "crudbox", version, about = "Project-scoped HTTP mock server")]
struct Args {
    /// YAML configuration file
    #[arg(short, long, env = "CRUDBOX_CONFIG")]
    config: Option<PathBuf>,

    /// Admin API port
    #[arg(long, env = "CRUDBOX_ADMIN_PORT")]
    admin_port: Option<u16>,

    /// Mock listener port
    #[arg(long, env = "CRUDBOX_MOCK_PORT")]
    mock_port: Option<u16>,

    /// Bind address for both listeners
    #[arg(long, env = "CRUDBOX_HOST")]
    host: Option<IpAddr>,

    /// JSON snapshot file for durable state
    #[arg(long, env = "CRUDBOX_SNAPSHOT")]
    snapshot: Option<PathBuf>,

    /// Log level used when CRUDBOX_LOG and RUST_LOG are unset
    #[arg(long, env = "CRUDBOX_LOG_LEVEL", default_value = "info")]
    log_level: String,
}

impl Args {
    fn into_config(self) -> anyhow::Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::from_file(path)?,
            None => Config::default(),
        };
        if let Some(port) = self.admin_port {
            config.admin.port = port;
        }
        if let Some(port) = self.mock_port {
            config.mock.port = port;
        }
        if let Some(host) = self.host {
            config.admin.host = host;
            config.mock.host = host;
        }
        if let Some(path) = self.snapshot {
            config.store.snapshot_path = Some(path);
        }
        config.validate()?;
        Ok(config)
    }
}

fn init_tracing(level: &str) -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_env("CRUDBOX_LOG")
        .or_else(|_| tracing_subscriber::EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))?;

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(&args.log_level)?;

    let config = args.into_config().context("invalid configuration")?;
    let app = App::bind(&config).await?;
    info!(
        admin = %app.admin_addr()?,
        mock = %app.mock_addr()?,
        "Crudbox started"
    );

    tokio::select! {
        result = app.run() => result,
        _ = tokio::signal::ctrl_c() => {
            info!("Shutting down");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_defaults() {
        let args = Args::parse_from([
            "crudbox",
            "--admin-port",
            "3000",
            "--mock-port",
            "3001",
            "--host",
            "127.0.0.1",
        ]);
        let config = args.into_config().unwrap();
        assert_eq!(config.admin.port, 3000);
        assert_eq!(config.mock.port, 3001);
        assert_eq!(config.mock.socket_addr().to_string(), "127.0.0.1:3001");
    }

    #[test]
    fn test_conflicting_ports_rejected() {
        let args = Args::parse_from(["crudbox", "--admin-port", "3000", "--mock-port", "3000"]);
        assert!(args.into_config().is_err());
    }
}
