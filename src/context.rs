use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::cli::Cli;
use crate::repository::Liveness;
use crate::store::MongoSettings;

/// Resolved runtime configuration.
#[derive(Clone, Debug)]
pub struct Context {
    pub store: MongoSettings,
    pub api_listen: SocketAddr,
    pub liveness: Liveness,
    pub log_file: Option<PathBuf>,
}

impl Context {
    pub fn from_cli(cli: &Cli) -> Self {
        let mut api_listen = cli.api_listen;
        if let Some(port) = cli.port {
            api_listen.set_port(port);
        }
        Self {
            store: MongoSettings {
                host: cli.host.clone(),
                database: cli.database.clone(),
                collection: cli.collection.clone(),
                server_selection_timeout: Duration::from_millis(cli.server_selection_timeout_ms),
            },
            api_listen,
            liveness: cli.liveness.into(),
            log_file: cli.log_file.as_ref().map(PathBuf::from),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn port_overrides_listen_port_only() {
        let cli = Cli::try_parse_from([
            "identity-api",
            "--api-listen",
            "127.0.0.1:5000",
            "--port",
            "7000",
        ])
        .unwrap();
        let ctx = Context::from_cli(&cli);
        assert_eq!(ctx.api_listen, "127.0.0.1:7000".parse().unwrap());
    }

    #[test]
    fn store_settings_come_from_cli() {
        let cli = Cli::try_parse_from([
            "identity-api",
            "--host",
            "mongodb://db:27017/",
            "--database",
            "people",
            "--collection",
            "accounts",
            "--server-selection-timeout-ms",
            "1500",
            "--log-file",
            "logs/api.log",
            "--liveness",
            "probe",
        ])
        .unwrap();
        let ctx = Context::from_cli(&cli);
        assert_eq!(ctx.store.host, "mongodb://db:27017/");
        assert_eq!(ctx.store.database, "people");
        assert_eq!(ctx.store.collection, "accounts");
        assert_eq!(ctx.store.server_selection_timeout, Duration::from_millis(1500));
        assert_eq!(ctx.log_file, Some(PathBuf::from("logs/api.log")));
        assert_eq!(ctx.liveness, Liveness::Probe);
    }
}
