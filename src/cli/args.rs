use clap::{Parser, ValueEnum};
use std::env;
use std::net::SocketAddr;

use crate::repository::Liveness;
use crate::store::mongo::{DEFAULT_COLLECTION, DEFAULT_DATABASE, DEFAULT_HOST};

/// How `/health` reports store connectivity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LivenessArg {
    /// Report the result of the startup probe.
    Cached,
    /// Ping the store on every request.
    Probe,
}

impl From<LivenessArg> for Liveness {
    fn from(arg: LivenessArg) -> Self {
        match arg {
            LivenessArg::Cached => Liveness::Cached,
            LivenessArg::Probe => Liveness::Probe,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "REST API over a MongoDB collection of identity records",
    long_about = "Serves list/create/read/update/delete endpoints for identity records (name, email, password) stored in a MongoDB collection."
)]
pub struct Cli {
    #[arg(
        long,
        env = "MONGO_URI",
        default_value = DEFAULT_HOST,
        value_name = "URI",
        help = "The host address of the database"
    )]
    pub host: String,

    #[arg(
        long,
        env = "IDENTITY_DATABASE",
        default_value = DEFAULT_DATABASE,
        value_name = "NAME",
        help = "Database holding the identity collection"
    )]
    pub database: String,

    #[arg(
        long,
        env = "IDENTITY_COLLECTION",
        default_value = DEFAULT_COLLECTION,
        value_name = "NAME",
        help = "Collection of identity records"
    )]
    pub collection: String,

    #[arg(
        long = "api-listen",
        env = "IDENTITY_API_LISTEN",
        value_name = "ADDR",
        default_value = "0.0.0.0:5000",
        help = "REST API listen address (host:port)"
    )]
    pub api_listen: SocketAddr,

    #[arg(
        long,
        env = "PORT",
        value_name = "PORT",
        help = "Override only the port of --api-listen"
    )]
    pub port: Option<u16>,

    #[arg(
        long = "server-selection-timeout-ms",
        env = "MONGO_SERVER_SELECTION_TIMEOUT_MS",
        default_value_t = 30_000u64,
        value_name = "MS",
        help = "How long the database client waits for a reachable server"
    )]
    pub server_selection_timeout_ms: u64,

    #[arg(
        long,
        env = "IDENTITY_LIVENESS",
        value_enum,
        default_value_t = LivenessArg::Cached,
        help = "Connectivity reported by /health: startup result or a fresh ping"
    )]
    pub liveness: LivenessArg,

    #[arg(
        long = "log-file",
        env = "IDENTITY_LOG_FILE",
        value_name = "PATH",
        help = "Write logs to PATH (in addition to stderr)"
    )]
    pub log_file: Option<String>,
}

pub fn parse() -> Cli {
    let dotenv_path = env::var("DOTENV_PATH").unwrap_or(".env".into());
    if dotenvy::from_filename(&dotenv_path).is_ok() {
        log::info!("Loaded env from {}", dotenv_path);
    }
    Cli::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_local_mongodb() {
        let cli = Cli::try_parse_from(["identity-api"]).unwrap();
        assert_eq!(cli.database, "data");
        assert_eq!(cli.collection, "identity");
        assert_eq!(cli.liveness, LivenessArg::Cached);
        assert_eq!(Liveness::from(cli.liveness), Liveness::Cached);
        assert_eq!(cli.server_selection_timeout_ms, 30_000);
    }

    #[test]
    fn flags_override_defaults() {
        let cli = Cli::try_parse_from([
            "identity-api",
            "--host",
            "mongodb://db:27017/",
            "--api-listen",
            "127.0.0.1:8080",
            "--port",
            "9090",
            "--liveness",
            "probe",
        ])
        .unwrap();
        assert_eq!(cli.host, "mongodb://db:27017/");
        assert_eq!(cli.api_listen, "127.0.0.1:8080".parse().unwrap());
        assert_eq!(cli.port, Some(9090));
        assert_eq!(Liveness::from(cli.liveness), Liveness::Probe);
    }

    #[test]
    fn rejects_bad_listen_address() {
        assert!(Cli::try_parse_from(["identity-api", "--api-listen", "nowhere"]).is_err());
    }
}
