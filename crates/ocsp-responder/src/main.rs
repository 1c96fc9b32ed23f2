//! OCSP Responder Binary
//!
//! `start` runs the responder in the foreground and writes a PID file;
//! `stop` signals the process recorded there.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use ocsp_core::{DerCodec, SystemClock};
use ocsp_responder::config::DEFAULT_PORT;
use ocsp_responder::pidfile::{self, DEFAULT_PIDFILE};
use ocsp_responder::{
    run_until_signalled, BootstrapSequencer, ConfigProvider, HttpLauncher, PemFileConfig,
    PostgresConnector, SettingsFileConfig, Worker,
};

/// RFC 6960 OCSP responder
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the responder
    Start(StartArgs),
    /// Stop a responder started with `start`
    Stop {
        #[arg(long, default_value = DEFAULT_PIDFILE)]
        pidfile: PathBuf,
    },
}

#[derive(clap::Args, Debug)]
struct StartArgs {
    /// CA certificate (PEM)
    #[arg(long, env = "CA_CERT_FILENAME", default_value = "certificates/ca.cer")]
    cacert: PathBuf,

    /// Responder certificate (PEM)
    #[arg(long, env = "SERVER_CERT_FILENAME", default_value = "certificates/ocsp.cer")]
    cert: PathBuf,

    /// Responder private key (PEM, PKCS#8 or PKCS#1)
    #[arg(long, env = "SERVER_KEY_FILENAME", default_value = "certificates/ocsp.key")]
    key: PathBuf,

    /// Revocation database URL. Optional with `--settings`, which falls
    /// back to `DATABASE_URL` on every load.
    #[arg(long, env = "DATABASE_URL", required_unless_present = "settings")]
    dburl: Option<String>,

    #[arg(long, env = "OCSP_PORT", default_value_t = DEFAULT_PORT)]
    port: u16,

    /// TOML settings file; replaces the certificate and port flags
    #[arg(long, env = "OCSP_SETTINGS_FILE")]
    settings: Option<PathBuf>,

    #[arg(long, default_value = DEFAULT_PIDFILE)]
    pidfile: PathBuf,
}

#[tokio::main]
async fn main() {
    init_logging();

    let cli = Cli::parse();
    let code = match cli.command {
        Command::Start(args) => start(args).await,
        Command::Stop { pidfile } => stop(&pidfile),
    };
    process::exit(code);
}

fn init_logging() {
    let log_level = std::env::var("OCSP_LOG_LEVEL")
        .unwrap_or_else(|_| "info".into())
        .parse()
        .unwrap_or(Level::INFO);

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(true)
        .with_thread_ids(true)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {e}");
    }
}

fn config_provider(args: &StartArgs) -> Arc<dyn ConfigProvider> {
    match &args.settings {
        Some(path) => Arc::new(SettingsFileConfig::new(path.clone(), args.dburl.clone())),
        None => Arc::new(PemFileConfig {
            ca_cert: args.cacert.clone(),
            responder_cert: args.cert.clone(),
            responder_key: args.key.clone(),
            database_url: args.dburl.clone().unwrap_or_default(),
            port: args.port,
        }),
    }
}

async fn start(args: StartArgs) -> i32 {
    let config = config_provider(&args);

    match pidfile::write(&args.pidfile) {
        Ok(pid) => info!(pid, path = %args.pidfile.display(), "Wrote PID file"),
        Err(e) => {
            error!(error = %e, "Cannot write PID file");
            return 1;
        }
    }

    let launcher = HttpLauncher::new(
        "0.0.0.0",
        Arc::new(DerCodec::new()),
        Arc::new(SystemClock),
    );
    let sequencer = BootstrapSequencer::new(
        config,
        Arc::new(PostgresConnector::from_env()),
        Arc::new(launcher),
    );

    info!(version = env!("CARGO_PKG_VERSION"), "Starting OCSP responder");
    let worker = Worker::start(sequencer);
    let code = match run_until_signalled(worker).await {
        Ok(()) => 0,
        Err(e) => {
            error!(error = %e, "OCSP responder failed");
            1
        }
    };

    if let Err(e) = pidfile::remove(&args.pidfile) {
        error!(error = %e, "Failed to remove PID file");
    }
    code
}

fn stop(path: &Path) -> i32 {
    let pid = match pidfile::read(path) {
        Ok(pid) => pid,
        Err(e) => {
            error!(error = %e, "No running responder");
            return 1;
        }
    };

    match process::Command::new("kill")
        .args(["-TERM", &pid.to_string()])
        .status()
    {
        Ok(status) if status.success() => {
            info!(pid, "Sent SIGTERM");
            if let Err(e) = pidfile::remove(path) {
                error!(error = %e, "Failed to remove PID file");
            }
            0
        }
        Ok(status) => {
            error!(pid, %status, "kill failed");
            1
        }
        Err(e) => {
            error!(pid, error = %e, "Failed to run kill");
            1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn start_args(argv: &[&str]) -> StartArgs {
        let cli = Cli::try_parse_from(argv).expect("arguments parse");
        match cli.command {
            Command::Start(args) => args,
            other => panic!("expected start, got {:?}", other),
        }
    }

    #[test]
    fn test_settings_file_needs_no_dburl() {
        let args = start_args(&[
            "ocsp-responder",
            "start",
            "--settings",
            "/etc/ocsp/settings.toml",
        ]);
        assert_eq!(args.settings, Some(PathBuf::from("/etc/ocsp/settings.toml")));
    }

    #[test]
    fn test_settings_file_keeps_explicit_dburl() {
        let args = start_args(&[
            "ocsp-responder",
            "start",
            "--settings",
            "/etc/ocsp/settings.toml",
            "--dburl",
            "postgres://db/pki",
        ]);
        assert_eq!(args.dburl.as_deref(), Some("postgres://db/pki"));
    }

    #[test]
    fn test_pem_flags_require_dburl() {
        if std::env::var_os("DATABASE_URL").is_some() {
            return;
        }
        assert!(Cli::try_parse_from(["ocsp-responder", "start"]).is_err());
    }

    #[test]
    fn test_empty_dburl_rejected_at_load() {
        let mut args = start_args(&["ocsp-responder", "start", "--dburl", "postgres://db/pki"]);
        args.dburl = None;

        let err = config_provider(&args).load().unwrap_err();
        assert!(matches!(err, ocsp_responder::ConfigError::Missing(_)));
    }
}
