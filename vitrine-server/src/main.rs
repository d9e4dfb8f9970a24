//! Vitrine server binary

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::{filter::Targets, fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use vitrine_config::{ConfigLoader, VitrineConfig};
use vitrine_server::run_server;

#[derive(Parser)]
#[command(name = "vitrine-server", about = "Multi-tenant storefront platform core", version)]
struct Cli {
    /// Path to a YAML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server and provisioning worker (default)
    Serve,
    /// Run pending database migrations and exit
    Migrate,
}

/// Operator log on stdout plus a dedicated forensic file that receives
/// every `target: "audit"` event.
fn init_tracing(config: &VitrineConfig) -> tracing_appender::non_blocking::WorkerGuard {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.logging.level.clone()));

    let audit_path = Path::new(&config.logging.audit_file);
    let directory = audit_path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
    let file_name = audit_path.file_name().map(|n| n.to_os_string()).unwrap_or_else(|| "vitrine-audit.log".into());
    let appender = tracing_appender::rolling::never(directory, file_name);
    let (audit_writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(fmt::layer().with_filter(filter))
        .with(
            fmt::layer()
                .with_writer(audit_writer)
                .with_ansi(false)
                .with_filter(Targets::new().with_target("audit", tracing::Level::INFO)),
        )
        .init();

    guard
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = ConfigLoader::new().load(cli.config.as_ref())?;
    let _audit_guard = init_tracing(&config);

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => run_server(config).await,
        Command::Migrate => {
            let db = vitrine_storage::DatabaseConnection::new(config.database.clone()).await?;
            db.migrate().await?;
            tracing::info!("migrations complete");
            Ok(())
        }
    }
}
