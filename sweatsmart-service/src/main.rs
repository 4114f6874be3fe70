use std::sync::Arc;

use clap::{Parser, Subcommand};
use sweatsmart_core::{PgEpisodeStore, SweatConfig, TracingNotifier};
use sweatsmart_service::{
    bind_identity, DirectorySink, EpisodeRepository, ExportOutcome, PdfFactory, ReportExporter,
    ReportSettings,
};
use tokio::sync::watch;
use tracing_subscriber::{fmt, EnvFilter};
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, default_value = "sweatsmart.toml")]
    config: String,

    #[arg(long)]
    health: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List a user's episodes, newest first
    Episodes {
        #[arg(long)]
        user: Uuid,
    },
    /// Export one episode as a PDF report
    Export {
        #[arg(long)]
        user: Uuid,
        /// Defaults to the most recently created episode
        #[arg(long)]
        episode: Option<Uuid>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (dev convenience — production uses real env vars)
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Load config
    let config = match SweatConfig::load(&args.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config from {}: {}", args.config, e);
            std::process::exit(1);
        }
    };

    // Init logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.service.log_level));
    fmt().with_env_filter(filter).init();

    // Connect to DB
    let pool = match sweatsmart_core::db::create_pool(&config.database).await {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Failed to connect to database: {}", e);
            std::process::exit(1);
        }
    };

    if args.health {
        match sweatsmart_core::db::health_check(&pool).await {
            Ok(v) => println!("✅ PostgreSQL connected: {}", v),
            Err(e) => {
                println!("❌ PostgreSQL connection failed: {}", e);
                std::process::exit(1);
            }
        }

        match sweatsmart_core::db::count_episodes(&pool).await {
            Ok(n) => println!("✅ episodes table reachable ({} rows)", n),
            Err(e) => {
                println!("❌ episodes table check failed: {}", e);
                std::process::exit(1);
            }
        }

        println!("✅ SweatSmart DB health check passed");
        return Ok(());
    }

    let Some(command) = args.command else {
        eprintln!("No command given (try --help)");
        std::process::exit(2);
    };

    let notifier = Arc::new(TracingNotifier);
    let repo = Arc::new(EpisodeRepository::new(
        Arc::new(PgEpisodeStore::new(pool)),
        notifier.clone(),
    ));

    let user = match &command {
        Command::Episodes { user } | Command::Export { user, .. } => *user,
    };

    // Drive the repository the way a signed-in session would
    let (_identity_tx, identity_rx) = watch::channel(Some(user));
    let mut state_rx = repo.subscribe();
    let binding = bind_identity(repo.clone(), identity_rx);
    let state = state_rx.wait_for(|s| !s.loading).await?.clone();
    binding.abort();

    if let Some(err) = &state.error {
        eprintln!("{}", err);
        std::process::exit(1);
    }

    match command {
        Command::Episodes { .. } => {
            println!("{}", serde_json::to_string_pretty(&state.episodes)?);
        }
        Command::Export { episode, .. } => {
            let chosen = match episode {
                Some(id) => state.episodes.iter().find(|e| e.id == id),
                None => state.episodes.first(),
            };
            let Some(chosen) = chosen else {
                eprintln!("No matching episode for user {}", user);
                std::process::exit(1);
            };

            let exporter = ReportExporter::new(
                ReportSettings::from_config(&config.report)?,
                Arc::new(PdfFactory),
                Arc::new(DirectorySink::new(&config.report.output_dir)),
                notifier,
            );

            match exporter.export(chosen).await {
                ExportOutcome::Saved { path, .. } => println!("{}", path.display()),
                ExportOutcome::Failed | ExportOutcome::Busy => std::process::exit(1),
            }
        }
    }

    Ok(())
}
