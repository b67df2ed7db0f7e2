use clap::{Parser, Subcommand};
use std::sync::Arc;

use campus_inbox::application::errors::InboxError;
use campus_inbox::application::messaging::{CommandParser, DispatchOutcome, InboxDispatcher, Messaging};
use campus_inbox::application::services::{MessageStore, NotificationStore};
use campus_inbox::domain::entities::User;
use campus_inbox::domain::traits::SnapshotStore;
use campus_inbox::infrastructure::adapters::ConsoleAdapter;
use campus_inbox::infrastructure::config::Config;
use campus_inbox::infrastructure::fixtures;
use campus_inbox::infrastructure::scheduler::TokioScheduler;
use campus_inbox::infrastructure::storage::{load_seed, JsonStore, SeedData};

#[derive(Parser)]
#[command(name = "campus-inbox")]
#[command(about = "Lost-and-found marketplace inbox", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, default_value = "config.yaml")]
    config: String,

    /// Acting user id (overrides config)
    #[arg(short, long)]
    user: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the interactive inbox
    Run,
    /// Show version
    Version,
    /// Generate default config
    InitConfig,
}

fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run => {
            if let Err(e) = run_inbox(cli.config, cli.user) {
                tracing::error!("{}", e);
                std::process::exit(1);
            }
        }
        Commands::Version => {
            println!("campus-inbox v{}", env!("CARGO_PKG_VERSION"));
        }
        Commands::InitConfig => {
            init_config();
        }
    }
}

fn load_config(config_path: &str) -> Config {
    if std::path::Path::new(config_path).exists() {
        Config::load(config_path).unwrap_or_else(|e| {
            tracing::warn!("Failed to load config: {}, using defaults", e);
            Config::load_env()
        })
    } else {
        Config::load_env()
    }
}

fn run_inbox(config_path: String, user_override: Option<String>) -> Result<(), InboxError> {
    let mut config = load_config(&config_path);
    if let Some(user) = user_override {
        config.inbox.current_user_id = user;
    }
    config.validate()?;

    tracing::info!(
        "Starting {} as {}",
        config.inbox.name,
        config.inbox.current_user_id
    );

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| InboxError::Internal(format!("Failed to start runtime: {}", e)))?;
    rt.block_on(run_console(config))
}

async fn run_console(config: Config) -> Result<(), InboxError> {
    let scheduler = Arc::new(TokioScheduler::new());
    let store = MessageStore::with_timing(scheduler, config.simulation.timing()?);

    let seed = match &config.storage.seed_path {
        Some(path) => load_seed(path).await.unwrap_or_else(|e| {
            tracing::warn!("Failed to load seed: {}, using demo data", e);
            fixtures::seed()
        }),
        None => fixtures::seed(),
    };
    let SeedData {
        conversations,
        messages,
    } = seed;
    store.initialize_store(conversations, messages);

    let snapshots = JsonStore::new(&config.storage.state_path);
    snapshots.init().await?;
    match snapshots.load().await {
        Ok(Some(snapshot)) => {
            tracing::info!("Restored inbox state from {}", snapshots.path().display());
            store.restore(snapshot);
        }
        Ok(None) => {}
        Err(e) => tracing::warn!("Ignoring saved state: {}", e),
    }

    let notifications = if config.notifications.seed_defaults {
        NotificationStore::with_notifications(fixtures::notifications())
    } else {
        NotificationStore::new()
    };

    let user_id = config.inbox.current_user_id.clone();
    let current_user = fixtures::user(&user_id).unwrap_or_else(|| User::new(&user_id, &user_id));
    let messaging = Messaging::new(store.clone(), &user_id);
    let dispatcher = InboxDispatcher::new(messaging, notifications, current_user);
    let parser = CommandParser::new(&config.inbox.command_prefix);

    let mut console = ConsoleAdapter::new();
    let watch = console.watch_status(&store, &user_id);
    console.print(&format!(
        "{} - type {}help for commands",
        config.inbox.name,
        parser.prefix()
    ));

    // Main loop
    while let Some(line) = console.read_line("> ").await {
        let Some(command) = parser.parse(&line) else {
            continue;
        };
        match dispatcher.dispatch(command) {
            DispatchOutcome::Reply(text) => console.print(&text),
            DispatchOutcome::Quit => break,
        }
    }

    store.unsubscribe(watch);
    let cancelled = store.cancel_pending_deliveries();
    if cancelled > 0 {
        tracing::debug!("Cancelled {} pending status updates", cancelled);
    }

    snapshots.save(&store.persisted()).await?;
    tracing::info!("Saved inbox state to {}", snapshots.path().display());
    Ok(())
}

fn init_config() {
    match Config::default().to_yaml() {
        Ok(yaml) => {
            println!("{}", yaml);
            println!("\nSave this to config.yaml and adjust as needed.");
        }
        Err(e) => tracing::error!("Failed to render config: {}", e),
    }
}
