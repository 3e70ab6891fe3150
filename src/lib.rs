pub mod api;
pub mod cli;
pub mod clients;
pub mod config;
pub mod domain;
pub mod models;
pub mod services;
pub mod state;
pub mod storage;

use anyhow::Context;
use clap::{CommandFactory, Parser};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands, ListCommands};
pub use config::Config;
use models::ListUpdate;
use state::SharedState;

pub async fn run() -> anyhow::Result<()> {
    config::load_dotenv();

    let cli = Cli::parse();

    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    if matches!(command, Commands::Init) {
        if Config::create_default_if_missing()? {
            println!("✓ Created config.toml with default settings");
        } else {
            println!("config.toml already exists");
        }
        return Ok(());
    }

    let config = Config::load()?;
    config.validate()?;

    let prometheus_handle = if config.observability.metrics_enabled {
        use metrics_exporter_prometheus::PrometheusBuilder;
        let builder = PrometheusBuilder::new();
        let handle = builder
            .install_recorder()
            .context("Failed to install Prometheus recorder")?;
        Some(handle)
    } else {
        None
    };

    init_tracing(&config);
    if prometheus_handle.is_some() {
        info!("Prometheus metrics recorder initialized");
    }

    if matches!(command, Commands::Serve) {
        return run_server(config, prometheus_handle).await;
    }

    let state = SharedState::new(config)?;
    run_command(&state, command).await
}

fn init_tracing(config: &Config) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));

    let json = config.observability.json_logs;

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json).then(tracing_subscriber::fmt::layer))
        .init();
}

async fn run_command(state: &SharedState, command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Add { title, fields } => {
            cli::cmd_add_anime(state, &title.join(" "), fields).await
        }

        Commands::Bulk { file } => cli::cmd_bulk_add(state, file.as_deref()).await,

        Commands::List {
            search,
            genres,
            sort,
        } => cli::cmd_list_anime(state, search, genres, sort).await,

        Commands::Edit { id, title, fields } => {
            cli::cmd_edit_anime(state, &id, title, fields).await
        }

        Commands::Remove { ids, yes } => cli::cmd_remove_anime(state, &ids, yes).await,

        Commands::Rewatch { id } => cli::cmd_rewatch(state, &id).await,

        Commands::Export { output } => cli::cmd_export(state, output.as_deref()).await,

        Commands::Import { file } => cli::cmd_import(state, &file).await,

        Commands::Stats => cli::cmd_stats(state).await,

        Commands::Lists { command } => match command {
            ListCommands::Ls => cli::cmd_lists_list(state).await,
            ListCommands::Create { name, description } => {
                cli::cmd_lists_create(state, &name, description).await
            }
            ListCommands::Delete { list_id } => cli::cmd_lists_delete(state, &list_id).await,
            ListCommands::Update {
                list_id,
                name,
                description,
                clear_description,
            } => {
                let update = ListUpdate {
                    name,
                    description: if clear_description {
                        Some(None)
                    } else {
                        description.map(Some)
                    },
                };
                cli::cmd_lists_update(state, &list_id, update).await
            }
            ListCommands::Add { list_id, anime_id } => {
                cli::cmd_lists_add(state, &list_id, &anime_id).await
            }
            ListCommands::Remove { list_id, anime_id } => {
                cli::cmd_lists_remove(state, &list_id, &anime_id).await
            }
            ListCommands::Show { list_id } => cli::cmd_lists_show(state, &list_id).await,
        },

        Commands::Chat { prompt } => cli::cmd_chat(state, &prompt.join(" ")).await,

        Commands::Identify { image, add } => cli::cmd_identify(state, &image, add).await,

        Commands::Serve | Commands::Init => Ok(()),
    }
}

async fn run_server(
    config: Config,
    prometheus_handle: Option<metrics_exporter_prometheus::PrometheusHandle>,
) -> anyhow::Result<()> {
    info!(
        "anime-archive v{} starting AI proxy...",
        env!("CARGO_PKG_VERSION")
    );

    let api_state = api::create_app_state_from_config(&config, prometheus_handle)?;
    let app = api::router(api_state, &config.server);

    let port = config.server.port;
    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    info!("🌐 AI proxy running at http://localhost:{}", port);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => error!("Error listening for shutdown: {}", e),
    }
}
