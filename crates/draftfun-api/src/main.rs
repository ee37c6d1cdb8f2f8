//! Draftfun CLI and REST API entry point.
//!
//! Binary name: `draftfun`
//!
//! Parses CLI arguments, initializes database and services, then dispatches
//! to the appropriate command handler or starts the REST API server.

mod cli;
mod http;
mod state;

use clap::Parser;
use clap_complete::generate;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up tracing based on verbosity
    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "warn",
        1 => "info,draftfun=debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .init();

    // Shell completions don't need app state
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "draftfun", &mut std::io::stdout());
        return Ok(());
    }

    // Initialize application state (DB, config, backend)
    let state = AppState::init().await?;

    match cli.command {
        Commands::Generate {
            prompt,
            engine,
            output,
            show_reasoning,
            publish,
            name,
            description,
            username,
        } => {
            cli::generate::run_generate(
                &state,
                &prompt,
                &engine,
                &output,
                show_reasoning,
                publish,
                name,
                description,
                &username,
                cli.json,
            )
            .await?;
        }

        Commands::Games { action } => match action {
            cli::games::GamesCommand::List { page } => {
                cli::games::list_games(&state, page, cli.json).await?;
            }
            cli::games::GamesCommand::Show { id } => {
                cli::games::show_game(&state, &id, cli.json).await?;
            }
            cli::games::GamesCommand::Delete { id, force } => {
                cli::games::delete_game(&state, &id, force, cli.json).await?;
            }
        },

        Commands::Serve { port, host } => {
            let addr = format!("{host}:{port}");
            let listener = tokio::net::TcpListener::bind(&addr).await?;

            println!(
                "  {} Draftfun API listening on {}",
                console::style("⚡").bold(),
                console::style(format!("http://{addr}")).cyan()
            );
            println!("  {}", console::style("Press Ctrl+C to stop").dim());

            let router = http::router::build_router(state);

            axum::serve(listener, router)
                .with_graceful_shutdown(shutdown_signal())
                .await?;

            println!("\n  Server stopped.");
        }

        Commands::Completions { .. } => unreachable!("handled above"),
    }

    Ok(())
}

/// Wait for Ctrl+C or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
