use clap::{Parser, Subcommand};
use portfolio_core::{spotify, AppConfig};
use tokio::{net::TcpListener, signal};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod error;
mod routes;
mod state;

use state::AppState;

#[tokio::main]
async fn main() -> portfolio_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let mut config = AppConfig::from_env()?;

    match cli.command {
        Commands::Serve { port } => {
            if let Some(port) = port {
                config.server.port = port;
            }
            serve(config).await
        }
        Commands::AuthorizeUrl => {
            let state = spotify::generate_state();
            println!("{}", spotify::authorize_url(&config.spotify, &state)?);
            Ok(())
        }
    }
}

async fn serve(config: AppConfig) -> portfolio_core::Result<()> {
    let address = config.server.address();
    info!(?config, "starting server");

    let app = routes::router(AppState::from_config(config));

    let listener = TcpListener::bind(&address).await?;
    info!("listening on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("received Ctrl+C, shutting down"),
            Err(err) => {
                error!(%err, "failed to listen for Ctrl+C");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("received terminate signal, shutting down");
            }
            Err(err) => {
                error!(%err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Portfolio site backend", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Serve the music-stats proxy over HTTP.
    Serve {
        /// Overrides `PORTFOLIO_PORT`.
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Print a provider login URL, for obtaining a refresh token by hand.
    AuthorizeUrl,
}
