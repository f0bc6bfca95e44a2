use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use trellis::{
    bind_registered, from_fn, logging, Config, Container, Context, Next, Router, Server,
};

mod controllers;
mod middleware;
mod store;
mod views;

use controllers::UserController;
use store::UserStore;

#[derive(Parser)]
#[command(name = "app")]
#[command(about = "Demo application for trellis controllers", long_about = None)]
struct Cli {
    /// Directory holding the .env files
    #[arg(long, global = true, default_value = ".")]
    root: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server (default)
    Serve {
        /// Override SERVER_HOST
        #[arg(long)]
        host: Option<String>,

        /// Override SERVER_PORT
        #[arg(long, short = 'p')]
        port: Option<u16>,
    },
    /// List routes bound to the router
    Routes,
    /// Print view routes as JSON
    Views,
}

fn container() -> Container {
    let mut container = Container::new();
    container.singleton(UserController::new(Arc::new(UserStore::seeded())));
    container
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let cli = Cli::parse();
    let config = Config::init(&cli.root);
    logging::init(&config.app);

    let mut router = Router::new();
    let views = bind_registered(&mut router, Some(container().shared()))?;

    match cli.command.unwrap_or(Commands::Serve {
        host: None,
        port: None,
    }) {
        Commands::Routes => {
            for route in router.routes() {
                println!("{:<8} {:<20} {} handler(s)", route.method, route.path, route.handlers);
            }
        }
        Commands::Views => {
            println!("{}", serde_json::to_string_pretty(&views)?);
        }
        Commands::Serve { host, port } => {
            views::mount(&mut router, views)?;

            let mut server = Server::from_config(router, &config.server).middleware(from_fn(
                |ctx: Context, next: Next| async move {
                    ctx.set_header("X-Powered-By", "trellis");
                    next.run(ctx).await
                },
            ));
            if let Some(host) = host {
                server = server.host(&host);
            }
            if let Some(port) = port {
                server = server.port(port);
            }

            tracing::info!(app = %config.app.name, env = %config.app.environment, "starting");
            server.run().await?;
        }
    }

    Ok(())
}
