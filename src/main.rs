//! Back office server and schema tooling.
//!
//! ```bash
//! backoffice serve               # HTTP server on BACKOFFICE_BIND
//! backoffice migrate --pretend   # print pending DDL
//! backoffice rollback            # revert the last batch
//! backoffice status
//! ```

use backoffice::{admin, app, ensure_database_exists, AppState, Migrator, Settings};
use clap::{Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;

#[derive(Parser)]
#[command(name = "backoffice")]
#[command(version, about = "Back office for members, products and FAQ categories")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the admin panel and the public API
    Serve,
    /// Apply pending migrations as one batch
    Migrate {
        /// Print the DDL without executing it
        #[arg(long)]
        pretend: bool,
    },
    /// Revert the last batch of migrations
    Rollback {
        /// Print the DDL without executing it
        #[arg(long)]
        pretend: bool,
    },
    /// List applied and pending migrations
    Status,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("backoffice=info")),
        )
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let settings = Settings::from_env()?;
    ensure_database_exists(&settings.database_url).await?;
    let pool = PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .connect(&settings.database_url)
        .await?;
    let migrator = Migrator::new(&settings.schema);

    match cli.command {
        Commands::Serve => {
            let registry = admin::registry()?;
            let state = AppState::new(pool, registry);
            let listener = TcpListener::bind(settings.bind).await?;
            tracing::info!("Back office listening on http://{}", listener.local_addr()?);
            axum::serve(listener, app(state)).await?;
        }
        Commands::Migrate { pretend } => {
            for applied in migrator.migrate(&pool, pretend).await? {
                print_applied(applied.name, &applied.statements, pretend);
            }
        }
        Commands::Rollback { pretend } => {
            for reverted in migrator.rollback(&pool, pretend).await? {
                print_applied(reverted.name, &reverted.statements, pretend);
            }
        }
        Commands::Status => {
            for s in migrator.status(&pool).await? {
                match s.batch {
                    Some(batch) => println!("[batch {batch}] {}", s.name),
                    None => println!("[pending] {}", s.name),
                }
            }
        }
    }
    Ok(())
}

fn print_applied(name: &str, statements: &[String], pretend: bool) {
    if pretend {
        println!("-- {name}");
        for sql in statements {
            println!("{sql};");
        }
    } else {
        println!("{name}");
    }
}
