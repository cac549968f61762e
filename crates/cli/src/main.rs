//! Gallery CLI - database migrations, seeding and dashboard tools.
//!
//! # Usage
//!
//! ```bash
//! # Run storefront database migrations
//! gallery-cli migrate
//!
//! # Load the catalog from a YAML file
//! gallery-cli seed crates/cli/seed/catalog.yaml
//!
//! # Create a dashboard login (password read from stdin)
//! gallery-cli user create -e curator@example.com -n "Curator" -r admin
//!
//! # Drive the admin dashboard against a running server
//! gallery-cli dashboard products list --sort price --desc
//! gallery-cli dashboard artworks delete 4
//! gallery-cli dashboard orders status 12 fulfilled
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `seed` - Load categories, products and artworks from YAML
//! - `user create` - Create login users
//! - `dashboard` - List, delete and update entities through the API

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use gallery_admin::Tab;
use gallery_core::{CategoryId, OrderId, OrderStatus, UserRole};

mod commands;

#[derive(Parser)]
#[command(name = "gallery-cli")]
#[command(author, version, about = "Gallery CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Load the catalog from a YAML file
    Seed {
        /// Path to the catalog file
        file: String,
    },
    /// Manage login users
    User {
        #[command(subcommand)]
        action: UserAction,
    },
    /// Drive the admin dashboard against a running server
    Dashboard {
        /// Tab: artworks, products, categories or orders
        tab: Tab,

        #[command(subcommand)]
        action: DashboardAction,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Create a new user. The password is read from stdin.
    Create {
        /// Login email address
        #[arg(short, long)]
        email: String,

        /// Display name
        #[arg(short, long)]
        name: String,

        /// Role (`admin`, `viewer`)
        #[arg(short, long, default_value = "admin")]
        role: UserRole,
    },
}

#[derive(Subcommand)]
enum DashboardAction {
    /// Show the tab as a table
    List {
        /// Case-insensitive text search
        #[arg(long)]
        search: Option<String>,

        /// Column key to sort by
        #[arg(long)]
        sort: Option<String>,

        /// Sort descending
        #[arg(long, requires = "sort")]
        desc: bool,

        /// Only entities in this category
        #[arg(long)]
        category: Option<CategoryId>,

        /// Only orders with this status
        #[arg(long)]
        status: Option<OrderStatus>,
    },
    /// Delete an entity by ID
    Delete {
        id: i32,
    },
    /// Set an order's status
    Status {
        id: OrderId,
        status: OrderStatus,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gallery_cli=info,gallery_admin=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Seed { file } => {
            commands::seed::catalog(&file).await?;
        }
        Commands::User { action } => match action {
            UserAction::Create { email, name, role } => {
                commands::user::create(&email, &name, role).await?;
            }
        },
        Commands::Dashboard { tab, action } => {
            let session = commands::dashboard::Session::connect().await?;
            match action {
                DashboardAction::List {
                    search,
                    sort,
                    desc,
                    category,
                    status,
                } => {
                    let query = commands::dashboard::query(search, sort, desc, category, status);
                    session.list(tab, &query).await?;
                }
                DashboardAction::Delete { id } => session.delete(tab, id).await?,
                DashboardAction::Status { id, status } => {
                    if tab != Tab::Orders {
                        return Err(format!("{tab} has no status; use the orders tab").into());
                    }
                    session.set_order_status(id, status).await?;
                }
            }
        }
    }
    Ok(())
}
