//! Agency CLI - migrations, admin users and access inspection.
//!
//! # Usage
//!
//! ```bash
//! # Run admin database migrations
//! agency-cli migrate
//!
//! # Manage admin users
//! agency-cli admin create -e editor@agency.studio -n "Ed Itor" -r editor
//! agency-cli admin set-role -e editor@agency.studio -r admin
//! agency-cli admin deactivate -e editor@agency.studio
//! agency-cli admin list
//!
//! # Inspect the permission tables (no database needed)
//! agency-cli access check --role editor --path /admin/blog/drafts
//! agency-cli access pages --role viewer
//! agency-cli access assignable --role admin
//! agency-cli access table
//!
//! # Sign in against the hosted identity service and print the gate state
//! agency-cli session status -e editor@agency.studio
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "agency-cli")]
#[command(author, version, about = "Agency admin CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run admin database migrations
    Migrate,
    /// Manage admin users
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
    /// Query the role-permission tables
    Access {
        #[command(subcommand)]
        query: AccessQuery,
    },
    /// Exercise the session gate against live services
    Session {
        #[command(subcommand)]
        action: SessionAction,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Create a new admin user
    Create {
        /// Admin email address
        #[arg(short, long)]
        email: String,

        /// Admin display name
        #[arg(short, long)]
        name: String,

        /// Admin role (`super_admin`, `admin`, `editor`, `viewer`)
        #[arg(short, long, default_value = "viewer")]
        role: String,
    },
    /// Change an admin user's role
    SetRole {
        #[arg(short, long)]
        email: String,

        #[arg(short, long)]
        role: String,
    },
    /// Deactivate an admin user
    Deactivate {
        #[arg(short, long)]
        email: String,
    },
    /// List admin users
    List,
}

#[derive(Subcommand)]
enum AccessQuery {
    /// Can ROLE open PATH?
    Check {
        #[arg(short, long)]
        role: String,

        #[arg(short, long)]
        path: String,
    },
    /// Pages ROLE may open
    Pages {
        #[arg(short, long)]
        role: String,
    },
    /// Roles ROLE may grant
    Assignable {
        #[arg(short, long)]
        role: String,
    },
    /// Print the permission and path tables
    Table,
}

#[derive(Subcommand)]
enum SessionAction {
    /// Sign in, wait for the gate to settle, print state and navigation
    Status {
        #[arg(short, long)]
        email: String,

        /// Password (prefer the environment variable)
        #[arg(short, long, env = "AGENCY_ADMIN_PASSWORD", hide_env_values = true)]
        password: String,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::admin().await?,
        Commands::Admin { action } => match action {
            AdminAction::Create { email, name, role } => {
                commands::admin::create_user(&email, &name, &role).await?;
            }
            AdminAction::SetRole { email, role } => {
                commands::admin::set_role(&email, &role).await?;
            }
            AdminAction::Deactivate { email } => commands::admin::deactivate(&email).await?,
            AdminAction::List => commands::admin::list().await?,
        },
        Commands::Access { query } => match query {
            AccessQuery::Check { role, path } => commands::access::check(&role, &path),
            AccessQuery::Pages { role } => commands::access::pages(&role),
            AccessQuery::Assignable { role } => commands::access::assignable(&role),
            AccessQuery::Table => commands::access::table(),
        },
        Commands::Session { action } => match action {
            SessionAction::Status { email, password } => {
                commands::session::status(&email, password).await?;
            }
        },
    }
    Ok(())
}
