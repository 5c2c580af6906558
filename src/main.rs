use std::io::{self, BufRead, Write};

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use helpdesk_client::api::auth::SignupRequest;
use helpdesk_client::config::Config;
use helpdesk_client::models::{NewTicket, Priority, Role, Ticket, TicketStatus};
use helpdesk_client::views::{MountOutcome, Route, ViewError};
use helpdesk_client::AppState;

#[derive(Parser)]
#[command(name = "helpdesk", version, about = "Command-line client for the helpdesk service")]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and remember the session
    Login {
        #[arg(long)]
        email: String,
        /// Read from stdin when omitted
        #[arg(long)]
        password: Option<String>,
    },
    /// Create an account, then sign in with it
    Signup {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: Option<String>,
        /// Request the admin role
        #[arg(long)]
        admin: bool,
    },
    /// Forget the remembered session
    Logout,
    /// Show who is signed in
    Whoami,
    /// Work with tickets
    #[command(subcommand)]
    Tickets(TicketCommands),
    /// Audit trail and database switch (admins only)
    #[command(subcommand)]
    Admin(AdminCommands),
}

#[derive(Subcommand)]
enum TicketCommands {
    /// List visible tickets
    List,
    /// Open a new ticket
    Create {
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: String,
        #[arg(long, default_value_t = Priority::Medium)]
        priority: Priority,
    },
    /// Change a ticket's status (open, in-progress, closed)
    Status { id: String, status: TicketStatus },
    /// Delete a ticket
    Delete {
        id: String,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum AdminCommands {
    /// Show one page of the audit trail
    Logs {
        #[arg(long, default_value_t = 1)]
        page: usize,
    },
    /// Show whether the primary database is marked down
    DbStatus,
    /// Flip the primary database between up and down
    ToggleDb,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let config = Config::load()?;
    debug!(api = %config.api.base_url, data_dir = %config.storage.data_dir, "Loaded configuration");

    let app = AppState::open(config)?;

    match cli.cmd {
        Commands::Login { email, password } => {
            let password = password_or_prompt(password)?;
            let session = app.auth.login(&email, &password).await?;
            println!("Signed in as {} ({})", session.user.email, session.user.role);
        }
        Commands::Signup {
            name,
            email,
            password,
            admin,
        } => {
            let request = SignupRequest {
                name,
                email,
                password: password_or_prompt(password)?,
                role: admin.then_some(Role::Admin),
            };
            let session = app.auth.signup(&request).await?;
            println!("Signed up and signed in as {} ({})", session.user.email, session.user.role);
        }
        Commands::Logout => {
            app.auth.logout();
            println!("Signed out");
        }
        Commands::Whoami => match app.auth.user() {
            Some(user) => println!("{} ({}) id={}", user.email, user.role, user.id),
            None => println!("Not signed in"),
        },
        Commands::Tickets(cmd) => run_tickets(&app, cmd).await?,
        Commands::Admin(cmd) => run_admin(&app, cmd).await?,
    }

    Ok(())
}

async fn run_tickets(app: &AppState, cmd: TicketCommands) -> anyhow::Result<()> {
    let mut dashboard = app.dashboard();
    let mounted = dashboard.mount().await;
    ensure_mounted(mounted, dashboard.error())?;

    match cmd {
        TicketCommands::List => {
            if !dashboard.tickets_loaded() {
                bail!("tickets unavailable");
            }
            println!("{}", dashboard.heading());
            if dashboard.tickets().is_empty() {
                println!("  (none)");
            }
            for ticket in dashboard.tickets() {
                println!("  {}", ticket_line(ticket));
            }
        }
        TicketCommands::Create {
            title,
            description,
            priority,
        } => {
            let ticket = dashboard
                .create_ticket(NewTicket::new(title, description, priority))
                .await?;
            println!("Created {}", ticket_line(ticket));
        }
        TicketCommands::Status { id, status } => {
            dashboard.update_ticket_status(&id, status).await?;
            match dashboard.tickets().iter().find(|t| t.id == id) {
                Some(ticket) => println!("Updated {}", ticket_line(ticket)),
                None => println!("Updated {id}"),
            }
        }
        TicketCommands::Delete { id, yes } => {
            let deleted = dashboard
                .delete_ticket(&id, |prompt| yes || confirm_on_stdin(prompt))
                .await?;
            if deleted {
                println!("Deleted {id}");
            } else {
                println!("Kept {id}");
            }
        }
    }
    Ok(())
}

async fn run_admin(app: &AppState, cmd: AdminCommands) -> anyhow::Result<()> {
    let mut admin = app.admin();
    let mounted = admin.mount().await;
    ensure_mounted(mounted, admin.error())?;

    match cmd {
        AdminCommands::Logs { page } => {
            if !admin.logs_loaded() {
                bail!("audit logs unavailable");
            }
            admin.go_to_page(page);
            let page = admin.page();
            for entry in page.items {
                println!(
                    "{}  {:<20} {:<6} {}  {}",
                    entry.timestamp.format("%Y-%m-%d %H:%M:%S"),
                    entry.action,
                    entry.user_role,
                    entry.user_id.display_name(),
                    entry.details
                );
            }
            println!(
                "{} (page {} of {})",
                page.summary(),
                page.number,
                page.total_pages
            );
        }
        AdminCommands::DbStatus => {
            let status = admin.database_status().context("database status unavailable")?;
            println!("Primary database: {}", status.label());
        }
        AdminCommands::ToggleDb => {
            let status = admin.toggle_database().await?;
            info!(primary_down = status.primary_down, "Database toggled");
            println!("Primary database: {}", status.label());
        }
    }
    Ok(())
}

/// A failed fetch is reported and the command goes on; each subcommand
/// checks for the data it needs.
fn ensure_mounted(
    mounted: Result<MountOutcome, ViewError>,
    shown: Option<&str>,
) -> anyhow::Result<()> {
    match mounted {
        Ok(outcome) => ensure_ready(outcome),
        Err(ViewError::Cancelled) => bail!("cancelled"),
        Err(e) => {
            eprintln!("warning: {}", shown.map_or_else(|| e.to_string(), str::to_string));
            Ok(())
        }
    }
}

fn ensure_ready(outcome: MountOutcome) -> anyhow::Result<()> {
    match outcome {
        MountOutcome::Ready => Ok(()),
        MountOutcome::Redirect(Route::SignIn) => bail!("Not signed in; run `helpdesk login` first"),
        MountOutcome::Redirect(Route::Dashboard) => bail!("This command requires an admin account"),
        MountOutcome::Redirect(route) => bail!("Redirected to {route}"),
        MountOutcome::Loading => bail!("Session is still loading"),
    }
}

fn ticket_line(ticket: &Ticket) -> String {
    format!(
        "{}  [{}] [{}]  {}  by {}",
        ticket.id,
        ticket.status,
        ticket.priority,
        ticket.title,
        ticket.created_by.display_name()
    )
}

fn password_or_prompt(password: Option<String>) -> anyhow::Result<String> {
    if let Some(password) = password {
        return Ok(password);
    }
    eprint!("Password: ");
    io::stderr().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

fn confirm_on_stdin(prompt: &str) -> bool {
    eprint!("{prompt} [y/N] ");
    let _ = io::stderr().flush();
    let mut line = String::new();
    if io::stdin().lock().read_line(&mut line).is_err() {
        return false;
    }
    matches!(line.trim().to_lowercase().as_str(), "y" | "yes")
}

fn init_tracing() {
    let env_filter =
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into());

    let log_format = std::env::var("LOG_FORMAT").unwrap_or_default();
    match log_format.to_lowercase().as_str() {
        "gcp" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_stackdriver::layer().with_writer(io::stderr))
                .init();
        }
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_target(true)
                        .with_span_list(false)
                        .with_writer(io::stderr),
                )
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
                .init();
        }
    }
}
