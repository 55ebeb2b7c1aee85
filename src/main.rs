//! Koimeret - command-line front end for the farm management API.

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::error;

use koimeret::api::RecordId;
use koimeret::app::{App, Page};
use koimeret::config::Config;
use koimeret::context::{AppContext, RecordingNavigator};
use koimeret::error::AppError;
use koimeret::logging;
use koimeret::notification::NotificationType;
use koimeret::views::{AlertFilter, TaskAction};

#[derive(Parser)]
#[command(name = "koimeret")]
#[command(about = "Koimeret Dairies farm management", long_about = None)]
#[command(version)]
struct Cli {
    /// Override the API base URL for this run
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in with a phone number and password
    Login {
        #[arg(long, env = "KOIMERET_PHONE")]
        phone: String,
        #[arg(long, env = "KOIMERET_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Log out and forget the stored credential
    Logout,
    /// Show the logged-in user
    Whoami,
    /// Show the dashboard summary
    Dashboard {
        /// Show the worker dashboard instead of the owner dashboard
        #[arg(long)]
        worker: bool,
    },
    /// List cows
    Cows {
        /// Only cows with this status (e.g. milking, dry, sick)
        #[arg(long)]
        status: Option<String>,
    },
    /// Alerts
    Alerts {
        #[command(subcommand)]
        action: AlertsAction,
    },
    /// Worker tasks
    Tasks {
        #[command(subcommand)]
        action: TasksAction,
    },
    /// List buyers, sales and payments
    Sales {
        /// Only sales with this payment status (unpaid, partial, paid)
        #[arg(long)]
        payment_status: Option<String>,
    },
    /// List feed items and purchases
    Feeds {
        /// Only show items below minimum stock
        #[arg(long)]
        low: bool,
    },
    /// List health events
    Health {
        /// Only show unresolved events
        #[arg(long)]
        active: bool,
    },
}

#[derive(Subcommand)]
enum AlertsAction {
    /// List alerts
    List {
        #[arg(long = "type")]
        alert_type: Option<String>,
        #[arg(long)]
        severity: Option<String>,
    },
    /// Mark one alert as read
    Read { id: RecordId },
    /// Mark every alert as read
    ReadAll,
    /// Resolve an alert
    Resolve {
        id: RecordId,
        #[arg(long)]
        note: Option<String>,
    },
}

#[derive(Subcommand)]
enum TasksAction {
    /// Today's tasks for the logged-in worker
    Today,
    /// Mark a task as done
    Complete {
        id: RecordId,
        #[arg(long)]
        comment: Option<String>,
    },
    /// Skip a task
    Skip {
        id: RecordId,
        #[arg(long)]
        reason: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logging failures are not fatal; the command still runs.
    if let Err(e) = logging::init() {
        eprintln!("Warning: failed to initialize logging: {}", e);
    }

    let mut config = Config::load().map_err(AppError::from).map_err(report)?;
    if let Some(url) = cli.api_url {
        config.settings.api_url = url;
    }

    // The CLI has no screens; a redirect to login surfaces as an error hint.
    let ctx = AppContext::from_settings(config.settings, Arc::new(RecordingNavigator::new()))
        .map_err(report)?;
    let mut app = App::new(ctx);

    run(&mut app, cli.command).await
}

async fn run(app: &mut App, command: Commands) -> Result<()> {
    match command {
        Commands::Login { phone, password } => {
            let user = app.login(&phone, &password).await.map_err(api_failure)?;
            println!("Logged in as {}", user.display_name());
        }
        Commands::Logout => {
            let outcome = app.logout().await;
            if outcome.is_confirmed() {
                println!("Logged out");
            } else {
                println!("Logged out locally (server could not be reached)");
            }
        }
        Commands::Whoami => {
            let ctx = app.context();
            let user = ctx
                .guard(ctx.client().current_user().await)
                .map_err(api_failure)?;
            print_json(&user)?;
        }
        Commands::Dashboard { worker } => {
            let ctx = app.context();
            let client = ctx.client();
            let summary = if worker {
                client.worker_dashboard().await
            } else {
                client.owner_dashboard().await
            };
            print_json(&ctx.guard(summary).map_err(api_failure)?)?;
        }
        Commands::Cows { status } => {
            app.open(Page::Cows);
            settle(app).await?;
            if app.set_cow_status_filter(status) {
                settle(app).await?;
            }
            if let Some(view) = app.cows_view() {
                print_json(view.cows())?;
            }
        }
        Commands::Alerts { action } => run_alerts(app, action).await?,
        Commands::Tasks { action } => run_tasks(app, action).await?,
        Commands::Sales { payment_status } => {
            app.open(Page::Sales);
            settle(app).await?;
            if app.set_payment_status_filter(payment_status) {
                settle(app).await?;
            }
            if let Some(view) = app.sales_view() {
                print_json(&serde_json::json!({
                    "buyers": view.buyers(),
                    "sales": view.sales(),
                    "payments": view.payments(),
                    "total_revenue": view.total_revenue(),
                    "total_outstanding": view.total_outstanding(),
                }))?;
            }
        }
        Commands::Health { active } => {
            app.open(Page::Health);
            settle(app).await?;
            if let Some(view) = app.health_view() {
                if active {
                    print_json(view.active())?;
                } else {
                    print_json(view.events())?;
                }
            }
        }
        Commands::Feeds { low } => {
            app.open(Page::Feeds);
            settle(app).await?;
            if let Some(view) = app.feeds_view() {
                if low {
                    print_json(&view.low_stock().collect::<Vec<_>>())?;
                } else {
                    print_json(&serde_json::json!({
                        "items": view.items(),
                        "purchases": view.purchases(),
                    }))?;
                }
            }
        }
    }
    Ok(())
}

async fn run_alerts(app: &mut App, action: AlertsAction) -> Result<()> {
    app.open(Page::Alerts);
    settle(app).await?;

    match action {
        AlertsAction::List {
            alert_type,
            severity,
        } => {
            app.set_alert_filter(AlertFilter {
                alert_type,
                severity,
            });
        }
        AlertsAction::Read { id } => {
            app.mark_alert_read(id);
        }
        AlertsAction::ReadAll => {
            app.mark_all_alerts_read();
        }
        AlertsAction::Resolve { id, note } => {
            app.resolve_alert(id, note);
        }
    }
    settle(app).await?;

    if let Some(view) = app.alerts_view() {
        print_json(view.alerts())?;
    }
    Ok(())
}

async fn run_tasks(app: &mut App, action: TasksAction) -> Result<()> {
    app.open(Page::Tasks);
    settle(app).await?;

    match action {
        TasksAction::Today => {}
        TasksAction::Complete { id, comment } => {
            app.update_task(id, TaskAction::Complete { comment });
        }
        TasksAction::Skip { id, reason } => {
            app.update_task(id, TaskAction::Skip { reason });
        }
    }
    settle(app).await?;

    if let Some(view) = app.tasks_view() {
        print_json(view.tasks())?;
    }
    Ok(())
}

/// Wait for in-flight work, print notifications, and fail on the first error.
async fn settle(app: &mut App) -> Result<()> {
    app.settle().await;

    let mut failure = None;
    for notification in app.notifications_mut().drain() {
        match notification.kind {
            NotificationType::Error => {
                failure.get_or_insert(notification.message);
            }
            kind => eprintln!("{} {}", kind.icon(), notification.message),
        }
    }

    match failure {
        Some(message) if app.context().session().credential().is_none() => {
            bail!("{}\nRun 'koimeret login' to sign in again.", message)
        }
        Some(message) => bail!(message),
        None => Ok(()),
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("Failed to format output")?;
    println!("{}", text);
    Ok(())
}

fn api_failure(e: koimeret::api::ApiError) -> anyhow::Error {
    report(AppError::from(e))
}

fn report(e: AppError) -> anyhow::Error {
    error!(error = %e, "Command failed");
    match e.suggested_action() {
        Some(action) => anyhow::anyhow!("{}\n{}", e.user_message(), action),
        None => anyhow::anyhow!(e.user_message()),
    }
}
