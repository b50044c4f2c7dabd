//! # TeamTask CLI
//!
//! Terminal surface for the TeamTask tracker. Every operation of the
//! system is a subcommand: setup/reset for the endpoint, register/login
//! for the session, list/show/create/advance for tasks, users and
//! approve/reject for admins, and watch for the polling loop.
//!
//! ## Usage
//!
//! ```bash
//! teamtask setup https://script.example/exec
//! teamtask register --name Ada --email ada@example.com
//! teamtask login --email ada@example.com
//! teamtask list
//! ```

mod app;
mod cli;
mod commands;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::app::App;
use crate::cli::{Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "teamtask_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let mut app = App::load()?;

    match cli.command {
        Command::Setup { url } => commands::setup(&mut app, url).await,
        Command::Reset { yes } => commands::reset(&mut app, yes).await,
        Command::Register { name, email, secret } => {
            commands::register(&mut app, name, email, secret).await
        }
        Command::Login { email, secret } => commands::login(&mut app, email, secret).await,
        Command::Logout => commands::logout(&mut app).await,
        Command::Whoami => commands::whoami(&app).await,
        Command::List {
            outbox,
            query,
            status,
        } => commands::list(&app, outbox, query, status).await,
        Command::Show { task } => commands::show(&app, task).await,
        Command::Create {
            title,
            description,
            to,
            due,
            priority,
        } => commands::create(&app, title, description, to, due, priority).await,
        Command::Advance { task } => commands::advance(&app, task).await,
        Command::Users { pending } => commands::users(&app, pending).await,
        Command::Approve { email } => commands::approve(&app, email).await,
        Command::Reject { email } => commands::reject(&app, email).await,
        Command::Watch => commands::watch(&app).await,
    }
}
