//! Command handlers
//!
//! Interactive commands surface errors to the terminal and leave the
//! user free to retry; background behavior (polling, read receipts)
//! logs and continues, exactly as the engine does.

use std::io::{self, Write as _};
use std::sync::Arc;

use anyhow::{bail, Context};
use chrono::{NaiveDate, TimeZone, Utc};
use teamtask_client::notify::{Notifier, NotifyError};
use teamtask_client::status::{advance_target, AdvanceError, ReadReceipts};
use teamtask_client::store::RecordStore;
use teamtask_client::sync::{SyncCommand, SyncConfig, TaskSnapshot, TaskSynchronizer};
use teamtask_client::views::{filtered, open_count, stats, view_set, TaskFilter, ViewMode};
use teamtask_shared::models::{CreateTask, Task, User, UserRole};
use validator::Validate;

use crate::app::App;
use crate::cli::{PriorityArg, StatusArg};

/// Notifier that prints to the terminal (used by `watch`)
struct TerminalNotifier;

#[async_trait::async_trait]
impl Notifier for TerminalNotifier {
    async fn notify(&self, title: &str, body: &str) -> Result<(), NotifyError> {
        println!("[{}] {}", title, body);
        Ok(())
    }
}

/// Verifies and stores the endpoint URL
pub async fn setup(app: &mut App, url: String) -> anyhow::Result<()> {
    let store = teamtask_client::store::SheetStore::new(url.clone());
    store.probe().await?;
    app.local.set_endpoint(url)?;
    println!("Endpoint verified and saved.");
    Ok(())
}

/// Clears the stored endpoint after confirmation
pub async fn reset(app: &mut App, yes: bool) -> anyhow::Result<()> {
    if !yes && !confirm("Reset the connection settings? This also logs you out.")? {
        println!("Aborted.");
        return Ok(());
    }

    app.local.clear_endpoint()?;
    app.local.clear_current_user()?;

    if app.config.default_endpoint.is_some() {
        println!("Stored endpoint cleared; the TEAMTASK_ENDPOINT default is still in effect.");
    } else {
        println!("Stored endpoint cleared; run `teamtask setup <url>` before the next command.");
    }
    Ok(())
}

/// Registers a new account
pub async fn register(
    app: &mut App,
    name: String,
    email: String,
    secret: Option<String>,
) -> anyhow::Result<()> {
    let gate = app.gate()?;
    let secret = resolve_secret(secret, "Choose a login secret: ")?;

    let user = gate
        .register(teamtask_shared::models::RegisterUser { name, email, secret })
        .await?;

    match user.role {
        UserRole::Admin => println!("Welcome, {}! You are the first user and now the active admin.", user.name),
        UserRole::Member => println!(
            "Registration received, {}. An admin must approve your account before you can log in.",
            user.name
        ),
    }
    Ok(())
}

/// Logs in and persists the session
pub async fn login(app: &mut App, email: String, secret: Option<String>) -> anyhow::Result<()> {
    let gate = app.gate()?;
    let secret = resolve_secret(secret, "Login secret: ")?;

    match gate.login(&email, &secret).await? {
        Some(user) => {
            println!("Logged in as {} ({}).", user.name, user.role.as_str());
            app.local.set_current_user(user)?;
            Ok(())
        }
        None => bail!("email or secret is incorrect"),
    }
}

/// Clears the persisted session
pub async fn logout(app: &mut App) -> anyhow::Result<()> {
    app.local.clear_current_user()?;
    println!("Logged out.");
    Ok(())
}

/// Shows the current session
pub async fn whoami(app: &App) -> anyhow::Result<()> {
    let user = app.current_user()?;
    println!("{} <{}>", user.name, user.email);
    println!("role: {} · status: {}", user.role.as_str(), user.status.label());
    Ok(())
}

/// Lists tasks in the inbox or outbox
pub async fn list(
    app: &App,
    outbox: bool,
    query: String,
    status: Option<StatusArg>,
) -> anyhow::Result<()> {
    let user = app.current_user()?;
    let store = app.store()?;
    let (mut sync, _handle) = TaskSynchronizer::new(
        store.clone(),
        Arc::new(teamtask_client::notify::LogNotifier::new()),
        user.id,
    );
    let snapshot = sync.refresh().await?;

    let mode = if outbox { ViewMode::Outbox } else { ViewMode::Inbox };
    let view = view_set(&snapshot, &user, mode);
    let s = stats(&view);
    println!(
        "{} · {} task(s) ({} pending, {} in progress, {} done) · {}% complete",
        if outbox { "outbox" } else { "inbox" },
        s.total(),
        s.pending,
        s.in_progress,
        s.done,
        s.completion_rate(),
    );

    let hits = filtered(
        &view,
        &TaskFilter {
            query,
            status: status.map(Into::into),
        },
    );

    if hits.is_empty() {
        println!("No tasks match.");
    } else {
        let today = Utc::now().date_naive();
        for task in &hits {
            println!("{}", format_line(task, &user, today));
        }
    }

    // Rendering the inbox is the natural read-receipt trigger.
    if mode == ViewMode::Inbox {
        let mut receipts = ReadReceipts::new();
        for task in &hits {
            receipts.mark_read(store.as_ref(), task, user.id).await;
        }
    }

    Ok(())
}

/// Shows one task in full and records the read receipt
pub async fn show(app: &App, needle: String) -> anyhow::Result<()> {
    let user = app.current_user()?;
    let store = app.store()?;
    let (mut sync, _handle) = TaskSynchronizer::new(
        store.clone(),
        Arc::new(teamtask_client::notify::LogNotifier::new()),
        user.id,
    );
    let snapshot = sync.refresh().await?;
    let task = find_task(&snapshot, &user, &needle)?;

    let today = Utc::now().date_naive();
    println!("{}", task.title);
    println!("id:        {}", task.id);
    println!(
        "status:    {}{}",
        task.status.label(),
        if task.is_overdue(today) { " (overdue)" } else { "" }
    );
    println!("priority:  {}", task.priority.label());
    println!("due:       {}", task.due_date);
    println!("from:      {}", task.created_by_name);
    println!("to:        {} assignee(s)", task.assigned_to.len());
    println!(
        "seen:      {}",
        if task.seen_by_any_assignee() { "yes" } else { "not yet" }
    );
    println!("created:   {}", format_millis(task.created_at));
    println!();
    println!("{}", task.description);

    if task.is_assigned_to(user.id) {
        if let Some(action) = task.status.next_action_label() {
            println!();
            println!("next step: teamtask advance {}  ({})", short_id(&task), action);
        }
        let mut receipts = ReadReceipts::new();
        receipts.mark_read(store.as_ref(), &task, user.id).await;
    }

    Ok(())
}

/// Creates a task assigned to teammates resolved by email
pub async fn create(
    app: &App,
    title: String,
    description: String,
    to: Vec<String>,
    due: NaiveDate,
    priority: PriorityArg,
) -> anyhow::Result<()> {
    let user = app.current_user()?;
    let store = app.store()?;
    let gate = app.gate()?;

    // Only active, non-self users are assignable.
    let assignable = gate.assignable_users(&user).await?;
    let mut assigned_to = Vec::with_capacity(to.len());
    for email in &to {
        match assignable.iter().find(|u| &u.email == email) {
            Some(teammate) => assigned_to.push(teammate.id),
            None => bail!(
                "{} is not an assignable teammate (must be active and not yourself)",
                email
            ),
        }
    }

    let data = CreateTask {
        title,
        description,
        assigned_to,
        due_date: due,
        priority: priority.into(),
    };
    data.validate()?;

    let task = Task::new(&user, data);
    store.create_task(&task).await?;
    println!("Created task \"{}\" ({}).", task.title, short_id(&task));
    Ok(())
}

/// Advances a task one step through its lifecycle
pub async fn advance(app: &App, needle: String) -> anyhow::Result<()> {
    let user = app.current_user()?;
    let store = app.store()?;
    let (mut sync, _handle) = TaskSynchronizer::new(
        store.clone(),
        Arc::new(teamtask_client::notify::LogNotifier::new()),
        user.id,
    );
    let snapshot = sync.refresh().await?;
    let task = find_task(&snapshot, &user, &needle)?;

    match advance_target(&task, user.id) {
        Ok(target) => {
            sync.apply(SyncCommand::Advance {
                task_id: task.id,
                status: target,
            })
            .await;
            println!(
                "\"{}\": {} -> {}",
                task.title,
                task.status.label(),
                target.label()
            );
            Ok(())
        }
        Err(AdvanceError::AlreadyDone) => {
            println!("\"{}\" is already done; nothing to do.", task.title);
            Ok(())
        }
        Err(e @ AdvanceError::NotAssignee) => Err(e.into()),
    }
}

/// Lists teammates, or pending registrations for admins
pub async fn users(app: &App, pending: bool) -> anyhow::Result<()> {
    let gate = app.gate()?;

    if pending {
        app.current_admin()?;
        let pending_users = gate.pending_users().await?;
        if pending_users.is_empty() {
            println!("No registrations waiting for approval.");
            return Ok(());
        }
        println!("{} registration(s) waiting for approval:", pending_users.len());
        for user in pending_users {
            println!(
                "  {} <{}> · registered {}",
                user.name,
                user.email,
                format_millis(user.created_at)
            );
        }
    } else {
        let user = app.current_user()?;
        let teammates = gate.assignable_users(&user).await?;
        if teammates.is_empty() {
            println!("No assignable teammates yet.");
            return Ok(());
        }
        for teammate in teammates {
            println!("  {} <{}> ({})", teammate.name, teammate.email, teammate.role.as_str());
        }
    }
    Ok(())
}

/// Approves a pending registration
pub async fn approve(app: &App, email: String) -> anyhow::Result<()> {
    decide(app, email, true).await
}

/// Rejects a pending registration
pub async fn reject(app: &App, email: String) -> anyhow::Result<()> {
    decide(app, email, false).await
}

async fn decide(app: &App, email: String, approve: bool) -> anyhow::Result<()> {
    app.current_admin()?;
    let gate = app.gate()?;

    let pending = gate.pending_users().await?;
    let user = pending
        .iter()
        .find(|u| u.email == email)
        .with_context(|| format!("no pending registration for {}", email))?;

    if approve {
        gate.approve(user).await?;
        println!("{} approved.", user.name);
    } else {
        gate.reject(user).await?;
        println!("{} rejected.", user.name);
    }
    Ok(())
}

/// Polls for updates and prints notifications until interrupted
pub async fn watch(app: &App) -> anyhow::Result<()> {
    let user = app.current_user()?;
    let store = app.store()?;

    let (sync, handle) = TaskSynchronizer::with_config(
        store.clone(),
        Arc::new(TerminalNotifier),
        user.id,
        SyncConfig {
            poll_interval: app.config.poll_interval(),
        },
    );
    let join = tokio::spawn(sync.run());

    println!(
        "Watching for updates every {}ms; press Ctrl-C to stop.",
        app.config.poll_interval_ms
    );

    let mut receipts = ReadReceipts::new();
    let mut rx = handle.subscribe();
    let mut last_printed: Option<(usize, usize)> = None;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot: TaskSnapshot = rx.borrow_and_update().clone();
                let open = open_count(&snapshot, user.id);
                // Overlay-only publishes keep the counts; stay quiet then.
                if last_printed != Some((snapshot.len(), open)) {
                    println!("{} task(s) in store · {} open in your inbox", snapshot.len(), open);
                    last_printed = Some((snapshot.len(), open));
                }

                // Observing the inbox is the natural read-receipt trigger.
                let inbox: Vec<Task> = snapshot
                    .iter()
                    .filter(|t| t.is_assigned_to(user.id))
                    .cloned()
                    .collect();
                for task in &inbox {
                    if receipts.mark_read(store.as_ref(), task, user.id).await {
                        handle.mark_read(task.id, user.id);
                    }
                }
            }
        }
    }

    handle.shutdown();
    join.await?;
    println!("Stopped.");
    Ok(())
}

/// Resolves the secret from the flag or an interactive prompt
fn resolve_secret(provided: Option<String>, prompt: &str) -> anyhow::Result<String> {
    if let Some(secret) = provided {
        return Ok(secret);
    }

    eprint!("{}", prompt);
    io::stderr().flush().ok();
    let mut line = String::new();
    io::stdin()
        .read_line(&mut line)
        .context("could not read the secret from stdin")?;
    let secret = line.trim().to_string();
    if secret.is_empty() {
        bail!("a secret is required");
    }
    Ok(secret)
}

/// Asks a yes/no question; anything but y/yes is a no
fn confirm(question: &str) -> anyhow::Result<bool> {
    eprint!("{} [y/N] ", question);
    io::stderr().flush().ok();
    let mut line = String::new();
    io::stdin()
        .read_line(&mut line)
        .context("could not read the confirmation from stdin")?;
    let answer = line.trim().to_lowercase();
    Ok(answer == "y" || answer == "yes")
}

/// Finds a task the user is involved in by id or id prefix
fn find_task(snapshot: &[Task], user: &User, needle: &str) -> anyhow::Result<Task> {
    let needle = needle.to_lowercase();
    let mut matches = snapshot.iter().filter(|t| {
        (t.is_assigned_to(user.id) || t.created_by == user.id)
            && t.id.to_string().starts_with(&needle)
    });

    match (matches.next(), matches.next()) {
        (Some(task), None) => Ok(task.clone()),
        (Some(_), Some(_)) => bail!("task id prefix {:?} is ambiguous", needle),
        (None, _) => bail!("no task of yours matches {:?}", needle),
    }
}

/// One list row: short id, status, priority, due date, title, provenance
fn format_line(task: &Task, me: &User, today: NaiveDate) -> String {
    let overdue = if task.is_overdue(today) { " (overdue)" } else { "" };

    let provenance = if task.created_by == me.id {
        let seen = if task.status.is_terminal() {
            String::new()
        } else if task.seen_by_any_assignee() {
            " [seen]".to_string()
        } else {
            " [delivered]".to_string()
        };
        format!("to {} assignee(s){}", task.assigned_to.len(), seen)
    } else {
        let unread = if task.is_read_by(me.id) { "" } else { " [new]" };
        format!("from {}{}", task.created_by_name, unread)
    };

    format!(
        "{}  {:<11}  {:<6}  {}{}  {}  · {}",
        short_id(task),
        task.status.label(),
        task.priority.label(),
        task.due_date,
        overdue,
        task.title,
        provenance,
    )
}

/// First segment of the task id, enough to address it on this team
fn short_id(task: &Task) -> String {
    task.id.to_string()[..8].to_string()
}

/// Renders an epoch-millis timestamp for display
fn format_millis(millis: i64) -> String {
    match Utc.timestamp_millis_opt(millis).single() {
        Some(dt) => dt.format("%Y-%m-%d %H:%M").to_string(),
        None => millis.to_string(),
    }
}
