//! Command handlers. Each one talks to the API through `ApiClient` and prints
//! plain-text results to stdout.

use std::io::{self, Write};

use anyhow::{bail, Context, Result};
use taskflow_core::api::client::DEFAULT_RECENT_DAYS;
use taskflow_core::models::{CompletedTask, Task, TaskPayload, TaskQuery};
use taskflow_core::utils::format::{parse_timestamp, EMPTY_VALUE};
use taskflow_core::utils::{format_date, format_datetime, truncate_string};
use taskflow_core::{ApiClient, Config};
use tracing::debug;

use crate::cli::{
    Command, CompletedArgs, CreateArgs, ListArgs, LoginArgs, ReportArgs, TaskCommand, TaskFields,
};

/// Width of the title column in task tables
const TITLE_WIDTH: usize = 40;

pub async fn run(command: Command, client: &ApiClient, config: &mut Config) -> Result<()> {
    match command {
        Command::Login(args) => login(args, client, config).await,
        Command::Logout => {
            client.logout();
            println!("Signed out.");
            Ok(())
        }
        Command::Whoami => {
            whoami(client);
            Ok(())
        }
        Command::Tasks(command) => {
            require_login(client)?;
            tasks(command, client).await
        }
        Command::Dashboard => {
            require_login(client)?;
            dashboard(client).await
        }
        Command::Completed(args) => {
            require_login(client)?;
            completed(args, client).await
        }
        Command::Report(args) => {
            require_login(client)?;
            report(args, client).await
        }
    }
}

fn require_login(client: &ApiClient) -> Result<()> {
    if !client.is_authenticated() {
        bail!("Not signed in. Run `taskflow login` first.");
    }
    Ok(())
}

async fn login(args: LoginArgs, client: &ApiClient, config: &mut Config) -> Result<()> {
    let username = match args.username.or_else(|| config.last_username.clone()) {
        Some(username) => username,
        None => prompt("Username: ")?,
    };
    let password = match args.password {
        Some(password) => password,
        None => rpassword::prompt_password("Password: ").context("Failed to read password")?,
    };

    let session = client.login(&username, &password).await?;

    config.last_username = Some(username.clone());
    if let Err(e) = config.save() {
        debug!(error = %e, "Failed to remember username");
    }

    let who = session.user.map(|u| u.username).unwrap_or(username);
    println!("Signed in as {}.", who);
    Ok(())
}

fn prompt(label: &str) -> Result<String> {
    print!("{}", label);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin()
        .read_line(&mut line)
        .context("Failed to read from stdin")?;
    let value = line.trim().to_string();
    if value.is_empty() {
        bail!("A username is required");
    }
    Ok(value)
}

fn whoami(client: &ApiClient) {
    match client.auth().user() {
        Some(user) if client.is_authenticated() => match user.id {
            Some(id) => println!("{} (id {})", user.username, id),
            None => println!("{}", user.username),
        },
        _ if client.is_authenticated() => println!("Signed in."),
        _ => println!("Not signed in."),
    }
}

async fn tasks(command: TaskCommand, client: &ApiClient) -> Result<()> {
    match command {
        TaskCommand::List(args) => list_tasks(args, client).await,
        TaskCommand::Show { id } => {
            let task = client.get_task(id).await?;
            print_task_detail(&task);
            Ok(())
        }
        TaskCommand::Create(args) => create_task(args, client).await,
        TaskCommand::Update { id, title, fields } => {
            let mut payload = payload_from(fields)?;
            payload.title = title;
            if payload.is_empty() {
                bail!("Nothing to update. Pass at least one field to change.");
            }
            let task = client.update_task(id, &payload).await?;
            println!("Updated task #{}.", task.id);
            print_task_detail(&task);
            Ok(())
        }
        TaskCommand::Delete { id } => {
            client.delete_task(id).await?;
            println!("Deleted task #{}.", id);
            Ok(())
        }
        TaskCommand::Complete { id } => {
            let task = client.complete_task(id).await?;
            println!(
                "Completed task #{} at {}.",
                task.id,
                format_datetime(task.completed_at.as_deref())
            );
            Ok(())
        }
        TaskCommand::Assign { to, ids } => {
            let result = client.bulk_assign(&ids, to).await?;
            println!("Assigned {} task(s) to user {}.", ids.len(), to);
            debug!(%result, "Bulk assign response");
            Ok(())
        }
    }
}

async fn list_tasks(args: ListArgs, client: &ApiClient) -> Result<()> {
    let defaults = TaskQuery::default();
    let query = TaskQuery {
        page: Some(args.page.max(1)),
        page_size: args.page_size.or(defaults.page_size),
        status: args.status,
        priority: args.priority,
        search: args.search,
        ordering: args.ordering.or(defaults.ordering),
    };

    let page = client.list_tasks(&query).await?;
    let page_size = query.page_size.unwrap_or(1);
    println!(
        "{} task{} total (page {} of {})",
        page.count,
        if page.count == 1 { "" } else { "s" },
        args.page.max(1),
        page.total_pages(page_size)
    );
    for task in &page.results {
        print_task_row(task);
    }
    Ok(())
}

async fn create_task(args: CreateArgs, client: &ApiClient) -> Result<()> {
    let mut payload = payload_from(args.fields)?;
    payload.title = Some(args.title);
    let task = client.create_task(&payload).await?;
    println!("Created task #{}.", task.id);
    print_task_detail(&task);
    Ok(())
}

fn payload_from(fields: TaskFields) -> Result<TaskPayload> {
    let due_date = match fields.due {
        Some(raw) => {
            let parsed = parse_timestamp(&raw)
                .with_context(|| format!("Unrecognized due date '{}'", raw))?;
            Some(parsed.format("%Y-%m-%dT%H:%M:%S").to_string())
        }
        None => None,
    };

    Ok(TaskPayload {
        title: None,
        description: fields.description,
        priority: fields.priority,
        status: fields.status,
        due_date,
        assigned_to_id: fields.assign,
    })
}

async fn dashboard(client: &ApiClient) -> Result<()> {
    let (stats, overdue) = futures::try_join!(client.statistics(), client.overdue_tasks())?;

    println!("Total        {:>5}", stats.total);
    println!("Pending      {:>5}", stats.pending);
    println!("In Progress  {:>5}", stats.in_progress);
    println!("Completed    {:>5}  ({:.0}%)", stats.completed, stats.completion_rate());
    println!("Overdue      {:>5}", stats.overdue);
    println!("High priority{:>5}", stats.high_priority);

    if !overdue.is_empty() {
        println!();
        println!("Overdue:");
        for task in &overdue {
            print_task_row(task);
        }
    }
    Ok(())
}

async fn completed(args: CompletedArgs, client: &ApiClient) -> Result<()> {
    let (tasks, empty_message) = match args.recent {
        Some(days) => {
            let days = days.unwrap_or(DEFAULT_RECENT_DAYS);
            (
                client.recent_completed(Some(days)).await?,
                format!("No tasks completed in the last {} days.", days),
            )
        }
        None => (
            client.completed_tasks().await?,
            "No completed tasks yet.".to_string(),
        ),
    };

    if tasks.is_empty() {
        println!("{}", empty_message);
        return Ok(());
    }
    for task in &tasks {
        print_completed_row(task);
    }
    Ok(())
}

async fn report(args: ReportArgs, client: &ApiClient) -> Result<()> {
    let report = client.completion_report(args.days).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn print_task_row(task: &Task) {
    let due = task
        .due_hint()
        .map(|hint| format!("{} ({})", format_date(task.due_date.as_deref()), hint))
        .unwrap_or_else(|| format_date(task.due_date.as_deref()));
    println!(
        "#{:<5} {:<12} {:<7} {:<width$} {}",
        task.id,
        task.status.label(),
        task.priority.label(),
        truncate_string(&task.title, TITLE_WIDTH),
        due,
        width = TITLE_WIDTH
    );
}

fn print_task_detail(task: &Task) {
    println!("#{} {}", task.id, task.title);
    if let Some(description) = task.description.as_deref().filter(|d| !d.is_empty()) {
        println!("  {}", description);
    }
    println!("  Status:      {}", task.status.label());
    println!("  Priority:    {}", task.priority.label());
    println!("  Due:         {}", format_date(task.due_date.as_deref()));
    println!(
        "  Created by:  {}",
        task.creator_name().unwrap_or_else(|| EMPTY_VALUE.to_string())
    );
    println!(
        "  Assigned to: {}",
        task.assignee_name().unwrap_or_else(|| EMPTY_VALUE.to_string())
    );
    println!("  Created:     {}", format_datetime(task.created_at.as_deref()));
    if task.completed_at.is_some() {
        println!("  Completed:   {}", format_datetime(task.completed_at.as_deref()));
    }
}

fn print_completed_row(task: &CompletedTask) {
    println!(
        "#{:<5} {:<7} {:<width$} done {}  by {}",
        task.id,
        task.priority.label(),
        truncate_string(&task.title, TITLE_WIDTH),
        format_datetime(task.completed_at.as_deref()),
        task.created_by
            .as_ref()
            .map(|u| u.display_name())
            .unwrap_or_else(|| EMPTY_VALUE.to_string()),
        width = TITLE_WIDTH
    );
}
