use clap::{Args, Parser, Subcommand};
use taskflow_core::models::{TaskPriority, TaskStatus};

#[derive(Debug, Parser)]
#[command(name = "taskflow", version, about = "Manage taskflow tasks from the terminal")]
pub struct Cli {
    /// API base URL (overrides config and TASKFLOW_API_URL)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Sign in and store the session
    Login(LoginArgs),
    /// Sign out and forget the stored session
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Work with tasks
    #[command(subcommand)]
    Tasks(TaskCommand),
    /// Statistics and overdue tasks
    Dashboard,
    /// Completed-task history
    Completed(CompletedArgs),
    /// Completion report from the server
    Report(ReportArgs),
}

#[derive(Debug, Args)]
pub struct LoginArgs {
    #[arg(short, long)]
    pub username: Option<String>,

    /// Prompted for when omitted
    #[arg(short, long, env = "TASKFLOW_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum TaskCommand {
    /// List tasks, newest first
    List(ListArgs),
    /// Show one task
    Show { id: i64 },
    /// Create a task
    Create(CreateArgs),
    /// Change fields of a task
    Update {
        id: i64,
        #[arg(long)]
        title: Option<String>,
        #[command(flatten)]
        fields: TaskFields,
    },
    /// Delete a task
    Delete { id: i64 },
    /// Mark a task as completed
    Complete { id: i64 },
    /// Assign several tasks to one user
    Assign {
        /// User id of the new assignee
        #[arg(long)]
        to: i64,
        #[arg(required = true)]
        ids: Vec<i64>,
    },
}

#[derive(Debug, Args)]
pub struct ListArgs {
    #[arg(long)]
    pub status: Option<TaskStatus>,
    #[arg(long)]
    pub priority: Option<TaskPriority>,
    #[arg(long)]
    pub search: Option<String>,
    /// Field to sort by; prefix with '-' for descending
    #[arg(long, allow_hyphen_values = true)]
    pub ordering: Option<String>,
    #[arg(long, default_value_t = 1)]
    pub page: u32,
    #[arg(long)]
    pub page_size: Option<u32>,
}

#[derive(Debug, Args)]
pub struct CreateArgs {
    #[arg(long)]
    pub title: String,
    #[command(flatten)]
    pub fields: TaskFields,
}

#[derive(Debug, Args)]
pub struct TaskFields {
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long)]
    pub priority: Option<TaskPriority>,
    #[arg(long)]
    pub status: Option<TaskStatus>,
    /// Due date, e.g. 2025-03-05 or 2025-03-05T17:00
    #[arg(long)]
    pub due: Option<String>,
    /// User id of the assignee
    #[arg(long)]
    pub assign: Option<i64>,
}

#[derive(Debug, Args)]
pub struct CompletedArgs {
    /// Only tasks completed in the last N days (7 when no value is given)
    #[arg(long, value_name = "DAYS")]
    pub recent: Option<Option<u32>>,
}

#[derive(Debug, Args)]
pub struct ReportArgs {
    /// Reporting window in days (default 30)
    #[arg(long)]
    pub days: Option<u32>,
}
