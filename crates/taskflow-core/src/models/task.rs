use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} '{value}'")]
pub struct ParseEnumError {
    kind: &'static str,
    value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 3] = [
        TaskStatus::Pending,
        TaskStatus::InProgress,
        TaskStatus::Completed,
    ];

    /// Wire value used by the API and in query strings.
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Completed => "completed",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "Pending",
            TaskStatus::InProgress => "In Progress",
            TaskStatus::Completed => "Completed",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for TaskStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        TaskStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == normalized)
            .ok_or_else(|| ParseEnumError {
                kind: "status",
                value: s.to_string(),
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
}

impl TaskPriority {
    pub const ALL: [TaskPriority; 3] = [TaskPriority::Low, TaskPriority::Medium, TaskPriority::High];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Low => "low",
            TaskPriority::Medium => "medium",
            TaskPriority::High => "high",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TaskPriority::Low => "Low",
            TaskPriority::Medium => "Medium",
            TaskPriority::High => "High",
        }
    }
}

impl fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for TaskPriority {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        TaskPriority::ALL
            .into_iter()
            .find(|priority| priority.as_str() == normalized)
            .ok_or_else(|| ParseEnumError {
                kind: "priority",
                value: s.to_string(),
            })
    }
}

/// A reference to a user as embedded in task representations.
///
/// Depending on the serializer the backend uses this is a nested object, a
/// bare username, or a bare primary key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UserRef {
    Account {
        #[serde(default)]
        id: Option<i64>,
        #[serde(default)]
        username: String,
    },
    Username(String),
    Id(i64),
}

impl UserRef {
    pub fn display_name(&self) -> String {
        match self {
            UserRef::Account { username, .. } if !username.is_empty() => username.clone(),
            UserRef::Account { id: Some(id), .. } => format!("#{}", id),
            UserRef::Account { .. } => String::new(),
            UserRef::Username(name) => name.clone(),
            UserRef::Id(id) => format!("#{}", id),
        }
    }

    pub fn id(&self) -> Option<i64> {
        match self {
            UserRef::Account { id, .. } => *id,
            UserRef::Id(id) => Some(*id),
            UserRef::Username(_) => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub priority: TaskPriority,
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub completed_at: Option<String>,
    #[serde(default)]
    pub created_by: Option<UserRef>,
    #[serde(default)]
    pub assigned_to: Option<UserRef>,
    #[serde(default)]
    pub assigned_to_username: Option<String>,
    #[serde(default)]
    pub is_overdue: bool,
    #[serde(default)]
    pub days_until_due: Option<i64>,
}

impl Task {
    pub fn is_completed(&self) -> bool {
        self.status == TaskStatus::Completed
    }

    pub fn creator_name(&self) -> Option<String> {
        self.created_by.as_ref().map(UserRef::display_name)
    }

    /// Prefers the nested assignee, then the flattened username field.
    pub fn assignee_name(&self) -> Option<String> {
        self.assigned_to
            .as_ref()
            .map(UserRef::display_name)
            .or_else(|| self.assigned_to_username.clone())
    }

    /// Short due-date hint, e.g. "due in 3 days" or "overdue".
    pub fn due_hint(&self) -> Option<String> {
        if self.is_completed() {
            return None;
        }
        if self.is_overdue {
            return Some("overdue".to_string());
        }
        match self.days_until_due? {
            0 => Some("due today".to_string()),
            1 => Some("due tomorrow".to_string()),
            n if n > 1 => Some(format!("due in {} days", n)),
            _ => Some("overdue".to_string()),
        }
    }
}

/// Entry of the completed-task history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletedTask {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub priority: TaskPriority,
    #[serde(default)]
    pub completed_at: Option<String>,
    #[serde(default)]
    pub created_by: Option<UserRef>,
    #[serde(default)]
    pub due_date: Option<String>,
}

/// Body for creating or patching a task. Unset fields are not sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TaskPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<TaskPriority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_to_id: Option<i64>,
}

impl TaskPayload {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Filters and paging for the task list.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub search: Option<String>,
    pub ordering: Option<String>,
}

/// Page size used by the task list unless overridden.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Newest tasks first.
pub const DEFAULT_ORDERING: &str = "-created_at";

impl Default for TaskQuery {
    fn default() -> Self {
        Self {
            page: None,
            page_size: Some(DEFAULT_PAGE_SIZE),
            status: None,
            priority: None,
            search: None,
            ordering: Some(DEFAULT_ORDERING.to_string()),
        }
    }
}

impl TaskQuery {
    /// Query-string pairs, skipping unset and blank values.
    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        let mut push = |key: &str, value: Option<String>| {
            if let Some(value) = value.filter(|v| !v.trim().is_empty()) {
                pairs.push((key.to_string(), value));
            }
        };

        push("page", self.page.map(|p| p.to_string()));
        push("page_size", self.page_size.map(|s| s.to_string()));
        push("status", self.status.map(|s| s.as_str().to_string()));
        push("priority", self.priority.map(|p| p.as_str().to_string()));
        push("search", self.search.clone());
        push("ordering", self.ordering.clone());
        pairs
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskStatistics {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub pending: u64,
    #[serde(default)]
    pub in_progress: u64,
    #[serde(default)]
    pub completed: u64,
    #[serde(default)]
    pub overdue: u64,
    #[serde(default)]
    pub high_priority: u64,
}

impl TaskStatistics {
    /// Completed share of all tasks, in percent.
    pub fn completion_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.completed as f64 * 100.0 / self.total as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_task_with_nested_users() {
        let task: Task = serde_json::from_value(json!({
            "id": 3,
            "title": "Ship release",
            "description": "",
            "status": "in_progress",
            "priority": "high",
            "due_date": "2025-03-05T14:30:00Z",
            "created_by": {"id": 1, "username": "alice"},
            "assigned_to": {"id": 2, "username": "bob"},
            "is_overdue": false,
            "days_until_due": 2,
            "unknown_field": [1, 2]
        }))
        .unwrap();

        assert_eq!(task.status, TaskStatus::InProgress);
        assert_eq!(task.priority, TaskPriority::High);
        assert_eq!(task.creator_name().as_deref(), Some("alice"));
        assert_eq!(task.assignee_name().as_deref(), Some("bob"));
        assert_eq!(task.due_hint().as_deref(), Some("due in 2 days"));
    }

    #[test]
    fn test_task_with_flat_users() {
        let task: Task = serde_json::from_value(json!({
            "id": 4,
            "title": "Review",
            "status": "pending",
            "priority": "low",
            "created_by": "alice",
            "assigned_to": 9,
            "assigned_to_username": "carol",
            "is_overdue": true
        }))
        .unwrap();

        assert_eq!(task.creator_name().as_deref(), Some("alice"));
        assert_eq!(task.assigned_to.as_ref().and_then(UserRef::id), Some(9));
        assert_eq!(task.assignee_name().as_deref(), Some("#9"));
        assert_eq!(task.due_hint().as_deref(), Some("overdue"));
    }

    #[test]
    fn test_nested_user_without_username() {
        let task: Task = serde_json::from_value(json!({
            "id": 5,
            "title": "Triage inbox",
            "created_by": {"id": 1},
            "assigned_to": {"id": 2}
        }))
        .unwrap_or_else(|e| panic!("task should decode: {e}"));

        assert_eq!(task.created_by.as_ref().and_then(UserRef::id), Some(1));
        assert_eq!(task.creator_name().as_deref(), Some("#1"));
        assert_eq!(task.assignee_name().as_deref(), Some("#2"));
    }

    #[test]
    fn test_payload_skips_unset_fields() {
        let mut payload = TaskPayload::new("Write docs");
        payload.priority = Some(TaskPriority::High);
        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            json!({"title": "Write docs", "priority": "high"})
        );
        assert!(TaskPayload::default().is_empty());
        assert!(!payload.is_empty());
    }

    #[test]
    fn test_query_omits_blank_filters() {
        let query = TaskQuery {
            page: Some(2),
            status: Some(TaskStatus::InProgress),
            search: Some("   ".to_string()),
            ..TaskQuery::default()
        };
        assert_eq!(
            query.to_query_pairs(),
            vec![
                ("page".to_string(), "2".to_string()),
                ("page_size".to_string(), "10".to_string()),
                ("status".to_string(), "in_progress".to_string()),
                ("ordering".to_string(), "-created_at".to_string()),
            ]
        );
    }

    #[test]
    fn test_enum_parsing() {
        assert_eq!("in-progress".parse::<TaskStatus>(), Ok(TaskStatus::InProgress));
        assert_eq!("Completed".parse::<TaskStatus>(), Ok(TaskStatus::Completed));
        assert_eq!("HIGH".parse::<TaskPriority>(), Ok(TaskPriority::High));
        assert!("urgent".parse::<TaskPriority>().is_err());
    }

    #[test]
    fn test_completion_rate() {
        let stats = TaskStatistics {
            total: 8,
            completed: 2,
            ..TaskStatistics::default()
        };
        assert_eq!(stats.completion_rate(), 25.0);
        assert_eq!(TaskStatistics::default().completion_rate(), 0.0);
    }
}
