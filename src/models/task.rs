use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Task statuses are a closed set; anything else is rejected at the serde
/// boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Todo,
    InProgress,
    Done,
}

impl Default for TaskStatus {
    fn default() -> Self {
        TaskStatus::Todo
    }
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "todo",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Done => "done",
        }
    }

    /// Parses the wire/query form. Unknown values return `None` so callers
    /// decide whether to reject or fall back.
    pub fn parse(value: &str) -> Option<TaskStatus> {
        match value {
            "todo" => Some(TaskStatus::Todo),
            "in_progress" => Some(TaskStatus::InProgress),
            "done" => Some(TaskStatus::Done),
            _ => None,
        }
    }
}

/// A task row. `owner_id` is set server-side from the session and is never
/// read from a client payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    #[serde(rename = "_id")]
    pub task_id: String,
    pub owner_id: String,
    pub title: String,
    pub description: Option<String>,
    pub due_date: NaiveDate,
    pub status: TaskStatus,
    pub created_at: DateTime<Utc>,
}

/// Request payload for creating a task. Unknown fields (including any
/// attempt to supply an owner) are dropped by serde.
#[derive(Debug, Deserialize)]
pub struct CreateTaskRequest {
    pub title: String,
    pub description: Option<String>,
    pub due_date: NaiveDate,
    #[serde(default)]
    pub status: TaskStatus,
}

/// Request payload for a partial task update.
#[derive(Debug, Deserialize)]
pub struct UpdateTaskRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub status: Option<TaskStatus>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_wire_form() {
        for status in [TaskStatus::Todo, TaskStatus::InProgress, TaskStatus::Done] {
            assert_eq!(TaskStatus::parse(status.as_str()), Some(status));
        }
    }

    #[test]
    fn status_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&TaskStatus::InProgress).unwrap(),
            "\"in_progress\""
        );
    }

    #[test]
    fn unknown_status_is_rejected() {
        assert_eq!(TaskStatus::parse("blocked"), None);
        assert!(serde_json::from_str::<TaskStatus>("\"blocked\"").is_err());
    }

    #[test]
    fn create_request_defaults_status_to_todo() {
        let request: CreateTaskRequest =
            serde_json::from_str(r#"{"title":"x","due_date":"2025-01-01"}"#).unwrap();
        assert_eq!(request.status, TaskStatus::Todo);
        assert_eq!(request.description, None);
    }

    #[test]
    fn create_request_drops_client_supplied_owner() {
        let request: CreateTaskRequest = serde_json::from_str(
            r#"{"title":"x","due_date":"2025-01-01","status":"done","owner_id":"intruder"}"#,
        )
        .unwrap();
        assert_eq!(request.status, TaskStatus::Done);
    }

    #[test]
    fn task_serializes_id_as_underscore_id() {
        let task = Task {
            task_id: "t-1".to_string(),
            owner_id: "u-1".to_string(),
            title: "Write report".to_string(),
            description: None,
            due_date: NaiveDate::from_ymd_opt(2025, 1, 15).unwrap(),
            status: TaskStatus::Todo,
            created_at: Utc::now(),
        };
        let json: serde_json::Value = serde_json::to_value(&task).unwrap();
        assert_eq!(json["_id"], "t-1");
        assert_eq!(json["due_date"], "2025-01-15");
        assert!(json["description"].is_null());
    }
}
