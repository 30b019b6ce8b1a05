//! Core types for todo-api

use chrono::{DateTime, SubsecRound, Utc};
use mongodb::bson::oid::ObjectId;
use mongodb::bson::serde_helpers::serialize_object_id_as_hex_string;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Todo ID type
pub type TodoId = ObjectId;

/// Value stored in `completed` when the client does not provide one
pub const DEFAULT_COMPLETED: &str = "false";

/// Message returned when a todo is created without a task
pub const TASK_REQUIRED: &str = "Todo validation failed: task: Path `task` is required.";

/// A stored todo item, as returned over the API
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    #[serde(serialize_with = "serialize_object_id_as_hex_string")]
    pub id: TodoId,
    pub task: String,
    /// Free text; conventionally `"true"` or `"false"`.
    pub completed: String,
    pub created_at: DateTime<Utc>,
}

impl Todo {
    /// Overwrite the fields present in `patch`. `id` and `created_at` never change.
    pub fn apply(&mut self, patch: TodoPatch) {
        if let Some(task) = patch.task {
            self.task = task;
        }
        if let Some(completed) = patch.completed {
            self.completed = completed;
        }
    }
}

/// Validated input for a new todo
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTodo {
    pub task: String,
    pub completed: String,
}

impl NewTodo {
    /// Build a new todo from raw request fields.
    ///
    /// `task` must be present and non-empty. An absent or empty `completed`
    /// falls back to [`DEFAULT_COMPLETED`]; anything else is kept verbatim.
    pub fn new(task: Option<String>, completed: Option<String>) -> Result<Self> {
        let task = match task {
            Some(task) if !task.is_empty() => task,
            _ => return Err(Error::validation(TASK_REQUIRED)),
        };

        let completed = completed
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| DEFAULT_COMPLETED.to_string());

        Ok(Self { task, completed })
    }

    /// Assign a fresh id and creation time.
    pub fn into_todo(self) -> Todo {
        Todo {
            id: ObjectId::new(),
            task: self.task,
            completed: self.completed,
            created_at: now_millis(),
        }
    }
}

/// Partial update. Fields left as `None` (absent or `null`) are untouched;
/// unknown fields are ignored.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TodoPatch {
    pub task: Option<String>,
    pub completed: Option<String>,
}

impl TodoPatch {
    pub fn is_empty(&self) -> bool {
        self.task.is_none() && self.completed.is_none()
    }
}

/// Parse a path identifier. Anything that is not a 24-char hex ObjectId yields `None`.
pub fn parse_todo_id(id: &str) -> Option<TodoId> {
    ObjectId::parse_str(id).ok()
}

/// Current time truncated to the millisecond resolution the document store keeps.
pub fn now_millis() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}
