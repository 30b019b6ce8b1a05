//! In-process todo store

use async_trait::async_trait;
use dashmap::DashMap;

use crate::types::{parse_todo_id, NewTodo, Todo, TodoId, TodoPatch};
use crate::Result;

use super::TodoStore;

/// Todo store held in a concurrent map. Contents are lost on restart.
#[derive(Default)]
pub struct MemoryStore {
    todos: DashMap<TodoId, Todo>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.todos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.todos.is_empty()
    }
}

#[async_trait]
impl TodoStore for MemoryStore {
    async fn create(&self, new: NewTodo) -> Result<Todo> {
        let todo = new.into_todo();
        self.todos.insert(todo.id, todo.clone());
        Ok(todo)
    }

    async fn list(&self) -> Result<Vec<Todo>> {
        let mut todos: Vec<Todo> = self.todos.iter().map(|e| e.value().clone()).collect();
        // ObjectIds sort by creation
        todos.sort_by_key(|t| t.id);
        Ok(todos)
    }

    async fn get(&self, id: &str) -> Result<Option<Todo>> {
        let Some(id) = parse_todo_id(id) else {
            return Ok(None);
        };
        Ok(self.todos.get(&id).map(|e| e.value().clone()))
    }

    async fn update(&self, id: &str, patch: TodoPatch) -> Result<Option<Todo>> {
        let Some(id) = parse_todo_id(id) else {
            return Ok(None);
        };
        // the shard write lock is held for the whole read-modify-write
        Ok(self.todos.get_mut(&id).map(|mut entry| {
            entry.apply(patch);
            entry.clone()
        }))
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let Some(id) = parse_todo_id(id) else {
            return Ok(false);
        };
        Ok(self.todos.remove(&id).is_some())
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
