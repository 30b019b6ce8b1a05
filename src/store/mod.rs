//! Todo store abstraction
//!
//! Provides a unified interface over MongoDB and an in-process map

use async_trait::async_trait;

use crate::types::{NewTodo, Todo, TodoPatch};
use crate::{Error, Result};

pub mod memory;
pub mod mongo;

/// Persistence for todo items.
///
/// Every call touches at most one document. Lookups by an identifier that
/// does not parse as a [`crate::types::TodoId`] behave as a miss.
#[async_trait]
pub trait TodoStore: Send + Sync {
    /// Insert a new todo, assigning its id and creation time
    async fn create(&self, new: NewTodo) -> Result<Todo>;

    /// All stored todos
    async fn list(&self) -> Result<Vec<Todo>>;

    /// Look up one todo
    async fn get(&self, id: &str) -> Result<Option<Todo>>;

    /// Apply a partial update and return the resulting todo
    async fn update(&self, id: &str, patch: TodoPatch) -> Result<Option<Todo>>;

    /// Remove a todo, returning whether it existed
    async fn delete(&self, id: &str) -> Result<bool>;

    /// Check that the backend is reachable
    async fn ping(&self) -> Result<()>;

    /// Short backend name for diagnostics
    fn backend_name(&self) -> &'static str;
}

/// Store configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreConfig {
    Mongo {
        uri: Option<String>,
        database: Option<String>,
    },
    Memory,
}

/// Create store backend from config
pub async fn create_store(config: StoreConfig) -> Result<Box<dyn TodoStore>> {
    match config {
        StoreConfig::Mongo { uri, database } => {
            let uri = uri.ok_or_else(|| Error::store("MongoDB connection string is not set"))?;
            let backend = mongo::MongoStore::new(&uri, database.as_deref()).await?;
            Ok(Box::new(backend))
        }
        StoreConfig::Memory => Ok(Box::new(memory::MemoryStore::new())),
    }
}

/// Log line emitted once a backend answers a ping
pub fn connected_message(backend: &str) -> String {
    match backend {
        "mongodb" => "Successfully connected to MongoDB".to_string(),
        other => format!("Successfully connected to {other} store"),
    }
}

/// Ping the store and log the outcome.
pub async fn verify_connection(store: &dyn TodoStore) -> Result<()> {
    let backend = store.backend_name();
    match store.ping().await {
        Ok(()) => {
            tracing::info!(backend, "{}", connected_message(backend));
            Ok(())
        }
        Err(err) => {
            tracing::error!(backend, error = %err, "Store connection error");
            Err(err)
        }
    }
}

/// Stand-in used when the configured backend could not be constructed.
///
/// The server keeps answering; every store call fails with the original reason.
pub struct DisconnectedStore {
    reason: String,
}

impl DisconnectedStore {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    fn unavailable<T>(&self) -> Result<T> {
        Err(Error::store(format!("store unavailable: {}", self.reason)))
    }
}

#[async_trait]
impl TodoStore for DisconnectedStore {
    async fn create(&self, _new: NewTodo) -> Result<Todo> {
        self.unavailable()
    }

    async fn list(&self) -> Result<Vec<Todo>> {
        self.unavailable()
    }

    async fn get(&self, _id: &str) -> Result<Option<Todo>> {
        self.unavailable()
    }

    async fn update(&self, _id: &str, _patch: TodoPatch) -> Result<Option<Todo>> {
        self.unavailable()
    }

    async fn delete(&self, _id: &str) -> Result<bool> {
        self.unavailable()
    }

    async fn ping(&self) -> Result<()> {
        self.unavailable()
    }

    fn backend_name(&self) -> &'static str {
        "disconnected"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_store_memory() {
        let store = create_store(StoreConfig::Memory).await.unwrap();
        assert_eq!(store.backend_name(), "memory");
        assert!(store.ping().await.is_ok());
    }

    #[tokio::test]
    async fn test_create_store_without_uri_fails() {
        let result = create_store(StoreConfig::Mongo {
            uri: None,
            database: None,
        })
        .await;
        assert!(matches!(result, Err(Error::Store(_))));
    }

    #[test]
    fn test_connected_message() {
        assert_eq!(connected_message("mongodb"), "Successfully connected to MongoDB");
        assert_eq!(connected_message("memory"), "Successfully connected to memory store");
    }

    #[tokio::test]
    async fn test_verify_connection() {
        assert!(verify_connection(&memory::MemoryStore::new()).await.is_ok());

        let err = verify_connection(&DisconnectedStore::new("no uri"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Store(_)));
    }

    #[tokio::test]
    async fn test_disconnected_store_fails_every_call() {
        let store = DisconnectedStore::new("connection refused");
        let new = NewTodo::new(Some("buy milk".into()), None).unwrap();

        assert!(matches!(store.create(new).await, Err(Error::Store(_))));
        assert!(matches!(store.list().await, Err(Error::Store(_))));
        assert!(matches!(store.get("x").await, Err(Error::Store(_))));
        assert!(matches!(
            store.update("x", TodoPatch::default()).await,
            Err(Error::Store(_))
        ));
        assert!(matches!(store.delete("x").await, Err(Error::Store(_))));

        let err = store.ping().await.unwrap_err();
        assert!(err.to_string().contains("connection refused"));
    }
}
