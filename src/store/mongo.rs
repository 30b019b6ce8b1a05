//! MongoDB todo store

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::bson::{self, doc, oid::ObjectId, Document};
use mongodb::options::{ClientOptions, ReturnDocument};
use mongodb::{Client, Collection, Database};
use serde::{Deserialize, Serialize};

use crate::types::{parse_todo_id, NewTodo, Todo, TodoPatch, DEFAULT_COMPLETED};
use crate::{Error, Result};

use super::TodoStore;

/// Collection holding one document per todo
pub const COLLECTION: &str = "todos";

/// Database used when neither the config nor the URI name one
pub const FALLBACK_DATABASE: &str = "test";

/// Persisted layout of a todo.
///
/// Reads fill schema defaults for missing fields so one incomplete document
/// does not fail a whole listing. `createAt` is accepted for documents
/// written under the older field name.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct TodoDocument {
    #[serde(rename = "_id")]
    id: ObjectId,
    #[serde(default)]
    task: String,
    #[serde(default = "default_completed")]
    completed: String,
    #[serde(rename = "createdAt", alias = "createAt", default = "bson::DateTime::now")]
    created_at: bson::DateTime,
}

fn default_completed() -> String {
    DEFAULT_COMPLETED.to_string()
}

impl From<&Todo> for TodoDocument {
    fn from(todo: &Todo) -> Self {
        Self {
            id: todo.id,
            task: todo.task.clone(),
            completed: todo.completed.clone(),
            created_at: bson::DateTime::from_millis(todo.created_at.timestamp_millis()),
        }
    }
}

impl TryFrom<TodoDocument> for Todo {
    type Error = Error;

    fn try_from(doc: TodoDocument) -> Result<Self> {
        let millis = doc.created_at.timestamp_millis();
        let created_at = DateTime::<Utc>::from_timestamp_millis(millis).ok_or_else(|| {
            Error::internal(format!("todo {} has out-of-range createdAt {}", doc.id, millis))
        })?;

        Ok(Todo {
            id: doc.id,
            task: doc.task,
            completed: doc.completed,
            created_at,
        })
    }
}

/// `$set` body for a patch; `None` fields are left out.
fn patch_to_set(patch: TodoPatch) -> Document {
    let mut set = Document::new();
    if let Some(task) = patch.task {
        set.insert("task", task);
    }
    if let Some(completed) = patch.completed {
        set.insert("completed", completed);
    }
    set
}

/// Todo store backed by a MongoDB collection
pub struct MongoStore {
    database: Database,
    todos: Collection<TodoDocument>,
}

impl MongoStore {
    /// Build a client for `uri`.
    ///
    /// The driver connects lazily, so this only fails on a malformed URI or
    /// unresolvable SRV record. Use [`TodoStore::ping`] to check reachability.
    pub async fn new(uri: &str, database: Option<&str>) -> Result<Self> {
        let options = ClientOptions::parse(uri).await?;
        let database_name = database
            .map(str::to_string)
            .or_else(|| options.default_database.clone())
            .unwrap_or_else(|| FALLBACK_DATABASE.to_string());

        let client = Client::with_options(options)?;
        let database = client.database(&database_name);
        let todos = database.collection::<TodoDocument>(COLLECTION);

        tracing::debug!(database = %database_name, collection = COLLECTION, "MongoDB client created");

        Ok(Self { database, todos })
    }

    pub fn database_name(&self) -> &str {
        self.database.name()
    }
}

#[async_trait]
impl TodoStore for MongoStore {
    async fn create(&self, new: NewTodo) -> Result<Todo> {
        let todo = new.into_todo();
        self.todos.insert_one(TodoDocument::from(&todo)).await?;
        Ok(todo)
    }

    async fn list(&self) -> Result<Vec<Todo>> {
        let documents: Vec<TodoDocument> = self.todos.find(doc! {}).await?.try_collect().await?;
        documents.into_iter().map(Todo::try_from).collect()
    }

    async fn get(&self, id: &str) -> Result<Option<Todo>> {
        let Some(id) = parse_todo_id(id) else {
            return Ok(None);
        };
        self.todos
            .find_one(doc! { "_id": id })
            .await?
            .map(Todo::try_from)
            .transpose()
    }

    async fn update(&self, id: &str, patch: TodoPatch) -> Result<Option<Todo>> {
        // an empty $set is rejected by the server
        if patch.is_empty() {
            return self.get(id).await;
        }
        let Some(id) = parse_todo_id(id) else {
            return Ok(None);
        };

        self.todos
            .find_one_and_update(doc! { "_id": id }, doc! { "$set": patch_to_set(patch) })
            .return_document(ReturnDocument::After)
            .await?
            .map(Todo::try_from)
            .transpose()
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let Some(id) = parse_todo_id(id) else {
            return Ok(false);
        };
        let result = self.todos.delete_one(doc! { "_id": id }).await?;
        Ok(result.deleted_count > 0)
    }

    async fn ping(&self) -> Result<()> {
        self.database.run_command(doc! { "ping": 1 }).await?;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "mongodb"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::now_millis;

    #[test]
    fn test_document_layout() {
        let todo = Todo {
            id: ObjectId::new(),
            task: "buy milk".into(),
            completed: "false".into(),
            created_at: now_millis(),
        };

        let document = bson::to_document(&TodoDocument::from(&todo)).unwrap();
        assert_eq!(document.get_object_id("_id").unwrap(), todo.id);
        assert_eq!(document.get_str("task").unwrap(), "buy milk");
        assert_eq!(document.get_str("completed").unwrap(), "false");
        assert!(document.get_datetime("createdAt").is_ok());

        let back: TodoDocument = bson::from_document(document).unwrap();
        assert_eq!(Todo::try_from(back).unwrap(), todo);
    }

    #[test]
    fn test_incomplete_documents_get_defaults() {
        let id = ObjectId::new();
        let written = bson::DateTime::from_millis(1_700_000_000_000);

        let legacy: TodoDocument = bson::from_document(doc! {
            "_id": id,
            "task": "buy milk",
            "createAt": written,
        })
        .unwrap();
        let todo = Todo::try_from(legacy).unwrap();
        assert_eq!(todo.id, id);
        assert_eq!(todo.completed, DEFAULT_COMPLETED);
        assert_eq!(todo.created_at.timestamp_millis(), 1_700_000_000_000);

        let bare: TodoDocument = bson::from_document(doc! { "_id": id }).unwrap();
        let todo = Todo::try_from(bare).unwrap();
        assert_eq!(todo.task, "");
        assert_eq!(todo.completed, DEFAULT_COMPLETED);
    }

    #[test]
    fn test_patch_to_set() {
        let set = patch_to_set(TodoPatch {
            task: None,
            completed: Some("true".into()),
        });
        assert_eq!(set, doc! { "completed": "true" });
        assert!(patch_to_set(TodoPatch::default()).is_empty());
    }

    #[tokio::test]
    async fn test_database_name_resolution() {
        let store = MongoStore::new("mongodb://localhost:27017/todos_app", None)
            .await
            .unwrap();
        assert_eq!(store.database_name(), "todos_app");

        let store = MongoStore::new("mongodb://localhost:27017/todos_app", Some("other"))
            .await
            .unwrap();
        assert_eq!(store.database_name(), "other");

        let store = MongoStore::new("mongodb://localhost:27017", None)
            .await
            .unwrap();
        assert_eq!(store.database_name(), FALLBACK_DATABASE);
    }

    #[tokio::test]
    async fn test_malformed_uri_is_rejected() {
        assert!(MongoStore::new("postgres://localhost", None).await.is_err());
    }

    /// Requires a running MongoDB; set TODO_API_TEST_MONGO_URI to enable.
    #[tokio::test]
    #[ignore]
    async fn test_mongo_round_trip() {
        let uri = std::env::var("TODO_API_TEST_MONGO_URI")
            .unwrap_or_else(|_| "mongodb://localhost:27017".to_string());
        let store = MongoStore::new(&uri, Some("todo_api_test")).await.unwrap();
        store.ping().await.unwrap();

        let created = store
            .create(NewTodo::new(Some("buy milk".into()), None).unwrap())
            .await
            .unwrap();
        let id = created.id.to_hex();

        assert_eq!(store.get(&id).await.unwrap(), Some(created.clone()));

        let updated = store
            .update(
                &id,
                TodoPatch {
                    completed: Some("true".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.completed, "true");
        assert_eq!(updated.created_at, created.created_at);

        assert!(store.delete(&id).await.unwrap());
        assert!(store.get(&id).await.unwrap().is_none());
        assert!(!store.delete(&id).await.unwrap());
    }
}
