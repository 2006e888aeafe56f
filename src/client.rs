/*!
 * Keyed object store client.
 *
 * Binds a project identifier and exposes four operations against the
 * shared objects table. Two surfaces are provided:
 *
 * - `try_get` / `try_set` / `try_delete` / `try_get_with_prefix` return
 *   explicit results so failure causes stay distinguishable.
 * - `get` / `set` / `delete` / `get_with_prefix` preserve the original
 *   sentinel contract: the error is logged and collapsed to
 *   `None`/`false`, never propagated.
 *
 * No operation validates the document's shape, caches, or retries.
 * Concurrent calls are not serialized here; last-write-wins is whatever
 * order the backend applies the upserts in.
 */

use serde_json::Value;
use sqlx::Row;
use tracing::error;

use crate::database::DatabaseManager;
use crate::error::{ClientError, ClientResult};
use crate::query::{bind_params, DeleteBuilder, QueryCondition, SelectBuilder, UpsertBuilder};
use crate::record::{decode_document, encode_document, KeyValueEntry, ObjectRecord};
use crate::OBJECTS_TABLE;

pub struct ProjectStore<'a> {
    db: &'a DatabaseManager,
    project_id: String,
}

impl<'a> ProjectStore<'a> {
    /// Requires a non-empty project identifier; every operation on the
    /// resulting client is implicitly scoped to it.
    pub fn new(db: &'a DatabaseManager, project_id: impl Into<String>) -> ClientResult<Self> {
        let project_id = project_id.into();
        if project_id.is_empty() {
            return Err(ClientError::validation("project id must not be empty"));
        }
        Ok(Self { db, project_id })
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    fn scoped(&self) -> QueryCondition {
        QueryCondition::eq("project_id", Value::String(self.project_id.clone()))
    }

    fn require_key(key: &str) -> ClientResult<()> {
        if key.is_empty() {
            return Err(ClientError::validation("key must not be empty"));
        }
        Ok(())
    }

    /// Fetch the `value` documents stored under `key`.
    ///
    /// The result keeps the backend's result-set shape: with the unique
    /// `(project_id, key)` constraint in place this is zero or one
    /// element, but multiplicity is not collapsed here.
    pub async fn try_get(&self, key: &str) -> ClientResult<Vec<Option<Value>>> {
        Self::require_key(key)?;

        let (sql, params) = SelectBuilder::new(OBJECTS_TABLE)
            .select(&["value"])
            .where_condition(self.scoped())
            .where_condition(QueryCondition::eq("key", Value::String(key.to_string())))
            .build()?;

        let rows = bind_params(&sql, params)?.fetch_all(self.db.pool()).await?;
        rows.iter()
            .map(|row| decode_document(row.try_get::<Option<String>, _>("value")?))
            .collect()
    }

    /// Upsert `value` under `key`: inserts on first write, replaces the
    /// stored document afterwards. `id` and `created_at` are untouched by
    /// replacement.
    pub async fn try_set(&self, key: &str, value: &Value) -> ClientResult<()> {
        Self::require_key(key)?;

        let (sql, params) = UpsertBuilder::new(OBJECTS_TABLE)
            .set("project_id", Value::String(self.project_id.clone()))
            .set("key", Value::String(key.to_string()))
            .set("value", encode_document(value)?)
            .on_conflict(&["project_id", "key"])
            .build()?;

        bind_params(&sql, params)?.execute(self.db.pool()).await?;
        Ok(())
    }

    /// Remove the rows stored under `key`. Deleting a key that does not
    /// exist is not an error.
    pub async fn try_delete(&self, key: &str) -> ClientResult<()> {
        Self::require_key(key)?;

        let (sql, params) = DeleteBuilder::new(OBJECTS_TABLE)
            .where_condition(self.scoped())
            .where_condition(QueryCondition::eq("key", Value::String(key.to_string())))
            .build()?;

        bind_params(&sql, params)?.execute(self.db.pool()).await?;
        Ok(())
    }

    /// Fetch all `{key, value}` pairs whose key starts with `prefix`,
    /// scoped to this project. An empty prefix scans the whole project.
    /// LIKE wildcards in the prefix are matched literally.
    pub async fn try_get_with_prefix(&self, prefix: &str) -> ClientResult<Vec<KeyValueEntry>> {
        let (sql, params) = SelectBuilder::new(OBJECTS_TABLE)
            .select(&["key", "value"])
            .where_condition(self.scoped())
            .where_condition(QueryCondition::prefix("key", prefix))
            .build()?;

        let rows = bind_params(&sql, params)?.fetch_all(self.db.pool()).await?;
        rows.iter().map(KeyValueEntry::from_row).collect()
    }

    /// Fetch full rows for `key`, including the server-assigned `id` and
    /// `created_at`.
    pub async fn try_get_records(&self, key: &str) -> ClientResult<Vec<ObjectRecord>> {
        Self::require_key(key)?;

        let (sql, params) = SelectBuilder::new(OBJECTS_TABLE)
            .select(&["id", "created_at", "project_id", "key", "value"])
            .where_condition(self.scoped())
            .where_condition(QueryCondition::eq("key", Value::String(key.to_string())))
            .build()?;

        let rows = bind_params(&sql, params)?.fetch_all(self.db.pool()).await?;
        rows.iter().map(ObjectRecord::from_row).collect()
    }

    /// Count the rows stored under `key` within this project.
    pub async fn try_count(&self, key: &str) -> ClientResult<i64> {
        Self::require_key(key)?;

        let (sql, params) = SelectBuilder::new(OBJECTS_TABLE)
            .select(&["COUNT(*) AS n"])
            .where_condition(self.scoped())
            .where_condition(QueryCondition::eq("key", Value::String(key.to_string())))
            .build()?;

        let row = bind_params(&sql, params)?.fetch_one(self.db.pool()).await?;
        Ok(row.try_get("n")?)
    }

    // Sentinel surface: log-and-swallow, matching the original contract.

    pub async fn get(&self, key: &str) -> Option<Vec<Option<Value>>> {
        match self.try_get(key).await {
            Ok(values) => Some(values),
            Err(err) => {
                error!(project_id = %self.project_id, key, "object get failed: {}", err);
                None
            }
        }
    }

    pub async fn set(&self, key: &str, value: &Value) -> bool {
        match self.try_set(key, value).await {
            Ok(()) => true,
            Err(err) => {
                error!(project_id = %self.project_id, key, "object set failed: {}", err);
                false
            }
        }
    }

    pub async fn delete(&self, key: &str) -> bool {
        match self.try_delete(key).await {
            Ok(()) => true,
            Err(err) => {
                error!(project_id = %self.project_id, key, "object delete failed: {}", err);
                false
            }
        }
    }

    pub async fn get_with_prefix(&self, prefix: &str) -> Option<Vec<KeyValueEntry>> {
        match self.try_get_with_prefix(prefix).await {
            Ok(entries) => Some(entries),
            Err(err) => {
                error!(project_id = %self.project_id, prefix, "object prefix scan failed: {}", err);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::DatabaseOptions;
    use serde_json::json;
    use tempfile::TempDir;

    async fn create_test_db() -> (DatabaseManager, TempDir) {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let options = DatabaseOptions {
            path: temp_dir.path().join("objects.db"),
            ..Default::default()
        };
        let db = DatabaseManager::new(options)
            .await
            .expect("failed to create database manager");
        db.initialize().await.expect("failed to apply schema");
        (db, temp_dir)
    }

    #[tokio::test]
    async fn empty_project_id_is_rejected() {
        let (db, _temp_dir) = create_test_db().await;
        assert!(matches!(
            db.project(""),
            Err(ClientError::Validation { .. })
        ));
    }

    #[tokio::test]
    async fn empty_key_is_rejected() {
        let (db, _temp_dir) = create_test_db().await;
        let store = db.project("p1").unwrap();

        assert!(matches!(
            store.try_get("").await,
            Err(ClientError::Validation { .. })
        ));
        assert!(matches!(
            store.try_set("", &json!(1)).await,
            Err(ClientError::Validation { .. })
        ));
        assert!(matches!(
            store.try_delete("").await,
            Err(ClientError::Validation { .. })
        ));
    }

    #[tokio::test]
    async fn set_then_get_returns_value() {
        let (db, _temp_dir) = create_test_db().await;
        let store = db.project("p1").unwrap();

        let value = json!({"name": "A", "age": 1});
        store.try_set("user:a", &value).await.unwrap();

        let result = store.try_get("user:a").await.unwrap();
        assert_eq!(result, vec![Some(value)]);
    }

    #[tokio::test]
    async fn get_of_missing_key_is_empty_set() {
        let (db, _temp_dir) = create_test_db().await;
        let store = db.project("p1").unwrap();
        assert!(store.try_get("absent").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn set_replaces_without_duplicating() {
        let (db, _temp_dir) = create_test_db().await;
        let store = db.project("p1").unwrap();

        store.try_set("k", &json!({"v": 1})).await.unwrap();
        store.try_set("k", &json!({"v": 2})).await.unwrap();

        assert_eq!(store.try_count("k").await.unwrap(), 1);
        assert_eq!(
            store.try_get("k").await.unwrap(),
            vec![Some(json!({"v": 2}))]
        );
    }

    #[tokio::test]
    async fn replacement_preserves_id_and_created_at() {
        let (db, _temp_dir) = create_test_db().await;
        let store = db.project("p1").unwrap();

        store.try_set("k", &json!(1)).await.unwrap();
        let before = store.try_get_records("k").await.unwrap();
        assert_eq!(before.len(), 1);

        store.try_set("k", &json!(2)).await.unwrap();
        let after = store.try_get_records("k").await.unwrap();
        assert_eq!(after.len(), 1);
        assert_eq!(after[0].id, before[0].id);
        assert_eq!(after[0].created_at, before[0].created_at);
        assert_eq!(after[0].value, Some(json!(2)));
    }

    #[tokio::test]
    async fn set_is_idempotent_for_same_value() {
        let (db, _temp_dir) = create_test_db().await;
        let store = db.project("p1").unwrap();

        store.try_set("k", &json!([1, 2, 3])).await.unwrap();
        store.try_set("k", &json!([1, 2, 3])).await.unwrap();

        assert_eq!(store.try_count("k").await.unwrap(), 1);
        assert_eq!(
            store.try_get("k").await.unwrap(),
            vec![Some(json!([1, 2, 3]))]
        );
    }

    #[tokio::test]
    async fn null_value_round_trips() {
        let (db, _temp_dir) = create_test_db().await;
        let store = db.project("p1").unwrap();

        store.try_set("k", &Value::Null).await.unwrap();
        assert_eq!(store.try_get("k").await.unwrap(), vec![None]);
    }

    #[tokio::test]
    async fn delete_removes_and_is_idempotent() {
        let (db, _temp_dir) = create_test_db().await;
        let store = db.project("p1").unwrap();

        store.try_set("k", &json!(1)).await.unwrap();
        store.try_delete("k").await.unwrap();
        assert!(store.try_get("k").await.unwrap().is_empty());

        // Deleting a nonexistent key still succeeds.
        store.try_delete("k").await.unwrap();
        assert!(store.delete("k").await);
    }

    #[tokio::test]
    async fn prefix_scan_returns_exact_matching_set() {
        let (db, _temp_dir) = create_test_db().await;
        let store = db.project("p1").unwrap();

        store.try_set("user:a", &json!(1)).await.unwrap();
        store.try_set("user:b", &json!(2)).await.unwrap();
        store.try_set("group:a", &json!(3)).await.unwrap();

        let mut entries = store.try_get_with_prefix("user:").await.unwrap();
        entries.sort_by(|a, b| a.key.cmp(&b.key));
        let keys: Vec<&str> = entries.iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, vec!["user:a", "user:b"]);
    }

    #[tokio::test]
    async fn prefix_scan_is_project_scoped() {
        let (db, _temp_dir) = create_test_db().await;
        let store_a = db.project("a").unwrap();
        let store_b = db.project("b").unwrap();

        store_a.try_set("user:shared", &json!("a")).await.unwrap();
        store_b.try_set("user:shared", &json!("b")).await.unwrap();

        let entries = store_a.try_get_with_prefix("user:").await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].value, Some(json!("a")));
    }

    #[tokio::test]
    async fn prefix_wildcards_match_literally() {
        let (db, _temp_dir) = create_test_db().await;
        let store = db.project("p1").unwrap();

        store.try_set("100%:done", &json!(1)).await.unwrap();
        store.try_set("100x:done", &json!(2)).await.unwrap();
        store.try_set("a_b", &json!(3)).await.unwrap();
        store.try_set("axb", &json!(4)).await.unwrap();

        let entries = store.try_get_with_prefix("100%").await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].key, "100%:done");

        let entries = store.try_get_with_prefix("a_").await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].key, "a_b");
    }

    #[tokio::test]
    async fn empty_prefix_scans_whole_project() {
        let (db, _temp_dir) = create_test_db().await;
        let store = db.project("p1").unwrap();

        store.try_set("a", &json!(1)).await.unwrap();
        store.try_set("b", &json!(2)).await.unwrap();

        assert_eq!(store.try_get_with_prefix("").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn sentinel_surface_swallows_backend_failure() {
        let (db, _temp_dir) = create_test_db().await;
        let store = db.project("p1").unwrap();
        store.try_set("k", &json!(1)).await.unwrap();

        db.close().await;

        assert!(store.get("k").await.is_none());
        assert!(!store.set("k", &json!(2)).await);
        assert!(!store.delete("k").await);
        assert!(store.get_with_prefix("").await.is_none());

        assert!(matches!(
            store.try_get("k").await,
            Err(ClientError::Backend(_))
        ));
    }

    #[tokio::test]
    async fn concurrent_sets_leave_one_row() {
        let (db, _temp_dir) = create_test_db().await;
        let store = db.project("p1").unwrap();

        let value_one = json!("one");
        let value_two = json!("two");
        let first = store.try_set("k", &value_one);
        let second = store.try_set("k", &value_two);
        let (a, b) = tokio::join!(first, second);
        a.unwrap();
        b.unwrap();

        assert_eq!(store.try_count("k").await.unwrap(), 1);
        let value = store.try_get("k").await.unwrap();
        assert!(value == vec![Some(json!("one"))] || value == vec![Some(json!("two"))]);
    }
}
