//! Local replica store: catalog cache and inventory snapshots

use libsql::Connection;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::Result;
use crate::models::{Case, InventorySnapshot, Skin};
use crate::util::now_millis;

/// Catalog entity kinds addressable in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Case,
    Skin,
}

impl EntityKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Case => "case",
            Self::Skin => "skin",
        }
    }
}

/// A catalog entity stored by id under its kind.
pub trait CatalogEntity: Serialize + DeserializeOwned {
    const KIND: EntityKind;

    fn entity_id(&self) -> &str;
}

impl CatalogEntity for Case {
    const KIND: EntityKind = EntityKind::Case;

    fn entity_id(&self) -> &str {
        &self.id
    }
}

impl CatalogEntity for Skin {
    const KIND: EntityKind = EntityKind::Skin;

    fn entity_id(&self) -> &str {
        &self.id
    }
}

/// Trait for replica storage operations (async)
///
/// Pure storage: last write wins per id, writes are idempotent, and missing
/// keys are reported as `None`.
#[allow(async_fn_in_trait)]
pub trait ReplicaStore {
    /// Get a catalog entity by id
    async fn get<T: CatalogEntity>(&self, id: &str) -> Result<Option<T>>;

    /// Store catalog entities, replacing existing ones with the same id
    async fn put_all<T: CatalogEntity>(&self, entities: &[T]) -> Result<usize>;

    /// List every cached entity of a kind, ordered by id
    async fn list<T: CatalogEntity>(&self) -> Result<Vec<T>>;

    /// Get a user's inventory snapshot
    async fn get_inventory(&self, user_id: &str) -> Result<Option<InventorySnapshot>>;

    /// Replace a user's inventory snapshot
    async fn put_inventory(&self, snapshot: &InventorySnapshot) -> Result<()>;
}

/// libSQL implementation of `ReplicaStore`
pub struct LibSqlReplicaStore<'a> {
    conn: &'a Connection,
}

impl<'a> LibSqlReplicaStore<'a> {
    /// Create a new store with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }
}

impl ReplicaStore for LibSqlReplicaStore<'_> {
    async fn get<T: CatalogEntity>(&self, id: &str) -> Result<Option<T>> {
        let mut rows = self
            .conn
            .query(
                "SELECT payload FROM catalog_entries WHERE kind = ? AND id = ?",
                [T::KIND.as_str(), id],
            )
            .await?;

        match rows.next().await? {
            Some(row) => {
                let payload: String = row.get(0)?;
                Ok(Some(serde_json::from_str(&payload)?))
            }
            None => Ok(None),
        }
    }

    async fn put_all<T: CatalogEntity>(&self, entities: &[T]) -> Result<usize> {
        if entities.is_empty() {
            return Ok(0);
        }

        let now = now_millis();
        let mut payloads = Vec::with_capacity(entities.len());
        for entity in entities {
            payloads.push((entity.entity_id(), serde_json::to_string(entity)?));
        }

        self.conn.execute("BEGIN TRANSACTION", ()).await?;
        for (id, payload) in &payloads {
            let result = self
                .conn
                .execute(
                    "INSERT OR REPLACE INTO catalog_entries (kind, id, payload, updated_at)
                     VALUES (?, ?, ?, ?)",
                    libsql::params![T::KIND.as_str(), *id, payload.as_str(), now],
                )
                .await;
            if let Err(e) = result {
                self.conn.execute("ROLLBACK", ()).await.ok();
                return Err(e.into());
            }
        }
        if let Err(e) = self.conn.execute("COMMIT", ()).await {
            self.conn.execute("ROLLBACK", ()).await.ok();
            return Err(e.into());
        }

        tracing::debug!("Cached {} {} entities", payloads.len(), T::KIND.as_str());
        Ok(payloads.len())
    }

    async fn list<T: CatalogEntity>(&self) -> Result<Vec<T>> {
        let mut rows = self
            .conn
            .query(
                "SELECT payload FROM catalog_entries WHERE kind = ? ORDER BY id",
                [T::KIND.as_str()],
            )
            .await?;

        let mut entities = Vec::new();
        while let Some(row) = rows.next().await? {
            let payload: String = row.get(0)?;
            entities.push(serde_json::from_str(&payload)?);
        }
        Ok(entities)
    }

    async fn get_inventory(&self, user_id: &str) -> Result<Option<InventorySnapshot>> {
        let mut rows = self
            .conn
            .query(
                "SELECT payload FROM inventories WHERE user_id = ?",
                [user_id],
            )
            .await?;

        match rows.next().await? {
            Some(row) => {
                let payload: String = row.get(0)?;
                Ok(Some(serde_json::from_str(&payload)?))
            }
            None => Ok(None),
        }
    }

    async fn put_inventory(&self, snapshot: &InventorySnapshot) -> Result<()> {
        let payload = serde_json::to_string(snapshot)?;
        self.conn
            .execute(
                "INSERT OR REPLACE INTO inventories (user_id, payload, updated_at)
                 VALUES (?, ?, ?)",
                libsql::params![snapshot.user_id.as_str(), payload, now_millis()],
            )
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::models::{InventoryEntry, RarityTable, SyncStatus};
    use pretty_assertions::assert_eq;

    async fn setup() -> Database {
        Database::open_in_memory().await.unwrap()
    }

    fn skin(id: &str, cost: f64) -> Skin {
        Skin {
            id: id.to_string(),
            name: format!("Skin {id}"),
            rarity: "Restricted".to_string(),
            image_ref: String::new(),
            cost,
            case_id: "case-1".to_string(),
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn missing_keys_return_none() {
        let db = setup().await;
        let store = LibSqlReplicaStore::new(db.connection());

        assert!(store.get::<Skin>("nope").await.unwrap().is_none());
        assert!(store.get_inventory("nobody").await.unwrap().is_none());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn put_all_is_last_write_wins_and_idempotent() {
        let db = setup().await;
        let store = LibSqlReplicaStore::new(db.connection());

        store.put_all(&[skin("s1", 1.0), skin("s2", 2.0)]).await.unwrap();
        store.put_all(&[skin("s1", 5.0)]).await.unwrap();
        store.put_all(&[skin("s1", 5.0)]).await.unwrap();

        let listed = store.list::<Skin>().await.unwrap();
        assert_eq!(listed, vec![skin("s1", 5.0), skin("s2", 2.0)]);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn kinds_do_not_collide() {
        let db = setup().await;
        let store = LibSqlReplicaStore::new(db.connection());

        let case = Case {
            id: "x".to_string(),
            name: "Case X".to_string(),
            image_ref: String::new(),
            rarity_table: RarityTable::from_pairs([("Restricted", 1.0)]),
        };
        store.put_all(&[case.clone()]).await.unwrap();
        store.put_all(&[skin("x", 1.0)]).await.unwrap();

        assert_eq!(store.get::<Case>("x").await.unwrap(), Some(case));
        assert_eq!(store.get::<Skin>("x").await.unwrap(), Some(skin("x", 1.0)));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn inventory_roundtrip_per_user() {
        let db = setup().await;
        let store = LibSqlReplicaStore::new(db.connection());

        let snapshot = InventorySnapshot::from_entries(
            "u1",
            vec![InventoryEntry::from_skin(&skin("s1", 4.0), 10, SyncStatus::Pending)],
        );
        store.put_inventory(&snapshot).await.unwrap();
        store.put_inventory(&snapshot).await.unwrap();

        assert_eq!(store.get_inventory("u1").await.unwrap(), Some(snapshot));
        assert!(store.get_inventory("u2").await.unwrap().is_none());
    }
}
