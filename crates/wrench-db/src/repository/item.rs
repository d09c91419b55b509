//! # Item Repository
//!
//! Database operations for catalog items (parts and labour).
//!
//! ## Stock Changes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Stock is never read-modified-written. Every change is one statement:  │
//! │                                                                         │
//! │    UPDATE items SET quantity = quantity + ?delta WHERE id = ?id        │
//! │                                                                         │
//! │  Concurrent invoices touching the same item therefore compose:         │
//! │                                                                         │
//! │    quantity 5 ──(-3, invoice A)──► 2 ──(-1, invoice B)──► 1            │
//! │    (order of A and B does not matter)                                  │
//! │                                                                         │
//! │  Quantity may go negative (oversold). That is not an error.            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::{contains_pattern, fold_case};
use wrench_core::{Item, ItemUpdate, Money, NewItem};

#[derive(Debug, sqlx::FromRow)]
struct ItemRecord {
    id: String,
    name: String,
    price_cents: i64,
    quantity: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ItemRecord> for Item {
    fn from(record: ItemRecord) -> Self {
        Item {
            id: record.id,
            name: record.name,
            price: Money::from_cents(record.price_cents),
            quantity: record.quantity,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

/// Repository for catalog item database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = ItemRepository::new(pool);
///
/// let pads = repo.find_by_name_or_id(None, "Brake Pads").await?;
/// repo.set_quantity(&pads.unwrap().id, 12).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ItemRepository {
    pool: SqlitePool,
}

impl ItemRepository {
    /// Creates a new ItemRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ItemRepository { pool }
    }

    /// Inserts a new catalog item.
    ///
    /// `item` is expected to be normalized already.
    ///
    /// ## Errors
    /// `UniqueViolation` when an item with the same name exists.
    pub async fn insert(&self, item: &NewItem) -> DbResult<Item> {
        let now = Utc::now();
        let created = Item {
            id: Uuid::new_v4().to_string(),
            name: item.name.clone(),
            price: item.price,
            quantity: item.quantity,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %created.id, name = %created.name, "Inserting item");

        sqlx::query(
            r#"
            INSERT INTO items (id, name, name_folded, price_cents, quantity, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&created.id)
        .bind(&created.name)
        .bind(fold_case(&created.name))
        .bind(created.price.cents())
        .bind(created.quantity)
        .bind(created.created_at)
        .bind(created.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| DbError::from(e).with_value(&created.name))?;

        Ok(created)
    }

    /// Gets an item by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Item>> {
        let record = sqlx::query_as::<_, ItemRecord>(
            r#"
            SELECT id, name, price_cents, quantity, created_at, updated_at
            FROM items
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record.map(Item::from))
    }

    /// Gets an item by its exact name.
    pub async fn find_by_name(&self, name: &str) -> DbResult<Option<Item>> {
        let record = sqlx::query_as::<_, ItemRecord>(
            r#"
            SELECT id, name, price_cents, quantity, created_at, updated_at
            FROM items
            WHERE name = ?1
            "#,
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record.map(Item::from))
    }

    /// Locates the catalog item an invoice line refers to.
    ///
    /// ## Lookup Order
    /// 1. By `id`, when one is given and still exists
    /// 2. By exact `name` otherwise
    pub async fn find_by_name_or_id(&self, id: Option<&str>, name: &str) -> DbResult<Option<Item>> {
        if let Some(id) = id {
            if let Some(item) = self.get_by_id(id).await? {
                return Ok(Some(item));
            }
        }
        self.find_by_name(name).await
    }

    /// Lists items ordered by name.
    pub async fn list(&self, limit: i64) -> DbResult<Vec<Item>> {
        let records = sqlx::query_as::<_, ItemRecord>(
            r#"
            SELECT id, name, price_cents, quantity, created_at, updated_at
            FROM items
            ORDER BY name
            LIMIT ?1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(records.into_iter().map(Item::from).collect())
    }

    /// Case-insensitive substring search on the item name.
    ///
    /// An empty query matches nothing.
    pub async fn search(&self, query: &str, limit: i64) -> DbResult<Vec<Item>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        debug!(query = %query, limit, "Searching items");

        let records = sqlx::query_as::<_, ItemRecord>(
            r#"
            SELECT id, name, price_cents, quantity, created_at, updated_at
            FROM items
            WHERE name_folded LIKE ?1 ESCAPE '\'
            ORDER BY name
            LIMIT ?2
            "#,
        )
        .bind(contains_pattern(query))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(records.into_iter().map(Item::from).collect())
    }

    /// Adds `delta` to the item's on-hand quantity in one statement on
    /// `conn`, so callers can pair it with other writes in a transaction.
    ///
    /// ## Errors
    /// `NotFound` when no item has this ID.
    pub async fn adjust_quantity(conn: &mut SqliteConnection, id: &str, delta: i64) -> DbResult<()> {
        debug!(id = %id, delta, "Adjusting item quantity");

        let result = sqlx::query(
            r#"
            UPDATE items
            SET quantity = quantity + ?1, updated_at = ?2
            WHERE id = ?3
            "#,
        )
        .bind(delta)
        .bind(Utc::now())
        .bind(id)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Item", id));
        }
        Ok(())
    }

    /// Overwrites the item's on-hand quantity (stock count correction).
    pub async fn set_quantity(&self, id: &str, quantity: i64) -> DbResult<Item> {
        self.update(
            id,
            &ItemUpdate {
                quantity: Some(quantity),
                ..ItemUpdate::default()
            },
        )
        .await
    }

    /// Applies a partial update and returns the stored item.
    ///
    /// `update` is expected to be normalized already. Absent fields keep
    /// their stored value.
    ///
    /// ## Errors
    /// - `NotFound` when no item has this ID
    /// - `UniqueViolation` when renaming onto an existing name
    pub async fn update(&self, id: &str, update: &ItemUpdate) -> DbResult<Item> {
        debug!(id = %id, "Updating item");

        let result = sqlx::query(
            r#"
            UPDATE items
            SET name = COALESCE(?1, name),
                name_folded = COALESCE(?6, name_folded),
                price_cents = COALESCE(?2, price_cents),
                quantity = COALESCE(?3, quantity),
                updated_at = ?4
            WHERE id = ?5
            "#,
        )
        .bind(&update.name)
        .bind(update.price.map(|p| p.cents()))
        .bind(update.quantity)
        .bind(Utc::now())
        .bind(id)
        .bind(update.name.as_deref().map(fold_case))
        .execute(&self.pool)
        .await
        .map_err(|e| DbError::from(e).with_value(update.name.clone().unwrap_or_default()))?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Item", id));
        }

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Item", id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};

    fn new_item(name: &str, price_cents: i64, quantity: i64) -> NewItem {
        NewItem {
            name: name.to_string(),
            price: Money::from_cents(price_cents),
            quantity,
        }
    }

    #[tokio::test]
    async fn test_insert_and_lookup() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.items();

        let pads = repo.insert(&new_item("Brake Pads", 5000, 5)).await.unwrap();

        let by_id = repo.get_by_id(&pads.id).await.unwrap().unwrap();
        assert_eq!(by_id.price, Money::from_cents(5000));
        assert_eq!(by_id.quantity, 5);

        let by_name = repo.find_by_name("Brake Pads").await.unwrap().unwrap();
        assert_eq!(by_name.id, pads.id);
    }

    #[tokio::test]
    async fn test_duplicate_name_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.items();

        repo.insert(&new_item("Oil Filter", 1200, 10)).await.unwrap();
        let err = repo.insert(&new_item("Oil Filter", 1300, 1)).await.unwrap_err();

        assert!(err.is_unique_violation_on("items.name"));
        assert!(err.to_string().contains("Oil Filter"));
    }

    #[tokio::test]
    async fn test_find_by_name_or_id_falls_back_to_name() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.items();

        let filter = repo.insert(&new_item("Oil Filter", 1200, 10)).await.unwrap();

        let by_id = repo.find_by_name_or_id(Some(&filter.id), "whatever").await.unwrap();
        assert_eq!(by_id.unwrap().id, filter.id);

        let stale_id = repo
            .find_by_name_or_id(Some("no-such-id"), "Oil Filter")
            .await
            .unwrap();
        assert_eq!(stale_id.unwrap().id, filter.id);

        let missing = repo.find_by_name_or_id(None, "Spark Plug").await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_adjust_quantity_can_go_negative() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.items();

        let pads = repo.insert(&new_item("Brake Pads", 5000, 1)).await.unwrap();
        {
            let mut conn = db.pool().acquire().await.unwrap();
            ItemRepository::adjust_quantity(&mut *conn, &pads.id, -3).await.unwrap();

            let err = ItemRepository::adjust_quantity(&mut *conn, "no-such-id", 1)
                .await
                .unwrap_err();
            assert!(matches!(err, DbError::NotFound { .. }));
        }

        let after = repo.get_by_id(&pads.id).await.unwrap().unwrap();
        assert_eq!(after.quantity, -2);
    }

    #[tokio::test]
    async fn test_update_keeps_absent_fields() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.items();

        let pads = repo.insert(&new_item("Brake Pads", 5000, 5)).await.unwrap();
        let updated = repo
            .update(
                &pads.id,
                &ItemUpdate {
                    price: Some(Money::from_cents(5500)),
                    ..ItemUpdate::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.name, "Brake Pads");
        assert_eq!(updated.price, Money::from_cents(5500));
        assert_eq!(updated.quantity, 5);

        let recounted = repo.set_quantity(&pads.id, 12).await.unwrap();
        assert_eq!(recounted.quantity, 12);
        assert_eq!(recounted.price, Money::from_cents(5500));
    }

    #[tokio::test]
    async fn test_list_and_search() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.items();

        repo.insert(&new_item("Wiper Blade", 1500, 4)).await.unwrap();
        repo.insert(&new_item("Brake Pads", 5000, 5)).await.unwrap();
        repo.insert(&new_item("Brake Fluid", 900, 8)).await.unwrap();

        let names: Vec<String> = repo.list(50).await.unwrap().into_iter().map(|i| i.name).collect();
        assert_eq!(names, vec!["Brake Fluid", "Brake Pads", "Wiper Blade"]);

        let brakes = repo.search("brake", 10).await.unwrap();
        assert_eq!(brakes.len(), 2);

        let limited = repo.search("brake", 1).await.unwrap();
        assert_eq!(limited.len(), 1);
    }

    #[tokio::test]
    async fn test_search_folds_accented_names() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.items();

        let caliper = repo.insert(&new_item("ÉTRIER Avant", 8900, 2)).await.unwrap();

        let found = repo.search("étrier", 10).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "ÉTRIER Avant");

        // Renaming refreshes the folded column
        repo.update(
            &caliper.id,
            &ItemUpdate {
                name: Some("Öl Filter".to_string()),
                ..ItemUpdate::default()
            },
        )
        .await
        .unwrap();
        assert!(repo.search("étrier", 10).await.unwrap().is_empty());
        assert_eq!(repo.search("ÖL", 10).await.unwrap().len(), 1);
    }
}
