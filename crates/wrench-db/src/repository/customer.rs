//! # Customer Repository
//!
//! Database operations for customers.
//!
//! Customers are keyed naturally by `(name, phone)`. Invoice creation finds
//! the existing row for that pair or creates it; the invoice flow never
//! deletes customers.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::{contains_pattern, fold_case};
use wrench_core::{Customer, CustomerDetails};

#[derive(Debug, sqlx::FromRow)]
struct CustomerRecord {
    id: String,
    name: String,
    phone: String,
    address: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<CustomerRecord> for Customer {
    fn from(record: CustomerRecord) -> Self {
        Customer {
            id: record.id,
            name: record.name,
            phone: record.phone,
            address: record.address,
            created_at: record.created_at,
        }
    }
}

/// Repository for customer database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = CustomerRepository::new(pool);
///
/// let customer = repo.find_or_create(&details).await?;
/// let matches = repo.search("reyes", 10).await?;
/// ```
#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
}

impl CustomerRepository {
    /// Creates a new CustomerRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CustomerRepository { pool }
    }

    /// Looks up a customer by the exact `(name, phone)` pair.
    pub async fn find_by_name_phone(&self, name: &str, phone: &str) -> DbResult<Option<Customer>> {
        let record = sqlx::query_as::<_, CustomerRecord>(
            r#"
            SELECT id, name, phone, address, created_at
            FROM customers
            WHERE name = ?1 AND phone = ?2
            "#,
        )
        .bind(name)
        .bind(phone)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record.map(Customer::from))
    }

    /// Inserts a new customer.
    ///
    /// `details` is expected to be normalized already.
    ///
    /// ## Errors
    /// `UniqueViolation` when the `(name, phone)` pair exists.
    pub async fn insert(&self, details: &CustomerDetails) -> DbResult<Customer> {
        let customer = Customer {
            id: Uuid::new_v4().to_string(),
            name: details.name.clone(),
            phone: details.phone.clone(),
            address: details.address.clone(),
            created_at: Utc::now(),
        };

        debug!(id = %customer.id, name = %customer.name, "Inserting customer");

        sqlx::query(
            r#"
            INSERT INTO customers (id, name, name_folded, phone, address, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&customer.id)
        .bind(&customer.name)
        .bind(fold_case(&customer.name))
        .bind(&customer.phone)
        .bind(&customer.address)
        .bind(customer.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            DbError::from(e).with_value(format!("{} / {}", customer.name, customer.phone))
        })?;

        Ok(customer)
    }

    /// Returns the customer for `(name, phone)`, creating it if needed.
    ///
    /// An existing customer keeps its stored address. Two concurrent calls
    /// for the same new pair both end up with the same row: the loser of the
    /// insert race re-reads the winner's.
    pub async fn find_or_create(&self, details: &CustomerDetails) -> DbResult<Customer> {
        if let Some(existing) = self.find_by_name_phone(&details.name, &details.phone).await? {
            return Ok(existing);
        }

        match self.insert(details).await {
            Ok(created) => Ok(created),
            Err(err) if err.is_unique_violation_on("customers.name") => self
                .find_by_name_phone(&details.name, &details.phone)
                .await?
                .ok_or(err),
            Err(err) => Err(err),
        }
    }

    /// Gets a customer by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Customer>> {
        let record = sqlx::query_as::<_, CustomerRecord>(
            r#"
            SELECT id, name, phone, address, created_at
            FROM customers
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record.map(Customer::from))
    }

    /// Lists customers, newest first.
    pub async fn list(&self, limit: i64) -> DbResult<Vec<Customer>> {
        let records = sqlx::query_as::<_, CustomerRecord>(
            r#"
            SELECT id, name, phone, address, created_at
            FROM customers
            ORDER BY created_at DESC, name
            LIMIT ?1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(records.into_iter().map(Customer::from).collect())
    }

    /// Case-insensitive substring search over name and phone.
    ///
    /// An empty query matches nothing.
    pub async fn search(&self, query: &str, limit: i64) -> DbResult<Vec<Customer>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        debug!(query = %query, limit, "Searching customers");

        let pattern = contains_pattern(query);
        let records = sqlx::query_as::<_, CustomerRecord>(
            r#"
            SELECT id, name, phone, address, created_at
            FROM customers
            WHERE name_folded LIKE ?1 ESCAPE '\' OR phone LIKE ?1 ESCAPE '\'
            ORDER BY name
            LIMIT ?2
            "#,
        )
        .bind(&pattern)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(records.into_iter().map(Customer::from).collect())
    }
}
