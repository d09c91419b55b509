//! # Settings Repository
//!
//! The shop settings singleton (`shop_settings.id = 1`).
//!
//! The row is created lazily with tax 0%, discount 0%, Cash, Paid the first
//! time it is read. Callers load it once per request and pass the value into
//! invoice creation explicitly.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::DbResult;
use wrench_core::{PaymentMethod, PaymentStatus, Percent, ShopSettings};

#[derive(Debug, sqlx::FromRow)]
struct SettingsRecord {
    tax_ppm: i64,
    discount_ppm: i64,
    payment_method: PaymentMethod,
    payment_status: PaymentStatus,
}

impl From<SettingsRecord> for ShopSettings {
    fn from(record: SettingsRecord) -> Self {
        ShopSettings {
            tax: Percent::from_ppm(record.tax_ppm),
            discount: Percent::from_ppm(record.discount_ppm),
            payment_method: record.payment_method,
            payment_status: record.payment_status,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SettingsRepository {
    pool: SqlitePool,
}

impl SettingsRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SettingsRepository { pool }
    }

    /// Reads the settings row, creating it with defaults if missing.
    pub async fn get_or_init(&self) -> DbResult<ShopSettings> {
        let defaults = ShopSettings::default();

        let inserted = sqlx::query(
            r#"
            INSERT OR IGNORE INTO shop_settings
                (id, tax_ppm, discount_ppm, payment_method, payment_status, updated_at)
            VALUES (1, ?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(defaults.tax.ppm())
        .bind(defaults.discount.ppm())
        .bind(defaults.payment_method)
        .bind(defaults.payment_status)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if inserted.rows_affected() > 0 {
            info!("Initialized default shop settings");
        }

        let record = sqlx::query_as::<_, SettingsRecord>(
            r#"
            SELECT tax_ppm, discount_ppm, payment_method, payment_status
            FROM shop_settings
            WHERE id = 1
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(record.into())
    }

    /// Replaces the stored settings. `settings` is expected to be validated
    /// already (see `SettingsUpdate::apply`).
    pub async fn update(&self, settings: &ShopSettings) -> DbResult<ShopSettings> {
        debug!(
            tax_ppm = settings.tax.ppm(),
            discount_ppm = settings.discount.ppm(),
            "Updating shop settings"
        );

        sqlx::query(
            r#"
            INSERT INTO shop_settings
                (id, tax_ppm, discount_ppm, payment_method, payment_status, updated_at)
            VALUES (1, ?1, ?2, ?3, ?4, ?5)
            ON CONFLICT (id) DO UPDATE SET
                tax_ppm = excluded.tax_ppm,
                discount_ppm = excluded.discount_ppm,
                payment_method = excluded.payment_method,
                payment_status = excluded.payment_status,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(settings.tax.ppm())
        .bind(settings.discount.ppm())
        .bind(settings.payment_method)
        .bind(settings.payment_status)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(*settings)
    }
}
