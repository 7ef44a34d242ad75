//! # Balance Repository
//!
//! The Balance Store: one row of current quantity per (tenant, product,
//! location), materialized from the ledger.
//!
//! ## The Guarded Update
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │              Closing the Lost-Update Race                               │
//! │                                                                         │
//! │  ❌ WRONG: read, check, then write as separate statements              │
//! │     SELECT quantity ...            (both withdrawals read 50)          │
//! │     if quantity >= 30 { ... }      (both pass the check)               │
//! │     UPDATE ... SET quantity = 20   (balance ends at 20, not -10,       │
//! │                                     but 60 units left the building)    │
//! │                                                                         │
//! │  ✅ CORRECT: one guarded statement                                     │
//! │     UPDATE balances                                                    │
//! │     SET quantity = quantity + ?δ                                       │
//! │     WHERE <key> AND quantity + ?δ >= 0                                 │
//! │     RETURNING quantity                                                 │
//! │                                                                         │
//! │  No row back means the guard failed: the caller reports the conflict   │
//! │  and rolls the transaction back. The check and the write are one       │
//! │  atomic statement, so two concurrent withdrawals can never both        │
//! │  consume the same units.                                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The transaction-scoped methods take a `&mut SqliteConnection` so the
//! movement engine can compose them inside one atomic unit; the pool-based
//! methods are plain reads plus the rebuild/verify maintenance pair.

use std::collections::HashMap;

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use crate::error::DbResult;
use stockflow_core::rebuild::{diff_balances, rebuild_balances};
use stockflow_core::{Balance, BalanceKey, LedgerEntry};

/// Repository for balance reads and ledger-derived maintenance.
#[derive(Debug, Clone)]
pub struct BalanceRepository {
    pool: SqlitePool,
}

impl BalanceRepository {
    /// Creates a new BalanceRepository.
    pub fn new(pool: SqlitePool) -> Self {
        BalanceRepository { pool }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Gets one balance row, if it has ever been created.
    pub async fn get(
        &self,
        tenant_id: &str,
        product_id: &str,
        location_id: &str,
    ) -> DbResult<Option<Balance>> {
        let balance = sqlx::query_as::<_, Balance>(
            r#"
            SELECT tenant_id, product_id, location_id, quantity, updated_at
            FROM balances
            WHERE tenant_id = ?1 AND product_id = ?2 AND location_id = ?3
            "#,
        )
        .bind(tenant_id)
        .bind(product_id)
        .bind(location_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(balance)
    }

    /// Current quantity for a key; 0 if the row was never created.
    pub async fn quantity(
        &self,
        tenant_id: &str,
        product_id: &str,
        location_id: &str,
    ) -> DbResult<i64> {
        Ok(self
            .get(tenant_id, product_id, location_id)
            .await?
            .map(|b| b.quantity)
            .unwrap_or(0))
    }

    /// All balance rows of a tenant.
    pub async fn list_for_tenant(&self, tenant_id: &str) -> DbResult<Vec<Balance>> {
        let balances = sqlx::query_as::<_, Balance>(
            r#"
            SELECT tenant_id, product_id, location_id, quantity, updated_at
            FROM balances
            WHERE tenant_id = ?1
            ORDER BY product_id, location_id
            "#,
        )
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(balances)
    }

    // =========================================================================
    // Transaction-scoped primitives (movement engine only)
    // =========================================================================

    /// Makes sure the balance row exists, creating it at quantity 0.
    ///
    /// Balances are created lazily on first movement; the insert doubles as
    /// the statement that promotes the surrounding transaction to a write
    /// transaction before any balance is read.
    pub(crate) async fn ensure_row(
        conn: &mut SqliteConnection,
        tenant_id: &str,
        product_id: &str,
        location_id: &str,
    ) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO balances (tenant_id, product_id, location_id, quantity, updated_at)
            VALUES (?1, ?2, ?3, 0, ?4)
            ON CONFLICT (tenant_id, product_id, location_id) DO NOTHING
            "#,
        )
        .bind(tenant_id)
        .bind(product_id)
        .bind(location_id)
        .bind(Utc::now())
        .execute(conn)
        .await?;

        Ok(())
    }

    /// Current quantity, read inside the movement transaction.
    pub(crate) async fn quantity_on(
        conn: &mut SqliteConnection,
        tenant_id: &str,
        product_id: &str,
        location_id: &str,
    ) -> DbResult<i64> {
        let quantity: Option<i64> = sqlx::query_scalar(
            r#"
            SELECT quantity
            FROM balances
            WHERE tenant_id = ?1 AND product_id = ?2 AND location_id = ?3
            "#,
        )
        .bind(tenant_id)
        .bind(product_id)
        .bind(location_id)
        .fetch_optional(conn)
        .await?;

        Ok(quantity.unwrap_or(0))
    }

    /// Applies a signed delta, guarded against going negative.
    ///
    /// Returns `Some(new_quantity)` on success, `None` when the guard
    /// rejected the update (insufficient inventory). The row must already
    /// exist - call [`Self::ensure_row`] first.
    pub(crate) async fn apply_delta(
        conn: &mut SqliteConnection,
        tenant_id: &str,
        product_id: &str,
        location_id: &str,
        delta: i64,
    ) -> DbResult<Option<i64>> {
        let new_quantity: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE balances
            SET quantity = quantity + ?4, updated_at = ?5
            WHERE tenant_id = ?1 AND product_id = ?2 AND location_id = ?3
              AND quantity + ?4 >= 0
            RETURNING quantity
            "#,
        )
        .bind(tenant_id)
        .bind(product_id)
        .bind(location_id)
        .bind(delta)
        .bind(Utc::now())
        .fetch_optional(conn)
        .await?;

        Ok(new_quantity)
    }

    /// Sets the quantity to an absolute target (Reconcile).
    ///
    /// Written directly rather than via delta accumulation so a reconcile
    /// can never drift from its target. The row must already exist.
    pub(crate) async fn set_absolute(
        conn: &mut SqliteConnection,
        tenant_id: &str,
        product_id: &str,
        location_id: &str,
        target: i64,
    ) -> DbResult<i64> {
        let quantity: i64 = sqlx::query_scalar(
            r#"
            UPDATE balances
            SET quantity = ?4, updated_at = ?5
            WHERE tenant_id = ?1 AND product_id = ?2 AND location_id = ?3
            RETURNING quantity
            "#,
        )
        .bind(tenant_id)
        .bind(product_id)
        .bind(location_id)
        .bind(target)
        .bind(Utc::now())
        .fetch_one(conn)
        .await?;

        Ok(quantity)
    }

    // =========================================================================
    // Ledger-derived maintenance
    // =========================================================================

    /// Returns the keys whose materialized quantity disagrees with the fold
    /// of the tenant's ledger. Empty means consistent.
    pub async fn verify_against_ledger(&self, tenant_id: &str) -> DbResult<Vec<BalanceKey>> {
        let materialized: HashMap<BalanceKey, i64> = self
            .list_for_tenant(tenant_id)
            .await?
            .into_iter()
            .map(|b| (b.key(), b.quantity))
            .collect();

        let entries = self.ledger_entries(tenant_id).await?;
        let rebuilt = rebuild_balances(&entries);

        Ok(diff_balances(&materialized, &rebuilt))
    }

    /// Replaces the tenant's materialized balances with the fold of its
    /// ledger, in one transaction. Returns the number of rows written.
    ///
    /// The repair path for a cache that drifted (which, absent bugs or
    /// out-of-band writes, it never should).
    pub async fn rebuild_from_ledger(&self, tenant_id: &str) -> DbResult<usize> {
        info!(tenant_id = %tenant_id, "Rebuilding balances from ledger");

        let mut tx = self.pool.begin().await?;

        let entries = sqlx::query_as::<_, LedgerEntry>(
            r#"
            SELECT id, tenant_id, product_id, kind, from_location_id, to_location_id,
                   delta, total, actor_id, created_at
            FROM movements
            WHERE tenant_id = ?1
            "#,
        )
        .bind(tenant_id)
        .fetch_all(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM balances WHERE tenant_id = ?1")
            .bind(tenant_id)
            .execute(&mut *tx)
            .await?;

        let rebuilt = rebuild_balances(&entries);
        let now = Utc::now();
        let mut written = 0usize;

        for (key, quantity) in &rebuilt {
            sqlx::query(
                r#"
                INSERT INTO balances (tenant_id, product_id, location_id, quantity, updated_at)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
            )
            .bind(&key.tenant_id)
            .bind(&key.product_id)
            .bind(&key.location_id)
            .bind(quantity)
            .bind(now)
            .execute(&mut *tx)
            .await?;
            written += 1;
        }

        tx.commit().await?;

        debug!(rows = written, "Balance rebuild complete");
        Ok(written)
    }

    async fn ledger_entries(&self, tenant_id: &str) -> DbResult<Vec<LedgerEntry>> {
        let entries = sqlx::query_as::<_, LedgerEntry>(
            r#"
            SELECT id, tenant_id, product_id, kind, from_location_id, to_location_id,
                   delta, total, actor_id, created_at
            FROM movements
            WHERE tenant_id = ?1
            "#,
        )
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }
}
