//! # Movement Engine
//!
//! Orchestrates validate → check references → compute → atomically persist.
//!
//! ## The Movement Transaction
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    record_movement(tenant, actor, request)              │
//! │                                                                         │
//! │  1. Structural validation (stockflow-core)      ── no storage access   │
//! │  2. Referential checks (catalog repository)     ── reads only          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   SINGLE TRANSACTION                            │   │
//! │  │                                                                 │   │
//! │  │  3. Ensure balance row(s) exist (lazy creation, promotes       │   │
//! │  │     the transaction to a write transaction up front)           │   │
//! │  │  4. Guarded balance update(s) - read-check-write is one        │   │
//! │  │     atomic statement per key                                   │   │
//! │  │  5. Append matching ledger entry / entries                     │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  COMMIT ← ledger and balances change together or not at all            │
//! │                                                                         │
//! │  Any failure at any step: the transaction is dropped and rolls back.   │
//! │  No "failed attempt" rows, no partial writes, nothing to clean up.     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Move and Lock Ordering
//! A Move touches two balance rows. Both rows are created and updated in
//! canonical (sorted-key) order so two moves in opposite directions can
//! never deadlock on a backend with row-level locks; under SQLite the
//! single-writer model already serializes them, and the ordering keeps the
//! discipline portable.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::error::DbError;
use crate::repository::balance::BalanceRepository;
use crate::repository::catalog::CatalogRepository;
use crate::repository::movement::MovementRepository;
use stockflow_core::validation::validate_movement;
use stockflow_core::{
    CoreError, LedgerEntry, LedgerEntryKind, LowStockItem, MovementKind, MovementRequest,
    ValidationError,
};

// =============================================================================
// Engine Error
// =============================================================================

/// Union error surfaced by the movement engine.
///
/// `Domain` failures are the caller's to fix (bad request, missing
/// references, insufficient inventory); `Storage` failures are transient and
/// safe to blindly retry because the transaction never half-commits.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Domain(#[from] CoreError),

    #[error(transparent)]
    Storage(#[from] DbError),
}

impl From<ValidationError> for EngineError {
    fn from(err: ValidationError) -> Self {
        EngineError::Domain(CoreError::Validation(err))
    }
}

// =============================================================================
// Movement Engine
// =============================================================================

/// The movement engine: records movements and answers the low-stock query.
#[derive(Debug, Clone)]
pub struct MovementEngine {
    pool: SqlitePool,
}

impl MovementEngine {
    /// Creates a new MovementEngine.
    pub fn new(pool: SqlitePool) -> Self {
        MovementEngine { pool }
    }

    /// Records one movement atomically and returns its ledger entry.
    ///
    /// For Move the returned entry is the `move_add` half - the successful
    /// destination-side effect the caller is told about.
    ///
    /// ## Failure Semantics
    /// Validation, referential, and insufficient-inventory failures abort
    /// with zero observable side effects. Retries are the caller's decision;
    /// the engine does not deduplicate repeated requests.
    pub async fn record_movement(
        &self,
        tenant_id: &str,
        actor_id: &str,
        request: &MovementRequest,
    ) -> Result<LedgerEntry, EngineError> {
        validate_movement(request)?;
        self.check_references(tenant_id, request).await?;

        debug!(
            tenant_id = %tenant_id,
            product_id = %request.product_id,
            kind = ?request.kind,
            magnitude = request.magnitude,
            "Recording movement"
        );

        let mut tx = self.pool.begin().await.map_err(DbError::from)?;

        let entry = match request.kind {
            MovementKind::Add => {
                let location = required_location(&request.location_id, "locationId", request.kind)?;
                self.apply_single(
                    &mut tx,
                    tenant_id,
                    actor_id,
                    request,
                    location,
                    LedgerEntryKind::Add,
                    request.magnitude,
                )
                .await?
            }
            MovementKind::Withdraw => {
                let location = required_location(&request.location_id, "locationId", request.kind)?;
                self.apply_single(
                    &mut tx,
                    tenant_id,
                    actor_id,
                    request,
                    location,
                    LedgerEntryKind::Withdraw,
                    -request.magnitude,
                )
                .await?
            }
            MovementKind::Move => self.apply_move(&mut tx, tenant_id, actor_id, request).await?,
            MovementKind::Reconcile => {
                self.apply_reconcile(&mut tx, tenant_id, actor_id, request)
                    .await?
            }
        };

        tx.commit().await.map_err(DbError::from)?;

        debug!(entry_id = %entry.id, total = entry.total, "Movement committed");
        Ok(entry)
    }

    /// Products of the tenant whose on-hand across the warehouse's locations
    /// is at or below their configured threshold.
    ///
    /// Evaluated at read time, never maintained incrementally: a sum over
    /// the balances table joined against the warehouse's locations.
    pub async fn low_stock(
        &self,
        tenant_id: &str,
        warehouse_id: &str,
    ) -> Result<Vec<LowStockItem>, EngineError> {
        let catalog = CatalogRepository::new(self.pool.clone());
        catalog
            .get_warehouse(tenant_id, warehouse_id)
            .await?
            .ok_or_else(|| CoreError::WarehouseNotFound(warehouse_id.to_string()))?;

        let items = sqlx::query_as::<_, LowStockItem>(
            r#"
            SELECT p.id AS product_id,
                   p.sku,
                   p.name,
                   p.low_stock_threshold,
                   COALESCE(SUM(b.quantity), 0) AS on_hand
            FROM products p
            LEFT JOIN balances b
              ON b.product_id = p.id
             AND b.tenant_id = p.tenant_id
             AND b.location_id IN (SELECT id FROM locations WHERE warehouse_id = ?2)
            WHERE p.tenant_id = ?1
            GROUP BY p.id, p.sku, p.name, p.low_stock_threshold
            HAVING on_hand <= p.low_stock_threshold
            ORDER BY p.sku
            "#,
        )
        .bind(tenant_id)
        .bind(warehouse_id)
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::from)?;

        Ok(items)
    }

    // =========================================================================
    // Referential checks
    // =========================================================================

    /// Product belongs to the tenant; every referenced location belongs to
    /// the tenant via its warehouse. Runs before the transaction opens -
    /// nothing has been written yet when these fail.
    async fn check_references(
        &self,
        tenant_id: &str,
        request: &MovementRequest,
    ) -> Result<(), EngineError> {
        let catalog = CatalogRepository::new(self.pool.clone());

        catalog
            .get_product(tenant_id, &request.product_id)
            .await?
            .ok_or_else(|| CoreError::ProductNotFound(request.product_id.clone()))?;

        let referenced = [
            &request.location_id,
            &request.from_location_id,
            &request.to_location_id,
        ];
        for location_id in referenced.into_iter().flatten() {
            if !catalog.location_in_tenant(tenant_id, location_id).await? {
                return Err(CoreError::LocationNotFound(location_id.clone()).into());
            }
        }

        Ok(())
    }

    // =========================================================================
    // Per-kind algorithms (transaction-scoped)
    // =========================================================================

    /// Add / Withdraw: one guarded delta against one balance row.
    #[allow(clippy::too_many_arguments)]
    async fn apply_single(
        &self,
        tx: &mut SqliteConnection,
        tenant_id: &str,
        actor_id: &str,
        request: &MovementRequest,
        location_id: &str,
        kind: LedgerEntryKind,
        delta: i64,
    ) -> Result<LedgerEntry, EngineError> {
        BalanceRepository::ensure_row(tx, tenant_id, &request.product_id, location_id).await?;

        let total = self
            .guarded_delta(tx, tenant_id, &request.product_id, location_id, delta)
            .await?;

        let (from, to) = match kind {
            LedgerEntryKind::Withdraw => (Some(location_id.to_string()), None),
            _ => (None, Some(location_id.to_string())),
        };

        let entry = new_entry(
            tenant_id,
            actor_id,
            &request.product_id,
            kind,
            from,
            to,
            delta,
            total,
            Utc::now(),
        );
        MovementRepository::append(tx, &entry).await?;

        Ok(entry)
    }

    /// Move: two guarded deltas, two ledger entries, all-or-nothing.
    async fn apply_move(
        &self,
        tx: &mut SqliteConnection,
        tenant_id: &str,
        actor_id: &str,
        request: &MovementRequest,
    ) -> Result<LedgerEntry, EngineError> {
        let from = required_location(&request.from_location_id, "fromLocationId", request.kind)?;
        let to = required_location(&request.to_location_id, "toLocationId", request.kind)?;
        let magnitude = request.magnitude;

        // Canonical lock order: touch both rows sorted by location id
        let mut keyed = [(from, -magnitude), (to, magnitude)];
        keyed.sort_by_key(|(location, _)| *location);

        for (location, _) in keyed {
            BalanceRepository::ensure_row(tx, tenant_id, &request.product_id, location).await?;
        }

        let mut new_from = 0;
        let mut new_to = 0;
        for (location, delta) in keyed {
            let total = self
                .guarded_delta(tx, tenant_id, &request.product_id, location, delta)
                .await?;
            if delta < 0 {
                new_from = total;
            } else {
                new_to = total;
            }
        }

        // Both halves share product, locations, and timestamp; the subtract
        // half is appended first so insertion order mirrors causality.
        let created_at = Utc::now();
        let subtract = new_entry(
            tenant_id,
            actor_id,
            &request.product_id,
            LedgerEntryKind::MoveSubtract,
            Some(from.to_string()),
            Some(to.to_string()),
            -magnitude,
            new_from,
            created_at,
        );
        let add = new_entry(
            tenant_id,
            actor_id,
            &request.product_id,
            LedgerEntryKind::MoveAdd,
            Some(from.to_string()),
            Some(to.to_string()),
            magnitude,
            new_to,
            created_at,
        );

        MovementRepository::append(tx, &subtract).await?;
        MovementRepository::append(tx, &add).await?;

        Ok(add)
    }

    /// Reconcile: set the balance to an absolute target, recording the
    /// implied delta. The only kind whose recorded delta may be negative
    /// without an error, and for which magnitude 0 is meaningful.
    async fn apply_reconcile(
        &self,
        tx: &mut SqliteConnection,
        tenant_id: &str,
        actor_id: &str,
        request: &MovementRequest,
    ) -> Result<LedgerEntry, EngineError> {
        let location = required_location(&request.location_id, "locationId", request.kind)?;
        let target = request.magnitude;

        BalanceRepository::ensure_row(tx, tenant_id, &request.product_id, location).await?;

        let current =
            BalanceRepository::quantity_on(tx, tenant_id, &request.product_id, location).await?;

        // Written absolutely, not as an accumulated delta, so the balance
        // lands on the target exactly
        let total =
            BalanceRepository::set_absolute(tx, tenant_id, &request.product_id, location, target)
                .await?;

        let entry = new_entry(
            tenant_id,
            actor_id,
            &request.product_id,
            LedgerEntryKind::Reconcile,
            None,
            Some(location.to_string()),
            target - current,
            total,
            Utc::now(),
        );
        MovementRepository::append(tx, &entry).await?;

        Ok(entry)
    }

    /// Applies one guarded delta, translating a rejected guard into the
    /// insufficient-inventory conflict with the quantities the caller needs
    /// to act on it.
    async fn guarded_delta(
        &self,
        tx: &mut SqliteConnection,
        tenant_id: &str,
        product_id: &str,
        location_id: &str,
        delta: i64,
    ) -> Result<i64, EngineError> {
        match BalanceRepository::apply_delta(tx, tenant_id, product_id, location_id, delta).await? {
            Some(total) => Ok(total),
            None => {
                let available =
                    BalanceRepository::quantity_on(tx, tenant_id, product_id, location_id).await?;
                Err(CoreError::InsufficientInventory {
                    location_id: location_id.to_string(),
                    available,
                    requested: delta.abs(),
                }
                .into())
            }
        }
    }
}

/// Extracts a location field that validation already requires for the kind.
///
/// The apply paths run after [`validate_movement`], so a `None` here means a
/// request reached them unvalidated; surfacing the same Required error keeps
/// that bug visible instead of proceeding with an empty location id.
fn required_location<'a>(
    value: &'a Option<String>,
    field: &'static str,
    kind: MovementKind,
) -> Result<&'a str, EngineError> {
    match value.as_deref() {
        Some(location) => Ok(location),
        None => Err(ValidationError::Required {
            field,
            kind: kind.name(),
        }
        .into()),
    }
}

/// Builds a ledger entry with a fresh ID.
#[allow(clippy::too_many_arguments)]
fn new_entry(
    tenant_id: &str,
    actor_id: &str,
    product_id: &str,
    kind: LedgerEntryKind,
    from_location_id: Option<String>,
    to_location_id: Option<String>,
    delta: i64,
    total: i64,
    created_at: DateTime<Utc>,
) -> LedgerEntry {
    LedgerEntry {
        id: Uuid::new_v4().to_string(),
        tenant_id: tenant_id.to_string(),
        product_id: product_id.to_string(),
        kind,
        from_location_id,
        to_location_id,
        delta,
        total,
        actor_id: actor_id.to_string(),
        created_at,
    }
}
