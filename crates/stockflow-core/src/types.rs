//! # Domain Types
//!
//! Core domain types for the stock movement engine.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │ MovementRequest │   │   LedgerEntry   │   │     Balance     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  product_id     │   │  id (UUID)      │   │  tenant_id      │       │
//! │  │  kind           │   │  kind (5-way)   │   │  product_id     │       │
//! │  │  magnitude      │   │  delta (signed) │   │  location_id    │       │
//! │  │  location(s)    │   │  total (after)  │   │  quantity ≥ 0   │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │  MovementKind   │   │ LedgerEntryKind │   │  LowStockItem   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  Add            │   │  Add            │   │  product_id     │       │
//! │  │  Withdraw       │   │  Withdraw       │   │  threshold      │       │
//! │  │  Move           │   │  MoveSubtract   │   │  on_hand        │       │
//! │  │  Reconcile      │   │  MoveAdd        │   └─────────────────┘       │
//! │  └─────────────────┘   │  Reconcile      │                             │
//! │                        └─────────────────┘                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Request Kind vs Ledger Kind
//! A caller asks for one of four movements. A logical Move is decomposed into
//! two ledger entries (subtract at source, add at destination), so the
//! persisted kind is a five-way enum.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// Movement Kind (request-level)
// =============================================================================

/// The movement a caller requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementKind {
    /// Stock arrives at a location.
    Add,
    /// Stock leaves a location.
    Withdraw,
    /// Stock transfers between two locations of the tenant.
    Move,
    /// Balance is set to an absolute target (stock count correction).
    Reconcile,
}

impl MovementKind {
    /// Human-readable name used in validation messages.
    pub const fn name(&self) -> &'static str {
        match self {
            MovementKind::Add => "Add",
            MovementKind::Withdraw => "Withdraw",
            MovementKind::Move => "Move",
            MovementKind::Reconcile => "Reconcile",
        }
    }
}

// =============================================================================
// Ledger Entry Kind (persisted)
// =============================================================================

/// The kind recorded on a ledger entry.
///
/// Move is never persisted as-is: it always becomes a `MoveSubtract` entry at
/// the source and a `MoveAdd` entry at the destination, written in the same
/// transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum LedgerEntryKind {
    Add,
    Withdraw,
    MoveSubtract,
    MoveAdd,
    Reconcile,
}

// =============================================================================
// Movement Request
// =============================================================================

/// A movement request as supplied by the caller. Not persisted.
///
/// ## Field Rules (enforced by [`crate::validation::validate_movement`])
/// ```text
/// ┌───────────┬───────────────────┬────────────────┬──────────────────┐
/// │ Kind      │ Required          │ Forbidden      │ Magnitude        │
/// ├───────────┼───────────────────┼────────────────┼──────────────────┤
/// │ Add       │ location_id       │ from, to       │ ≥ 0              │
/// │ Withdraw  │ location_id       │ from, to       │ > 0              │
/// │ Reconcile │ location_id       │ from, to       │ target ≥ 0       │
/// │ Move      │ from, to          │ location_id    │ > 0; from ≠ to   │
/// └───────────┴───────────────────┴────────────────┴──────────────────┘
/// ```
///
/// For Reconcile the magnitude is the *target balance*, not a delta, so zero
/// is valid and meaningful (reconciling to empty).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovementRequest {
    /// Product being moved.
    pub product_id: String,

    /// What kind of movement this is.
    pub kind: MovementKind,

    /// Non-negative magnitude; its meaning depends on the kind.
    pub magnitude: i64,

    /// Location for Add/Withdraw/Reconcile.
    pub location_id: Option<String>,

    /// Source location for Move.
    pub from_location_id: Option<String>,

    /// Destination location for Move.
    pub to_location_id: Option<String>,
}

impl MovementRequest {
    /// Builds an Add request.
    pub fn add(product_id: impl Into<String>, location_id: impl Into<String>, magnitude: i64) -> Self {
        MovementRequest {
            product_id: product_id.into(),
            kind: MovementKind::Add,
            magnitude,
            location_id: Some(location_id.into()),
            from_location_id: None,
            to_location_id: None,
        }
    }

    /// Builds a Withdraw request.
    pub fn withdraw(
        product_id: impl Into<String>,
        location_id: impl Into<String>,
        magnitude: i64,
    ) -> Self {
        MovementRequest {
            product_id: product_id.into(),
            kind: MovementKind::Withdraw,
            magnitude,
            location_id: Some(location_id.into()),
            from_location_id: None,
            to_location_id: None,
        }
    }

    /// Builds a Move request.
    pub fn transfer(
        product_id: impl Into<String>,
        from_location_id: impl Into<String>,
        to_location_id: impl Into<String>,
        magnitude: i64,
    ) -> Self {
        MovementRequest {
            product_id: product_id.into(),
            kind: MovementKind::Move,
            magnitude,
            location_id: None,
            from_location_id: Some(from_location_id.into()),
            to_location_id: Some(to_location_id.into()),
        }
    }

    /// Builds a Reconcile request; `target` is the absolute balance to set.
    pub fn reconcile(
        product_id: impl Into<String>,
        location_id: impl Into<String>,
        target: i64,
    ) -> Self {
        MovementRequest {
            product_id: product_id.into(),
            kind: MovementKind::Reconcile,
            magnitude: target,
            location_id: Some(location_id.into()),
            from_location_id: None,
            to_location_id: None,
        }
    }
}

// =============================================================================
// Ledger Entry
// =============================================================================

/// One immutable record of a signed quantity change.
///
/// Entries are append-only: never updated, never deleted. The materialized
/// balance for any key equals the sum of its entries' deltas, and `total` is
/// the balance at the entry's own location immediately after the entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct LedgerEntry {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Tenant this entry belongs to.
    pub tenant_id: String,

    /// Product whose balance changed.
    pub product_id: String,

    /// Persisted movement kind (Move decomposed).
    pub kind: LedgerEntryKind,

    /// Source location (Withdraw, MoveSubtract, MoveAdd).
    pub from_location_id: Option<String>,

    /// Destination location (Add, Reconcile, MoveSubtract, MoveAdd).
    pub to_location_id: Option<String>,

    /// Signed quantity change. Negative only for Withdraw, MoveSubtract,
    /// and downward Reconcile.
    pub delta: i64,

    /// Balance at [`Self::balance_location`] after this entry.
    pub total: i64,

    /// Who performed the movement.
    pub actor_id: String,

    /// When the entry was created.
    pub created_at: DateTime<Utc>,
}

impl LedgerEntry {
    /// The location whose balance `total` and `delta` refer to.
    ///
    /// Both halves of a Move carry both location ids; each half governs the
    /// balance of exactly one side.
    pub fn balance_location(&self) -> Option<&str> {
        match self.kind {
            LedgerEntryKind::Withdraw | LedgerEntryKind::MoveSubtract => {
                self.from_location_id.as_deref()
            }
            LedgerEntryKind::Add | LedgerEntryKind::MoveAdd | LedgerEntryKind::Reconcile => {
                self.to_location_id.as_deref()
            }
        }
    }

    /// The balance key this entry contributes to, if its location is set.
    pub fn balance_key(&self) -> Option<BalanceKey> {
        self.balance_location().map(|location_id| BalanceKey {
            tenant_id: self.tenant_id.clone(),
            product_id: self.product_id.clone(),
            location_id: location_id.to_string(),
        })
    }
}

// =============================================================================
// Balance
// =============================================================================

/// Identifies one balance row: (tenant, product, location).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BalanceKey {
    pub tenant_id: String,
    pub product_id: String,
    pub location_id: String,
}

/// Current quantity of a product at a location within a tenant.
///
/// Materialized cache of the ledger: `quantity` equals the sum of deltas of
/// all entries for this key, and is never negative after a committed
/// movement. Created lazily on first movement referencing the key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Balance {
    pub tenant_id: String,
    pub product_id: String,
    pub location_id: String,
    /// Current quantity, always ≥ 0.
    pub quantity: i64,
    /// When this row was last written.
    pub updated_at: DateTime<Utc>,
}

impl Balance {
    /// Returns the key of this balance row.
    pub fn key(&self) -> BalanceKey {
        BalanceKey {
            tenant_id: self.tenant_id.clone(),
            product_id: self.product_id.clone(),
            location_id: self.location_id.clone(),
        }
    }
}

// =============================================================================
// Catalog Types
// =============================================================================
// Catalog lifecycle is a collaborator concern; these types exist for
// referential-integrity checks, seeding, and tests.

/// A product owned by a tenant.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    pub id: String,
    pub tenant_id: String,
    /// Stock Keeping Unit - business identifier.
    pub sku: String,
    pub name: String,
    /// Warehouse-wide on-hand at or below this value counts as low stock.
    pub low_stock_threshold: i64,
    pub created_at: DateTime<Utc>,
}

/// A warehouse owned by a tenant.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Warehouse {
    pub id: String,
    pub tenant_id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// A storage location inside a warehouse.
///
/// Tenant ownership is derived through the warehouse; locations have no
/// tenant_id of their own.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Location {
    pub id: String,
    pub warehouse_id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Listing & Aggregation Types
// =============================================================================

/// Filterable, paginated ledger query.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MovementQuery {
    /// 1-based page number.
    pub page: u32,
    /// Entries per page, 1..=100.
    pub page_size: u32,
    /// Restrict to one product.
    pub product_id: Option<String>,
    /// Restrict to entries touching this location (from OR to side).
    pub location_id: Option<String>,
}

impl MovementQuery {
    /// Query for the given page with the default page size and no filters.
    pub fn page(page: u32) -> Self {
        MovementQuery {
            page,
            page_size: crate::DEFAULT_PAGE_SIZE,
            product_id: None,
            location_id: None,
        }
    }
}

/// Pagination metadata echoed back with every listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub page_size: u32,
    /// Total entries matching the filter, across all pages.
    pub total: i64,
}

/// One page of ledger entries, newest first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovementPage {
    pub data: Vec<LedgerEntry>,
    pub pagination: Pagination,
}

/// One product whose warehouse-wide on-hand is at or below its threshold.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct LowStockItem {
    pub product_id: String,
    pub sku: String,
    pub name: String,
    pub low_stock_threshold: i64,
    /// Sum of balances across all locations of the queried warehouse.
    pub on_hand: i64,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(kind: LedgerEntryKind, from: Option<&str>, to: Option<&str>) -> LedgerEntry {
        LedgerEntry {
            id: "e1".to_string(),
            tenant_id: "t1".to_string(),
            product_id: "p1".to_string(),
            kind,
            from_location_id: from.map(String::from),
            to_location_id: to.map(String::from),
            delta: 0,
            total: 0,
            actor_id: "u1".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_balance_location_per_kind() {
        let add = entry(LedgerEntryKind::Add, None, Some("loc-a"));
        assert_eq!(add.balance_location(), Some("loc-a"));

        let withdraw = entry(LedgerEntryKind::Withdraw, Some("loc-a"), None);
        assert_eq!(withdraw.balance_location(), Some("loc-a"));

        // Both move halves carry both locations but govern opposite sides
        let sub = entry(LedgerEntryKind::MoveSubtract, Some("loc-a"), Some("loc-b"));
        assert_eq!(sub.balance_location(), Some("loc-a"));

        let mv_add = entry(LedgerEntryKind::MoveAdd, Some("loc-a"), Some("loc-b"));
        assert_eq!(mv_add.balance_location(), Some("loc-b"));

        let rec = entry(LedgerEntryKind::Reconcile, None, Some("loc-a"));
        assert_eq!(rec.balance_location(), Some("loc-a"));
    }

    #[test]
    fn test_request_builders() {
        let req = MovementRequest::add("p1", "loc-a", 25);
        assert_eq!(req.kind, MovementKind::Add);
        assert_eq!(req.location_id.as_deref(), Some("loc-a"));
        assert!(req.from_location_id.is_none());

        let req = MovementRequest::transfer("p1", "loc-a", "loc-b", 10);
        assert_eq!(req.kind, MovementKind::Move);
        assert!(req.location_id.is_none());
        assert_eq!(req.from_location_id.as_deref(), Some("loc-a"));
        assert_eq!(req.to_location_id.as_deref(), Some("loc-b"));
    }

    #[test]
    fn test_kind_serde_snake_case() {
        let json = serde_json::to_string(&LedgerEntryKind::MoveSubtract).unwrap();
        assert_eq!(json, r#""move_subtract""#);

        let kind: MovementKind = serde_json::from_str(r#""reconcile""#).unwrap();
        assert_eq!(kind, MovementKind::Reconcile);
    }
}
