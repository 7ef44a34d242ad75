//! # Error Types
//!
//! Domain-specific error types for stockflow-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  stockflow-core errors (this file)                                     │
//! │  ├── CoreError        - Referential and business-conflict errors       │
//! │  └── ValidationError  - Structural request failures                    │
//! │                                                                         │
//! │  stockflow-db errors (separate crate)                                  │
//! │  ├── DbError          - Storage/transaction failures                   │
//! │  └── EngineError      - Union surfaced by the movement engine          │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → EngineError → service layer       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (ids, quantities)
//! 3. Errors are enum variants, never String
//! 4. Every error path leaves storage untouched - the engine aborts before
//!    or rolls back after, never in between

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Domain errors for movement recording.
///
/// These map one-to-one onto the failure taxonomy the service layer exposes:
/// not-found, invalid-request, and insufficient-inventory conflicts.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Product doesn't exist or belongs to a different tenant.
    ///
    /// ## When This Occurs
    /// - Product ID doesn't exist at all
    /// - Product exists but is owned by another tenant (never leaked as a
    ///   distinct case - cross-tenant probing must look identical to absence)
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Location doesn't exist or belongs to a different tenant.
    ///
    /// Tenant ownership of a location is derived through its warehouse.
    #[error("Location not found: {0}")]
    LocationNotFound(String),

    /// Warehouse doesn't exist or belongs to a different tenant.
    ///
    /// Surfaced by the low-stock query, which is scoped to one warehouse.
    #[error("Warehouse not found: {0}")]
    WarehouseNotFound(String),

    /// Not enough stock at a location to satisfy a withdrawal or move.
    ///
    /// ## When This Occurs
    /// - Withdraw magnitude exceeds the current balance
    /// - Move magnitude exceeds the source balance
    ///
    /// ## Caller Workflow
    /// ```text
    /// Withdraw 50 from location L
    ///      │
    ///      ▼
    /// Balance at L is 20
    ///      │
    ///      ▼
    /// InsufficientInventory { location_id: L, available: 20, requested: 50 }
    ///      │
    ///      ▼
    /// Caller retries with a smaller magnitude or waits for stock
    /// ```
    #[error("Insufficient inventory at {location_id}: available {available}, requested {requested}")]
    InsufficientInventory {
        location_id: String,
        available: i64,
        requested: i64,
    },

    /// Structural validation failure (wraps ValidationError).
    #[error("Invalid movement request: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Structural movement-request failures.
///
/// These are detected before any storage access; nothing is read or written
/// when one of these is returned.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A field the movement kind requires is missing.
    #[error("{field} is required for {kind} movements")]
    Required { field: &'static str, kind: &'static str },

    /// A field the movement kind forbids is present.
    #[error("{field} must not be set for {kind} movements")]
    Forbidden { field: &'static str, kind: &'static str },

    /// Magnitude must be strictly positive for this kind.
    #[error("{field} must be positive")]
    MustBePositive { field: &'static str },

    /// Magnitude must be zero or greater for this kind.
    #[error("{field} must not be negative")]
    MustBeNonNegative { field: &'static str },

    /// Move source and destination are the same location.
    #[error("fromLocationId and toLocationId must differ")]
    SameSourceAndDestination,

    /// Numeric value is out of range (pagination bounds).
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: &'static str, min: i64, max: i64 },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
