//! # stockflow-core: Pure Business Logic for the Stock Movement Engine
//!
//! This crate is the **heart** of the movement engine. It contains the domain
//! types, validation rules, and ledger arithmetic as pure functions with zero
//! I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Stockflow Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              Service Layer (HTTP, out of scope)                 │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ in-process calls                       │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    stockflow-db                                 │   │
//! │  │      MovementEngine, BalanceRepository, MovementRepository      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ stockflow-core (THIS CRATE) ★                   │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │validation │  │  rebuild  │  │   error   │  │   │
//! │  │   │ Movement  │  │ per-kind  │  │ ledger    │  │ CoreError │  │   │
//! │  │   │ Ledger    │  │ rules     │  │ fold      │  │ Validation│  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (MovementRequest, LedgerEntry, Balance, etc.)
//! - [`validation`] - Structural rules per movement kind
//! - [`rebuild`] - Pure fold of the ledger into per-key balances
//! - [`error`] - Domain error types
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Integer Quantities**: Stock levels are whole units (i64), never floats
//! 4. **Explicit Errors**: All errors are typed, never strings or panics

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod rebuild;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use stockflow_core::LedgerEntry` instead of
// `use stockflow_core::types::LedgerEntry`

pub use error::{CoreError, CoreResult, ValidationError};
pub use rebuild::rebuild_balances;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum page size for movement listings.
///
/// ## Business Reason
/// Bounds the cost of a single ledger read; the service layer paginates
/// anything larger.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Default page size used when the caller does not specify one.
pub const DEFAULT_PAGE_SIZE: u32 = 50;

/// Default low-stock threshold for products that never configured one.
///
/// ## Business Reason
/// Zero means "report only when completely out of stock", which is the
/// conservative default for newly created products.
pub const DEFAULT_LOW_STOCK_THRESHOLD: i64 = 0;
