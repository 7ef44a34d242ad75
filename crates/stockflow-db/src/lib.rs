//! # stockflow-db: Database Layer + Movement Engine
//!
//! This crate provides persistence and the transactional movement engine for
//! the stockflow system. It uses SQLite for storage with sqlx for async
//! operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Stockflow Data Flow                              │
//! │                                                                         │
//! │  Service layer call (record_movement)                                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   stockflow-db (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │ MovementEngine│    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │  (engine.rs)  │    │  (embedded)  │  │   │
//! │  │   │               │    │               │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ one txn per   │    │ 001_init.sql │  │   │
//! │  │   │ WAL, FKs on   │    │ movement      │    │              │  │   │
//! │  │   └───────────────┘    └───────┬───────┘    └──────────────┘  │   │
//! │  │                                │                               │   │
//! │  │   ┌────────────────────────────▼────────────────────────────┐ │   │
//! │  │   │ repositories: balance / movement (ledger) / catalog     │ │   │
//! │  │   └─────────────────────────────────────────────────────────┘ │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite database (balances + append-only movements ledger)             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`engine`] - The movement engine (atomic record + low-stock query)
//! - [`repository`] - Balance store, ledger, catalog lookups
//!
//! ## Usage
//!
//! ```rust,ignore
//! use stockflow_db::{Database, DbConfig};
//! use stockflow_core::MovementRequest;
//!
//! let db = Database::new(DbConfig::new("path/to/stockflow.db")).await?;
//!
//! let entry = db
//!     .engine()
//!     .record_movement(tenant_id, actor_id, &MovementRequest::add(product, location, 25))
//!     .await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod engine;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use engine::{EngineError, MovementEngine};
pub use error::DbError;
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::balance::BalanceRepository;
pub use repository::catalog::CatalogRepository;
pub use repository::movement::MovementRepository;
