//! # Repository Module
//!
//! Database repository implementations for the stock movement engine.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Responsibilities                          │
//! │                                                                         │
//! │  MovementEngine                                                        │
//! │       │                                                                 │
//! │       ├── CatalogRepository   referential checks before the txn        │
//! │       ├── BalanceRepository   guarded updates inside the txn           │
//! │       └── MovementRepository  ledger append inside the txn             │
//! │                                                                         │
//! │  Query Service (reads, no invariants)                                  │
//! │       ├── MovementRepository::list   paginated, filterable             │
//! │       └── BalanceRepository::get / list_for_tenant                     │
//! │                                                                         │
//! │  SQL is isolated here; the engine composes it, core never sees it.     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`balance::BalanceRepository`] - balance reads, guarded mutations, rebuild
//! - [`movement::MovementRepository`] - ledger append and listings
//! - [`catalog::CatalogRepository`] - product/location ownership lookups

pub mod balance;
pub mod catalog;
pub mod movement;
