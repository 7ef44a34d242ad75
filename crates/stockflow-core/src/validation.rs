//! # Validation Module
//!
//! Structural validation for movement requests and listing parameters.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: THIS MODULE - structural rules per movement kind             │
//! │  ├── Required/forbidden location fields                                 │
//! │  ├── Magnitude sign rules                                               │
//! │  └── from ≠ to on Move                                                  │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Catalog lookups (stockflow-db)                                │
//! │  ├── Product belongs to tenant                                          │
//! │  └── Locations belong to tenant (via warehouse)                         │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                             │
//! │  ├── NOT NULL / CHECK(quantity >= 0) constraints                        │
//! │  └── Foreign key constraints                                            │
//! │                                                                         │
//! │  Any failure in layers 1-2 short-circuits: nothing is written.          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use stockflow_core::types::MovementRequest;
//! use stockflow_core::validation::validate_movement;
//!
//! let req = MovementRequest::add("prod-1", "loc-1", 25);
//! validate_movement(&req).unwrap();
//! ```

use crate::error::ValidationError;
use crate::types::{MovementKind, MovementRequest};
use crate::MAX_PAGE_SIZE;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Movement Validation
// =============================================================================

/// Validates the structure of a movement request.
///
/// ## Rules
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
/// Referential checks (does the product/location exist in the tenant) are a
/// separate layer - see `CatalogRepository` in stockflow-db.
pub fn validate_movement(request: &MovementRequest) -> ValidationResult<()> {
    let kind = request.kind.name();

    match request.kind {
        MovementKind::Add => {
            require(&request.location_id, "locationId", kind)?;
            forbid(&request.from_location_id, "fromLocationId", kind)?;
            forbid(&request.to_location_id, "toLocationId", kind)?;
            if request.magnitude < 0 {
                return Err(ValidationError::MustBeNonNegative { field: "magnitude" });
            }
        }
        MovementKind::Withdraw => {
            require(&request.location_id, "locationId", kind)?;
            forbid(&request.from_location_id, "fromLocationId", kind)?;
            forbid(&request.to_location_id, "toLocationId", kind)?;
            if request.magnitude <= 0 {
                return Err(ValidationError::MustBePositive { field: "magnitude" });
            }
        }
        MovementKind::Reconcile => {
            require(&request.location_id, "locationId", kind)?;
            forbid(&request.from_location_id, "fromLocationId", kind)?;
            forbid(&request.to_location_id, "toLocationId", kind)?;
            // Magnitude is the target balance here, so zero is legitimate
            if request.magnitude < 0 {
                return Err(ValidationError::MustBeNonNegative { field: "target" });
            }
        }
        MovementKind::Move => {
            require(&request.from_location_id, "fromLocationId", kind)?;
            require(&request.to_location_id, "toLocationId", kind)?;
            forbid(&request.location_id, "locationId", kind)?;
            if request.magnitude <= 0 {
                return Err(ValidationError::MustBePositive { field: "magnitude" });
            }
            if request.from_location_id == request.to_location_id {
                return Err(ValidationError::SameSourceAndDestination);
            }
        }
    }

    Ok(())
}

fn require(
    value: &Option<String>,
    field: &'static str,
    kind: &'static str,
) -> ValidationResult<()> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(()),
        _ => Err(ValidationError::Required { field, kind }),
    }
}

fn forbid(
    value: &Option<String>,
    field: &'static str,
    kind: &'static str,
) -> ValidationResult<()> {
    if value.is_some() {
        return Err(ValidationError::Forbidden { field, kind });
    }
    Ok(())
}

// =============================================================================
// Pagination Validation
// =============================================================================

/// Validates a 1-based page number.
pub fn validate_page(page: u32) -> ValidationResult<()> {
    if page < 1 {
        return Err(ValidationError::OutOfRange {
            field: "page",
            min: 1,
            max: i64::from(u32::MAX),
        });
    }

    Ok(())
}

/// Validates a page size against the listing bound.
///
/// ## Rules
/// - Must be at least 1
/// - Must not exceed [`MAX_PAGE_SIZE`] (100)
pub fn validate_page_size(page_size: u32) -> ValidationResult<()> {
    if page_size < 1 || page_size > MAX_PAGE_SIZE {
        return Err(ValidationError::OutOfRange {
            field: "pageSize",
            min: 1,
            max: i64::from(MAX_PAGE_SIZE),
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MovementRequest;

    #[test]
    fn test_add_rules() {
        assert!(validate_movement(&MovementRequest::add("p", "loc", 25)).is_ok());
        // Zero is a legal Add magnitude
        assert!(validate_movement(&MovementRequest::add("p", "loc", 0)).is_ok());

        let mut req = MovementRequest::add("p", "loc", -1);
        assert!(matches!(
            validate_movement(&req),
            Err(ValidationError::MustBeNonNegative { .. })
        ));

        req = MovementRequest::add("p", "loc", 5);
        req.from_location_id = Some("other".to_string());
        assert!(matches!(
            validate_movement(&req),
            Err(ValidationError::Forbidden { .. })
        ));

        req = MovementRequest::add("p", "loc", 5);
        req.location_id = None;
        assert!(matches!(
            validate_movement(&req),
            Err(ValidationError::Required { .. })
        ));
    }

    #[test]
    fn test_withdraw_requires_positive_magnitude() {
        assert!(validate_movement(&MovementRequest::withdraw("p", "loc", 1)).is_ok());
        assert!(matches!(
            validate_movement(&MovementRequest::withdraw("p", "loc", 0)),
            Err(ValidationError::MustBePositive { .. })
        ));
        assert!(matches!(
            validate_movement(&MovementRequest::withdraw("p", "loc", -3)),
            Err(ValidationError::MustBePositive { .. })
        ));
    }

    #[test]
    fn test_reconcile_target_zero_is_valid() {
        assert!(validate_movement(&MovementRequest::reconcile("p", "loc", 0)).is_ok());
        assert!(validate_movement(&MovementRequest::reconcile("p", "loc", 60)).is_ok());
        assert!(matches!(
            validate_movement(&MovementRequest::reconcile("p", "loc", -1)),
            Err(ValidationError::MustBeNonNegative { .. })
        ));
    }

    #[test]
    fn test_move_rules() {
        assert!(validate_movement(&MovementRequest::transfer("p", "a", "b", 25)).is_ok());

        // Same source and destination is rejected before any storage access
        assert!(matches!(
            validate_movement(&MovementRequest::transfer("p", "a", "a", 25)),
            Err(ValidationError::SameSourceAndDestination)
        ));

        assert!(matches!(
            validate_movement(&MovementRequest::transfer("p", "a", "b", 0)),
            Err(ValidationError::MustBePositive { .. })
        ));

        let mut req = MovementRequest::transfer("p", "a", "b", 25);
        req.location_id = Some("c".to_string());
        assert!(matches!(
            validate_movement(&req),
            Err(ValidationError::Forbidden { .. })
        ));

        req = MovementRequest::transfer("p", "a", "b", 25);
        req.to_location_id = None;
        assert!(matches!(
            validate_movement(&req),
            Err(ValidationError::Required { .. })
        ));
    }

    #[test]
    fn test_blank_location_counts_as_missing() {
        let mut req = MovementRequest::add("p", "  ", 5);
        assert!(matches!(
            validate_movement(&req),
            Err(ValidationError::Required { .. })
        ));
        req.location_id = Some(String::new());
        assert!(validate_movement(&req).is_err());
    }

    #[test]
    fn test_pagination_bounds() {
        assert!(validate_page(1).is_ok());
        assert!(validate_page(0).is_err());

        assert!(validate_page_size(1).is_ok());
        assert!(validate_page_size(100).is_ok());
        assert!(validate_page_size(0).is_err());
        assert!(validate_page_size(101).is_err());
    }
}
