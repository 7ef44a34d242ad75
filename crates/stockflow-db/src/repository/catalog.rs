//! # Catalog Repository
//!
//! Referential-integrity lookups over warehouses, locations, and products.
//!
//! ## Scope
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                   What Lives Here (and what doesn't)                    │
//! │                                                                         │
//! │  Catalog lifecycle (rename, deactivate, delete-when-empty) belongs to  │
//! │  an external collaborator. The movement engine only needs two          │
//! │  questions answered before it touches a balance:                       │
//! │                                                                         │
//! │    1. Does this product exist in this tenant?                          │
//! │    2. Does this location exist in this tenant (via its warehouse)?     │
//! │                                                                         │
//! │  The create_* helpers exist for seeding and tests; they are not a      │
//! │  management API.                                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use stockflow_core::{Location, Product, Warehouse, DEFAULT_LOW_STOCK_THRESHOLD};

/// Repository for catalog lookups and seeding.
#[derive(Debug, Clone)]
pub struct CatalogRepository {
    pool: SqlitePool,
}

impl CatalogRepository {
    /// Creates a new CatalogRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CatalogRepository { pool }
    }

    // =========================================================================
    // Lookups (used by the movement engine)
    // =========================================================================

    /// Gets a product by ID, scoped to the tenant.
    ///
    /// A product owned by another tenant is indistinguishable from an absent
    /// one - both return `None`.
    pub async fn get_product(&self, tenant_id: &str, product_id: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, tenant_id, sku, name, low_stock_threshold, created_at
            FROM products
            WHERE id = ?1 AND tenant_id = ?2
            "#,
        )
        .bind(product_id)
        .bind(tenant_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Checks whether a location exists and belongs to the tenant.
    ///
    /// Ownership is derived through the location's warehouse; locations carry
    /// no tenant_id of their own.
    pub async fn location_in_tenant(&self, tenant_id: &str, location_id: &str) -> DbResult<bool> {
        let exists: i64 = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1
                FROM locations l
                INNER JOIN warehouses w ON w.id = l.warehouse_id
                WHERE l.id = ?1 AND w.tenant_id = ?2
            )
            "#,
        )
        .bind(location_id)
        .bind(tenant_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists != 0)
    }

    /// Gets a warehouse by ID, scoped to the tenant.
    pub async fn get_warehouse(
        &self,
        tenant_id: &str,
        warehouse_id: &str,
    ) -> DbResult<Option<Warehouse>> {
        let warehouse = sqlx::query_as::<_, Warehouse>(
            r#"
            SELECT id, tenant_id, name, created_at
            FROM warehouses
            WHERE id = ?1 AND tenant_id = ?2
            "#,
        )
        .bind(warehouse_id)
        .bind(tenant_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(warehouse)
    }

    // =========================================================================
    // Seed / test helpers
    // =========================================================================

    /// Inserts a warehouse with a generated ID.
    pub async fn create_warehouse(&self, tenant_id: &str, name: &str) -> DbResult<Warehouse> {
        let warehouse = Warehouse {
            id: Uuid::new_v4().to_string(),
            tenant_id: tenant_id.to_string(),
            name: name.to_string(),
            created_at: Utc::now(),
        };

        debug!(id = %warehouse.id, name = %name, "Creating warehouse");

        sqlx::query(
            r#"
            INSERT INTO warehouses (id, tenant_id, name, created_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(&warehouse.id)
        .bind(&warehouse.tenant_id)
        .bind(&warehouse.name)
        .bind(warehouse.created_at)
        .execute(&self.pool)
        .await?;

        Ok(warehouse)
    }

    /// Inserts a location with a generated ID.
    pub async fn create_location(&self, warehouse_id: &str, name: &str) -> DbResult<Location> {
        let location = Location {
            id: Uuid::new_v4().to_string(),
            warehouse_id: warehouse_id.to_string(),
            name: name.to_string(),
            created_at: Utc::now(),
        };

        debug!(id = %location.id, name = %name, "Creating location");

        sqlx::query(
            r#"
            INSERT INTO locations (id, warehouse_id, name, created_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(&location.id)
        .bind(&location.warehouse_id)
        .bind(&location.name)
        .bind(location.created_at)
        .execute(&self.pool)
        .await?;

        Ok(location)
    }

    /// Inserts a product with a generated ID.
    ///
    /// `low_stock_threshold` of `None` falls back to the default (0: report
    /// only when completely out of stock).
    pub async fn create_product(
        &self,
        tenant_id: &str,
        sku: &str,
        name: &str,
        low_stock_threshold: Option<i64>,
    ) -> DbResult<Product> {
        let product = Product {
            id: Uuid::new_v4().to_string(),
            tenant_id: tenant_id.to_string(),
            sku: sku.to_string(),
            name: name.to_string(),
            low_stock_threshold: low_stock_threshold.unwrap_or(DEFAULT_LOW_STOCK_THRESHOLD),
            created_at: Utc::now(),
        };

        debug!(id = %product.id, sku = %sku, "Creating product");

        sqlx::query(
            r#"
            INSERT INTO products (id, tenant_id, sku, name, low_stock_threshold, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&product.id)
        .bind(&product.tenant_id)
        .bind(&product.sku)
        .bind(&product.name)
        .bind(product.low_stock_threshold)
        .bind(product.created_at)
        .execute(&self.pool)
        .await?;

        Ok(product)
    }
}
