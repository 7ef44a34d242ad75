//! # Movement Repository
//!
//! The ledger: append-only movement records, plus the paginated query
//! service over them.
//!
//! ## Append-Only Discipline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         The Ledger                                      │
//! │                                                                         │
//! │  INSERT ─── yes, inside the movement transaction only                   │
//! │  UPDATE ─── never                                                       │
//! │  DELETE ─── never                                                       │
//! │                                                                         │
//! │  Because rows are immutable, reads need no locking; ordering is        │
//! │  created_at DESC with rowid as the tiebreaker (insertion order).       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use stockflow_core::validation::{validate_page, validate_page_size};
use stockflow_core::{LedgerEntry, MovementPage, MovementQuery, Pagination};

/// Repository for ledger appends and movement listings.
#[derive(Debug, Clone)]
pub struct MovementRepository {
    pool: SqlitePool,
}

impl MovementRepository {
    /// Creates a new MovementRepository.
    pub fn new(pool: SqlitePool) -> Self {
        MovementRepository { pool }
    }

    /// Appends one ledger entry inside the movement transaction.
    ///
    /// Only the movement engine calls this; an entry written outside the
    /// transaction that also updates the balance would break the
    /// ledger/balance invariant.
    pub(crate) async fn append(conn: &mut SqliteConnection, entry: &LedgerEntry) -> DbResult<()> {
        debug!(
            id = %entry.id,
            kind = ?entry.kind,
            delta = entry.delta,
            "Appending ledger entry"
        );

        sqlx::query(
            r#"
            INSERT INTO movements (
                id, tenant_id, product_id, kind,
                from_location_id, to_location_id,
                delta, total, actor_id, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&entry.id)
        .bind(&entry.tenant_id)
        .bind(&entry.product_id)
        .bind(entry.kind)
        .bind(&entry.from_location_id)
        .bind(&entry.to_location_id)
        .bind(entry.delta)
        .bind(entry.total)
        .bind(&entry.actor_id)
        .bind(entry.created_at)
        .execute(conn)
        .await?;

        Ok(())
    }

    /// Lists movements for a tenant, newest first.
    ///
    /// ## Semantics
    /// - `page` is 1-based; `page_size` is bounded to 1..=100
    /// - `product_id` filter restricts to one product
    /// - `location_id` filter matches the from- OR the to-side of an entry
    /// - An out-of-range page returns an empty slice with the correct total
    pub async fn list(
        &self,
        tenant_id: &str,
        query: &MovementQuery,
    ) -> Result<MovementPage, crate::engine::EngineError> {
        validate_page(query.page)?;
        validate_page_size(query.page_size)?;

        let total = self.count(tenant_id, query).await?;

        let limit = i64::from(query.page_size);
        let offset = i64::from(query.page - 1) * limit;

        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
            r#"
            SELECT id, tenant_id, product_id, kind, from_location_id, to_location_id,
                   delta, total, actor_id, created_at
            FROM movements
            "#,
        );
        Self::push_filters(&mut builder, tenant_id, query);
        builder.push(" ORDER BY created_at DESC, rowid DESC LIMIT ");
        builder.push_bind(limit);
        builder.push(" OFFSET ");
        builder.push_bind(offset);

        let data = builder
            .build_query_as::<LedgerEntry>()
            .fetch_all(&self.pool)
            .await
            .map_err(crate::error::DbError::from)?;

        debug!(
            tenant_id = %tenant_id,
            page = query.page,
            returned = data.len(),
            total,
            "Listed movements"
        );

        Ok(MovementPage {
            data,
            pagination: Pagination {
                page: query.page,
                page_size: query.page_size,
                total,
            },
        })
    }

    /// Total entries matching the filter, across all pages.
    async fn count(&self, tenant_id: &str, query: &MovementQuery) -> DbResult<i64> {
        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT COUNT(*) FROM movements");
        Self::push_filters(&mut builder, tenant_id, query);

        let total: i64 = builder
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;

        Ok(total)
    }

    fn push_filters<'a>(
        builder: &mut QueryBuilder<'a, Sqlite>,
        tenant_id: &'a str,
        query: &'a MovementQuery,
    ) {
        builder.push(" WHERE tenant_id = ");
        builder.push_bind(tenant_id);

        if let Some(product_id) = &query.product_id {
            builder.push(" AND product_id = ");
            builder.push_bind(product_id);
        }

        if let Some(location_id) = &query.location_id {
            builder.push(" AND (from_location_id = ");
            builder.push_bind(location_id);
            builder.push(" OR to_location_id = ");
            builder.push_bind(location_id);
            builder.push(")");
        }
    }
}
