//! Calculation repository implementation
//!
//! Stores calculations in `insurance_calculations` and the optional
//! registration address in `calculation_addresses` (1:1, cascade delete).
//! Every write touching both tables runs in one transaction.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use tracing::{debug, instrument};
use uuid::Uuid;

use core_kernel::{
    CalculationId, DomainPort, HealthCheckResult, HealthCheckable, Money, Percentage, PortError,
};
use domain_rating::{
    Address, AddressData, CalculationAggregate, CalculationRecord, CalculationRepository, CarInfo,
    PageRequest, SoftDeleteOutcome,
};

use crate::error::DatabaseError;

const SELECT_CALCULATION: &str = r#"
    SELECT
        c.id, c.car_make, c.car_model, c.car_year, c.car_value,
        c.applied_rate, c.calculated_premium, c.deductible_value,
        c.policy_limit, c.broker_fee, c.gis_adjustment,
        c.created_at, c.updated_at, c.deleted_at,
        a.street AS address_street,
        a.number AS address_number,
        a.complement AS address_complement,
        a.neighborhood AS address_neighborhood,
        a.city AS address_city,
        a.state AS address_state,
        a.postal_code AS address_postal_code,
        a.country AS address_country
    FROM insurance_calculations c
    LEFT JOIN calculation_addresses a ON a.calculation_id = c.id
"#;

/// Database row for a calculation joined with its address
#[derive(Debug, Clone, FromRow)]
pub struct CalculationRow {
    pub id: Uuid,
    pub car_make: String,
    pub car_model: String,
    pub car_year: i32,
    pub car_value: Decimal,
    pub applied_rate: Decimal,
    pub calculated_premium: Decimal,
    pub deductible_value: Decimal,
    pub policy_limit: Decimal,
    pub broker_fee: Decimal,
    pub gis_adjustment: Option<Decimal>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub address_street: Option<String>,
    pub address_number: Option<String>,
    pub address_complement: Option<String>,
    pub address_neighborhood: Option<String>,
    pub address_city: Option<String>,
    pub address_state: Option<String>,
    pub address_postal_code: Option<String>,
    pub address_country: Option<String>,
}

impl CalculationRow {
    /// Rebuilds the aggregate, re-validating every value object
    pub fn into_aggregate(self) -> Result<CalculationAggregate, DatabaseError> {
        let invalid = |e: &dyn std::fmt::Display| DatabaseError::InvalidRow(format!("{}: {}", self.id, e));

        let money = |amount: Decimal| Money::new(amount).map_err(|e| invalid(&e));
        let car = CarInfo::new(
            self.car_make.clone(),
            self.car_model.clone(),
            self.car_year,
            money(self.car_value)?,
        )
        .map_err(|e| invalid(&e))?;

        let registration_address = match (
            &self.address_street,
            &self.address_number,
            &self.address_neighborhood,
            &self.address_city,
            &self.address_state,
            &self.address_postal_code,
        ) {
            (Some(street), Some(number), Some(neighborhood), Some(city), Some(state), Some(postal_code)) => {
                let address = Address::new(AddressData {
                    street: street.clone(),
                    number: number.clone(),
                    complement: self.address_complement.clone(),
                    neighborhood: neighborhood.clone(),
                    city: city.clone(),
                    state: state.clone(),
                    postal_code: postal_code.clone(),
                    country: self.address_country.clone(),
                })
                .map_err(|e| invalid(&e))?;
                Some(address)
            }
            _ => None,
        };

        Ok(CalculationAggregate::restore(CalculationRecord {
            id: CalculationId::from_uuid(self.id),
            car,
            applied_rate: Percentage::new(self.applied_rate),
            calculated_premium: money(self.calculated_premium)?,
            deductible_value: money(self.deductible_value)?,
            policy_limit: money(self.policy_limit)?,
            broker_fee: money(self.broker_fee)?,
            gis_adjustment: self.gis_adjustment.map(Percentage::new),
            registration_address,
            created_at: self.created_at,
            updated_at: self.updated_at,
            deleted_at: self.deleted_at,
        }))
    }
}

/// PostgreSQL-backed calculation storage
#[derive(Debug, Clone)]
pub struct PostgresCalculationRepository {
    pool: PgPool,
}

impl PostgresCalculationRepository {
    /// Creates a new repository with the given connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Inserts a calculation and its address in one transaction
    pub async fn insert(&self, aggregate: &CalculationAggregate) -> Result<(), DatabaseError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO insurance_calculations (
                id, car_make, car_model, car_year, car_value,
                applied_rate, calculated_premium, deductible_value,
                policy_limit, broker_fee, gis_adjustment,
                created_at, updated_at, deleted_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            "#,
        )
        .bind(aggregate.id().as_uuid())
        .bind(aggregate.car().make())
        .bind(aggregate.car().model())
        .bind(aggregate.car().year())
        .bind(aggregate.car().value().amount())
        .bind(aggregate.applied_rate().value())
        .bind(aggregate.calculated_premium().amount())
        .bind(aggregate.deductible_value().amount())
        .bind(aggregate.policy_limit().amount())
        .bind(aggregate.broker_fee().amount())
        .bind(aggregate.gis_adjustment().map(|p| p.value()))
        .bind(aggregate.created_at())
        .bind(aggregate.updated_at())
        .bind(aggregate.deleted_at())
        .execute(&mut *tx)
        .await?;

        if let Some(address) = aggregate.registration_address() {
            insert_address(&mut tx, aggregate.id(), address).await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Fetches an active calculation with its address
    pub async fn fetch_active(&self, id: CalculationId) -> Result<Option<CalculationRow>, DatabaseError> {
        let sql = format!("{} WHERE c.id = $1 AND c.deleted_at IS NULL", SELECT_CALCULATION);
        let row = sqlx::query_as::<_, CalculationRow>(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    /// Fetches a page of active calculations, newest first
    pub async fn fetch_page(&self, page: PageRequest) -> Result<Vec<CalculationRow>, DatabaseError> {
        let sql = format!(
            "{} WHERE c.deleted_at IS NULL ORDER BY c.created_at DESC, c.id LIMIT $1 OFFSET $2",
            SELECT_CALCULATION
        );
        let rows = sqlx::query_as::<_, CalculationRow>(&sql)
            .bind(i64::from(page.limit()))
            .bind(i64::from(page.offset()))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Replaces an active calculation and its address row in one transaction
    pub async fn replace(&self, aggregate: &CalculationAggregate) -> Result<(), DatabaseError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE insurance_calculations SET
                car_make = $2, car_model = $3, car_year = $4, car_value = $5,
                applied_rate = $6, calculated_premium = $7, deductible_value = $8,
                policy_limit = $9, broker_fee = $10, gis_adjustment = $11,
                updated_at = $12
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(aggregate.id().as_uuid())
        .bind(aggregate.car().make())
        .bind(aggregate.car().model())
        .bind(aggregate.car().year())
        .bind(aggregate.car().value().amount())
        .bind(aggregate.applied_rate().value())
        .bind(aggregate.calculated_premium().amount())
        .bind(aggregate.deductible_value().amount())
        .bind(aggregate.policy_limit().amount())
        .bind(aggregate.broker_fee().amount())
        .bind(aggregate.gis_adjustment().map(|p| p.value()))
        .bind(aggregate.updated_at())
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(DatabaseError::not_found("Calculation", aggregate.id()));
        }

        sqlx::query("DELETE FROM calculation_addresses WHERE calculation_id = $1")
            .bind(aggregate.id().as_uuid())
            .execute(&mut *tx)
            .await?;

        if let Some(address) = aggregate.registration_address() {
            insert_address(&mut tx, aggregate.id(), address).await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Sets the deletion marker if it is not set yet
    pub async fn mark_deleted(&self, id: CalculationId, at: DateTime<Utc>) -> Result<SoftDeleteOutcome, DatabaseError> {
        let result = sqlx::query(
            "UPDATE insurance_calculations SET deleted_at = $2 WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id.as_uuid())
        .bind(at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() > 0 {
            return Ok(SoftDeleteOutcome::Deleted);
        }

        let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM insurance_calculations WHERE id = $1)")
            .bind(id.as_uuid())
            .fetch_one(&self.pool)
            .await?;

        Ok(if exists {
            SoftDeleteOutcome::AlreadyDeleted
        } else {
            SoftDeleteOutcome::NotFound
        })
    }

    /// Physically deletes a calculation; the address goes with it by cascade
    pub async fn delete(&self, id: CalculationId) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM insurance_calculations WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

async fn insert_address(
    tx: &mut Transaction<'_, Postgres>,
    id: CalculationId,
    address: &Address,
) -> Result<(), DatabaseError> {
    sqlx::query(
        r#"
        INSERT INTO calculation_addresses (
            calculation_id, street, number, complement, neighborhood,
            city, state, postal_code, country
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        "#,
    )
    .bind(id.as_uuid())
    .bind(address.street())
    .bind(address.number())
    .bind(address.complement())
    .bind(address.neighborhood())
    .bind(address.city())
    .bind(address.state())
    .bind(address.postal_code())
    .bind(address.country())
    .execute(&mut **tx)
    .await?;
    Ok(())
}

impl DomainPort for PostgresCalculationRepository {}

#[async_trait]
impl HealthCheckable for PostgresCalculationRepository {
    async fn health_check(&self) -> HealthCheckResult {
        let start = std::time::Instant::now();

        let result = sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await;

        let latency_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(_) => HealthCheckResult::healthy("postgres-calculations", latency_ms),
            Err(e) => HealthCheckResult::unhealthy(
                "postgres-calculations",
                latency_ms,
                format!("Database error: {}", e),
            ),
        }
    }
}

#[async_trait]
impl CalculationRepository for PostgresCalculationRepository {
    #[instrument(skip(self, aggregate), fields(calculation_id = %aggregate.id()))]
    async fn save(&self, aggregate: &CalculationAggregate) -> Result<(), PortError> {
        debug!("Inserting calculation");
        self.insert(aggregate).await.map_err(|e| match e {
            DatabaseError::DuplicateEntry(_) => {
                PortError::conflict(format!("Calculation {} already exists", aggregate.id()))
            }
            other => other.into(),
        })
    }

    #[instrument(skip(self), fields(calculation_id = %id))]
    async fn find_by_id(&self, id: CalculationId) -> Result<Option<CalculationAggregate>, PortError> {
        debug!("Fetching calculation");
        match self.fetch_active(id).await? {
            Some(row) => Ok(Some(row.into_aggregate()?)),
            None => Ok(None),
        }
    }

    #[instrument(skip(self))]
    async fn list_active(&self, page: PageRequest) -> Result<Vec<CalculationAggregate>, PortError> {
        debug!("Listing calculations");
        let rows = self.fetch_page(page).await?;
        let aggregates = rows
            .into_iter()
            .map(CalculationRow::into_aggregate)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(aggregates)
    }

    #[instrument(skip(self, aggregate), fields(calculation_id = %aggregate.id()))]
    async fn update(&self, aggregate: &CalculationAggregate) -> Result<(), PortError> {
        debug!("Replacing calculation");
        Ok(self.replace(aggregate).await?)
    }

    #[instrument(skip(self), fields(calculation_id = %id))]
    async fn soft_delete(&self, id: CalculationId, at: DateTime<Utc>) -> Result<SoftDeleteOutcome, PortError> {
        let outcome = self.mark_deleted(id, at).await?;
        debug!(?outcome, "Soft delete");
        Ok(outcome)
    }

    #[instrument(skip(self), fields(calculation_id = %id))]
    async fn purge(&self, id: CalculationId) -> Result<bool, PortError> {
        debug!("Purging calculation");
        Ok(self.delete(id).await?)
    }
}
