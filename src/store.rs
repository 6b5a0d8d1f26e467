//! Storage seam - trait over the session, city and property stores
//! with the Postgres implementation used in production.

use anyhow::Result;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::import::types::{NewCity, PropertyRecord, SessionRecord};

/// Backing-store operations the import pipeline needs. Kept narrow so
/// tests can substitute an in-memory implementation.
#[async_trait]
pub trait ImportStore: Send + Sync {
    async fn find_session(&self, token: &str) -> Result<Option<SessionRecord>>;

    /// First city in the store, used as the fallback when a row has no
    /// usable city name.
    async fn first_city_id(&self) -> Result<Option<Uuid>>;

    async fn find_city_by_name(&self, name: &str) -> Result<Option<Uuid>>;

    async fn find_city_by_name_ci(&self, name: &str) -> Result<Option<Uuid>>;

    async fn insert_city(&self, city: &NewCity) -> Result<Uuid>;

    async fn insert_property(&self, record: &PropertyRecord) -> Result<Uuid>;
}

/// Postgres-backed store.
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        PgStore { pool }
    }
}

#[async_trait]
impl ImportStore for PgStore {
    async fn find_session(&self, token: &str) -> Result<Option<SessionRecord>> {
        let session = sqlx::query_as::<_, SessionRecord>(
            "SELECT is_active, expires_at FROM admin_sessions WHERE token = $1",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(session)
    }

    async fn first_city_id(&self) -> Result<Option<Uuid>> {
        let id = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM cities ORDER BY created_at LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await?;

        Ok(id)
    }

    async fn find_city_by_name(&self, name: &str) -> Result<Option<Uuid>> {
        let id = sqlx::query_scalar::<_, Uuid>("SELECT id FROM cities WHERE name = $1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;

        Ok(id)
    }

    async fn find_city_by_name_ci(&self, name: &str) -> Result<Option<Uuid>> {
        let id =
            sqlx::query_scalar::<_, Uuid>("SELECT id FROM cities WHERE LOWER(name) = LOWER($1)")
                .bind(name)
                .fetch_optional(&self.pool)
                .await?;

        Ok(id)
    }

    async fn insert_city(&self, city: &NewCity) -> Result<Uuid> {
        let id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO cities (name, slug, display_order, is_active)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(&city.name)
        .bind(&city.slug)
        .bind(city.display_order)
        .bind(city.is_active)
        .fetch_one(&self.pool)
        .await?;

        Ok(id)
    }

    async fn insert_property(&self, record: &PropertyRecord) -> Result<Uuid> {
        let id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO properties (
                title, description, address, postal_code, neighborhood,
                property_type, city_id, area_sqm, rooms, monthly_rent,
                warm_rent, additional_costs, floor, total_floors, year_built,
                deposit_months, available_from, balcony, elevator, parking,
                pets_allowed, furnished, kitchen_equipped, garden, cellar,
                attic, dishwasher, washing_machine, dryer, tv,
                utilities_included, features_description, additional_description,
                energy_certificate_type, energy_certificate_value, heating_type,
                heating_source, internet_speed, images, tags,
                is_active, is_featured, created_at
            ) VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10,
                $11, $12, $13, $14, $15, $16, $17, $18, $19, $20,
                $21, $22, $23, $24, $25, $26, $27, $28, $29, $30,
                $31, $32, $33, $34, $35, $36, $37, $38, $39, $40,
                $41, $42, NOW()
            )
            RETURNING id
            "#,
        )
        .bind(&record.title)
        .bind(&record.description)
        .bind(&record.address)
        .bind(&record.postal_code)
        .bind(&record.neighborhood)
        .bind(&record.property_type)
        .bind(record.city_id)
        .bind(record.area_sqm)
        .bind(&record.rooms)
        .bind(record.monthly_rent)
        .bind(record.warm_rent)
        .bind(record.additional_costs)
        .bind(record.floor)
        .bind(record.total_floors)
        .bind(record.year_built)
        .bind(record.deposit_months)
        .bind(record.available_from)
        .bind(record.balcony)
        .bind(record.elevator)
        .bind(record.parking)
        .bind(record.pets_allowed)
        .bind(record.furnished)
        .bind(record.kitchen_equipped)
        .bind(record.garden)
        .bind(record.cellar)
        .bind(record.attic)
        .bind(record.dishwasher)
        .bind(record.washing_machine)
        .bind(record.dryer)
        .bind(record.tv)
        .bind(record.utilities_included)
        .bind(&record.features_description)
        .bind(&record.additional_description)
        .bind(&record.energy_certificate_type)
        .bind(&record.energy_certificate_value)
        .bind(&record.heating_type)
        .bind(&record.heating_source)
        .bind(&record.internet_speed)
        .bind(&record.images)
        .bind(&record.tags)
        .bind(record.is_active)
        .bind(record.is_featured)
        .fetch_one(&self.pool)
        .await?;

        Ok(id)
    }
}
