//! Core data types for the import pipeline
//! Pure data structures with no behavior

use chrono::NaiveDate;
use serde::Serialize;
use uuid::Uuid;

/// Normalized rental listing, target of a spreadsheet import.
///
/// Numeric rent fields follow the upstream convention of plain numerics;
/// `rooms` stays textual so values like "5+" survive the round trip.
#[derive(Debug, Clone)]
pub struct PropertyRecord {
    // Identification
    pub title: String,
    pub description: String,
    pub address: String,
    pub postal_code: String,
    pub neighborhood: String,
    pub property_type: String,
    pub city_id: Option<Uuid>,

    // Numeric attributes
    pub area_sqm: i32,
    pub rooms: String,
    pub monthly_rent: f64,
    pub warm_rent: Option<f64>,
    pub additional_costs: f64,
    pub floor: Option<i32>,
    pub total_floors: Option<i32>,
    pub year_built: Option<i32>,
    pub deposit_months: f64,
    pub available_from: NaiveDate,

    // Amenities
    pub balcony: bool,
    pub elevator: bool,
    pub parking: bool,
    pub pets_allowed: bool,
    pub furnished: bool,
    pub kitchen_equipped: bool,
    pub garden: bool,
    pub cellar: bool,
    pub attic: bool,
    pub dishwasher: bool,
    pub washing_machine: bool,
    pub dryer: bool,
    pub tv: bool,
    pub utilities_included: bool,

    // Descriptive free text
    pub features_description: String,
    pub additional_description: String,
    pub energy_certificate_type: String,
    pub energy_certificate_value: String,
    pub heating_type: String,
    pub heating_source: String,
    pub internet_speed: String,

    // Media and labels; first image is the featured one
    pub images: Vec<String>,
    pub tags: Vec<String>,

    // Status
    pub is_active: bool,
    pub is_featured: bool,
}

/// City to create when a spreadsheet references an unknown name.
#[derive(Debug, Clone)]
pub struct NewCity {
    pub name: String,
    pub slug: String,
    pub display_order: i32,
    pub is_active: bool,
}

impl NewCity {
    pub fn from_name(name: &str) -> Self {
        NewCity {
            name: name.to_string(),
            slug: super::fields::city_slug(name),
            display_order: 999,
            is_active: true,
        }
    }
}

/// Admin session metadata looked up by token.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SessionRecord {
    pub is_active: bool,
    pub expires_at: chrono::DateTime<chrono::Utc>,
}

/// Aggregate result of one import call, returned to the caller.
#[derive(Debug, Clone, Serialize)]
pub struct ImportSummary {
    pub success: bool,
    pub imported: usize,
    pub total: usize,
    pub errors: Vec<String>,
    pub message: String,
}

/// A parsed row together with the free-text city name it referenced.
#[derive(Debug, Clone)]
pub struct ParsedRow {
    pub record: PropertyRecord,
    pub city_name: String,
}

/// Outcome of parsing one raw spreadsheet row.
#[derive(Debug, Clone)]
pub enum RowOutcome {
    /// Neither title nor location present; not counted anywhere.
    Skipped,
    Parsed(ParsedRow),
    Failed(String),
}
