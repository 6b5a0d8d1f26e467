//! Batch insertion - persist parsed rows one by one, collecting errors
//!
//! Inserts are independent: a failed row never aborts the batch or
//! rolls back earlier inserts. Rows run strictly sequentially because
//! later rows rely on city-cache entries from earlier ones.

use tracing::{debug, info, warn};

use crate::import::city::CityResolver;
use crate::import::types::{ImportSummary, RowOutcome};
use crate::store::ImportStore;

/// Run the import pipeline over parsed row outcomes.
///
/// `total` counts every row that reached parsing or insertion; silently
/// skipped rows count nowhere. Error strings carry the 1-based position
/// of the row within the file's data rows.
pub async fn run_import(store: &dyn ImportStore, rows: Vec<RowOutcome>) -> ImportSummary {
    info!("Importing {} rows", rows.len());

    let mut resolver = CityResolver::new();
    let mut imported = 0;
    let mut total = 0;
    let mut errors = Vec::new();

    for (idx, outcome) in rows.into_iter().enumerate() {
        let row_number = idx + 1;
        match outcome {
            RowOutcome::Skipped => continue,
            RowOutcome::Failed(message) => {
                total += 1;
                errors.push(format!("Row {}: {}", row_number, message));
            }
            RowOutcome::Parsed(parsed) => {
                total += 1;
                let mut record = parsed.record;

                let resolved = resolver.resolve(store, &parsed.city_name).await;
                record.city_id = match resolved {
                    Some(id) => Some(id),
                    None => resolver.fallback_id(store).await,
                };

                match store.insert_property(&record).await {
                    Ok(id) => {
                        debug!("Inserted property \"{}\" ({})", record.title, id);
                        imported += 1;
                    }
                    Err(e) => {
                        warn!("Failed to insert property \"{}\": {}", record.title, e);
                        errors.push(format!(
                            "Failed to insert property \"{}\": {}",
                            record.title, e
                        ));
                    }
                }
            }
        }
    }

    info!(
        "Import complete: {} of {} imported, {} errors",
        imported,
        total,
        errors.len()
    );

    ImportSummary {
        success: true,
        imported,
        total,
        errors,
        message: format!("Imported {} of {} properties", imported, total),
    }
}
