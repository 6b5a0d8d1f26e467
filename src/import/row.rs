//! Row parsing - transform raw spreadsheet rows into property records
//!
//! Both spreadsheet shapes are reduced to one canonical field map
//! (XLSX header names as keys) so a single parser covers the CSV and
//! XLSX paths.

use std::collections::HashMap;
use std::io::Cursor;

use anyhow::Result;
use calamine::{open_workbook_auto_from_rs, Data, Reader};
use serde_json::Value;
use tracing::info;

use crate::import::fields::{
    normalize_rooms, parse_area, parse_available_from, parse_german_price, split_location,
};
use crate::import::types::{ParsedRow, PropertyRecord, RowOutcome};

/// Canonical raw row: field name to trimmed string value.
pub type RawRow = HashMap<String, String>;

/// Source shape of an import; decides how many numbered image slots the
/// exporter writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportFormat {
    Csv,
    Xlsx,
}

impl ImportFormat {
    pub fn image_slots(self) -> usize {
        match self {
            ImportFormat::Csv => 6,
            ImportFormat::Xlsx => 7,
        }
    }
}

/// Positional CSV column layout of the listing export:
/// image URL, page URL, image description, property ID, title, location,
/// price type, price value, area value, area label, rooms value, rooms label.
const CSV_COLUMN_COUNT: usize = 12;

/// Map one positional CSV record onto the canonical field names.
/// Records with fewer than 12 fields are not importable; `None` means skip.
pub fn canonical_from_csv(record: &csv::StringRecord) -> Option<RawRow> {
    if record.len() < CSV_COLUMN_COUNT {
        return None;
    }

    let field = |i: usize| record.get(i).unwrap_or("").trim().to_string();

    let mut row = RawRow::new();
    row.insert("image-featured".to_string(), field(0));
    row.insert("Title".to_string(), field(4));
    row.insert("postcode-city".to_string(), field(5));
    row.insert("Rent".to_string(), field(7));
    row.insert("size".to_string(), field(8));
    row.insert("zimmer".to_string(), field(10));
    Some(row)
}

/// Map a JSON object (XLSX row exported client-side, headers as keys)
/// onto the canonical field names. Numeric cells are rendered without a
/// trailing fraction so room counts arrive as "3", not "3.0".
pub fn canonical_from_json(object: &serde_json::Map<String, Value>) -> RawRow {
    let mut row = RawRow::new();
    for (key, value) in object {
        let rendered = match value {
            Value::String(s) => s.trim().to_string(),
            Value::Number(n) => match n.as_i64() {
                Some(i) => i.to_string(),
                None => n.to_string(),
            },
            Value::Bool(b) => b.to_string(),
            Value::Null => String::new(),
            other => other.to_string(),
        };
        row.insert(key.clone(), rendered);
    }
    row
}

/// Collect image URLs in fixed order: the featured slot first, then the
/// numbered slots, dropping blanks and de-duplicating while preserving
/// first-seen order.
pub fn collect_images(row: &RawRow, numbered_slots: usize) -> Vec<String> {
    let mut images: Vec<String> = Vec::new();
    let mut push = |value: Option<&String>| {
        if let Some(v) = value {
            let v = v.trim();
            if !v.is_empty() && !images.iter().any(|existing| existing == v) {
                images.push(v.to_string());
            }
        }
    };

    push(row.get("image-featured"));
    for i in 1..=numbered_slots {
        push(row.get(&format!("image-{i}")));
    }
    images
}

/// Parse one canonical row into a property record.
///
/// Rows with neither a title nor a location are skipped silently; all
/// field-level parse problems fall back to defaults rather than failing
/// the row.
pub fn parse_row(raw: &RawRow, format: ImportFormat) -> RowOutcome {
    let get = |key: &str| raw.get(key).map(|s| s.trim().to_string()).unwrap_or_default();

    let title = get("Title");
    let location = get("postcode-city");
    if title.is_empty() && location.is_empty() {
        return RowOutcome::Skipped;
    }

    let (postal_code, city_name) = split_location(&location);

    let monthly_rent = parse_german_price(&get("Rent"), 0.0);
    let additional_costs = parse_german_price(&get("Nebenkosten"), 0.0);
    let warm_rent = if additional_costs > 0.0 {
        Some(monthly_rent + additional_costs)
    } else {
        None
    };

    let record = PropertyRecord {
        title,
        description: get("Objektbeschreibung"),
        address: get("address"),
        postal_code,
        neighborhood: get("Lage"),
        property_type: "apartment".to_string(),
        city_id: None,

        area_sqm: parse_area(&get("size")),
        rooms: normalize_rooms(&get("zimmer")),
        monthly_rent,
        warm_rent,
        additional_costs,
        floor: None,
        total_floors: None,
        year_built: None,
        deposit_months: 3.0,
        available_from: parse_available_from(&get("Verfügbar")),

        balcony: false,
        elevator: false,
        parking: false,
        pets_allowed: false,
        furnished: false,
        kitchen_equipped: false,
        garden: false,
        cellar: false,
        attic: false,
        dishwasher: false,
        washing_machine: false,
        dryer: false,
        tv: false,
        utilities_included: false,

        features_description: get("Ausstattungsmerkmale"),
        additional_description: get("Weitere"),
        energy_certificate_type: String::new(),
        energy_certificate_value: String::new(),
        heating_type: String::new(),
        heating_source: String::new(),
        internet_speed: String::new(),

        images: collect_images(raw, format.image_slots()),
        tags: Vec::new(),

        is_active: true,
        is_featured: false,
    };

    RowOutcome::Parsed(ParsedRow { record, city_name })
}

/// Parse a CSV export into row outcomes, one per data row.
/// The header row is not counted; malformed records become row errors.
pub fn rows_from_csv(text: &str) -> Vec<RowOutcome> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut outcomes = Vec::new();
    for result in reader.records() {
        match result {
            Ok(record) => match canonical_from_csv(&record) {
                Some(raw) => outcomes.push(parse_row(&raw, ImportFormat::Csv)),
                None => outcomes.push(RowOutcome::Skipped),
            },
            Err(e) => outcomes.push(RowOutcome::Failed(e.to_string())),
        }
    }

    info!("Parsed {} CSV rows", outcomes.len());
    outcomes
}

/// Parse pre-converted XLSX rows (JSON objects keyed by column header).
pub fn rows_from_json(values: &[Value]) -> Vec<RowOutcome> {
    values
        .iter()
        .map(|value| match value.as_object() {
            Some(object) => parse_row(&canonical_from_json(object), ImportFormat::Xlsx),
            None => RowOutcome::Failed("row is not an object".to_string()),
        })
        .collect()
}

/// Parse a raw XLSX workbook: the first sheet's header row supplies the
/// field names, every following row becomes one canonical row.
pub fn rows_from_xlsx_workbook(bytes: &[u8]) -> Result<Vec<RowOutcome>> {
    let cursor = Cursor::new(bytes);
    let mut workbook = open_workbook_auto_from_rs(cursor)?;

    let sheet_names = workbook.sheet_names();
    let sheet_name = sheet_names
        .first()
        .ok_or_else(|| anyhow::anyhow!("No sheets found in workbook"))?
        .clone();
    info!("Reading sheet: {}", sheet_name);

    let range = workbook.worksheet_range(&sheet_name)?;
    let mut rows = range.rows();

    let headers: Vec<String> = match rows.next() {
        Some(header_row) => header_row.iter().map(cell_to_string).collect(),
        None => return Ok(Vec::new()),
    };

    let mut outcomes = Vec::new();
    for row in rows {
        let mut raw = RawRow::new();
        for (header, cell) in headers.iter().zip(row.iter()) {
            if !header.is_empty() {
                raw.insert(header.clone(), cell_to_string(cell));
            }
        }
        outcomes.push(parse_row(&raw, ImportFormat::Xlsx));
    }

    info!("Parsed {} XLSX rows", outcomes.len());
    Ok(outcomes)
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.trim().to_string(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => {
            if f.fract() == 0.0 {
                format!("{:.0}", f)
            } else {
                f.to_string()
            }
        }
        Data::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn raw(entries: &[(&str, &str)]) -> RawRow {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_parse_row_full() {
        let row = raw(&[
            ("Title", "Helle 3-Zimmer-Wohnung"),
            ("postcode-city", "14199 Berlin"),
            ("address", "Musterstraße 12"),
            ("Rent", "1.360"),
            ("Nebenkosten", "240"),
            ("size", "85,5 m²"),
            ("zimmer", "3"),
            ("Verfügbar", "2024-03-01"),
            ("Objektbeschreibung", "Schöne Wohnung"),
            ("Lage", "Wilmersdorf"),
        ]);

        let outcome = parse_row(&row, ImportFormat::Xlsx);
        let parsed = match outcome {
            RowOutcome::Parsed(p) => p,
            other => panic!("Expected Parsed, got {:?}", other),
        };

        assert_eq!(parsed.city_name, "Berlin");
        assert_eq!(parsed.record.postal_code, "14199");
        assert_eq!(parsed.record.monthly_rent, 1360.0);
        assert_eq!(parsed.record.additional_costs, 240.0);
        assert_eq!(parsed.record.warm_rent, Some(1600.0));
        assert_eq!(parsed.record.area_sqm, 86);
        assert_eq!(parsed.record.rooms, "3");
        assert_eq!(
            parsed.record.available_from,
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
        );
        assert_eq!(parsed.record.neighborhood, "Wilmersdorf");
        assert!(parsed.record.is_active);
        assert!(!parsed.record.is_featured);
    }

    #[test]
    fn test_parse_row_skips_without_title_and_location() {
        let row = raw(&[("Rent", "950"), ("size", "60")]);
        assert!(matches!(
            parse_row(&row, ImportFormat::Xlsx),
            RowOutcome::Skipped
        ));
    }

    #[test]
    fn test_parse_row_title_only_still_imports() {
        let row = raw(&[("Title", "Wohnung ohne Ort")]);
        match parse_row(&row, ImportFormat::Xlsx) {
            RowOutcome::Parsed(p) => {
                assert_eq!(p.city_name, "");
                assert_eq!(p.record.postal_code, "");
            }
            other => panic!("Expected Parsed, got {:?}", other),
        }
    }

    #[test]
    fn test_collect_images_dedupes_preserving_order() {
        let row = raw(&[
            ("image-featured", "A"),
            ("image-1", "B"),
            ("image-2", "A"),
            ("image-3", ""),
        ]);
        assert_eq!(collect_images(&row, 7), vec!["A", "B"]);
    }

    #[test]
    fn test_collect_images_csv_slot_limit() {
        let row = raw(&[("image-featured", "F"), ("image-6", "S"), ("image-7", "T")]);
        // CSV exports carry six numbered slots; a seventh is ignored.
        assert_eq!(collect_images(&row, 6), vec!["F", "S"]);
    }

    #[test]
    fn test_imageless_row_still_parses() {
        let row = raw(&[("Title", "Ohne Bilder"), ("postcode-city", "10115, Berlin")]);
        match parse_row(&row, ImportFormat::Xlsx) {
            RowOutcome::Parsed(p) => assert!(p.record.images.is_empty()),
            other => panic!("Expected Parsed, got {:?}", other),
        }
    }

    #[test]
    fn test_canonical_from_csv_maps_positions() {
        let record = csv::StringRecord::from(vec![
            "https://img.example/1.jpg",
            "https://page.example/1",
            "Bildbeschreibung",
            "obj-123",
            "Altbauwohnung",
            "14199, Berlin",
            "Kaltmiete",
            "1.360",
            "85,5",
            "m²",
            "3",
            "Zimmer",
        ]);

        let raw = canonical_from_csv(&record).expect("12 fields should map");
        assert_eq!(raw["Title"], "Altbauwohnung");
        assert_eq!(raw["postcode-city"], "14199, Berlin");
        assert_eq!(raw["Rent"], "1.360");
        assert_eq!(raw["image-featured"], "https://img.example/1.jpg");
    }

    #[test]
    fn test_canonical_from_csv_short_record() {
        let record = csv::StringRecord::from(vec!["a", "b", "c"]);
        assert!(canonical_from_csv(&record).is_none());
    }

    #[test]
    fn test_rows_from_csv_counts_and_skips() {
        let text = "\
img,url,desc,id,title,location,pricetype,price,area,arealabel,rooms,roomslabel
i.jpg,p.html,desc,1,Wohnung Eins,\"14199, Berlin\",Kaltmiete,950,60,m²,2,Zimmer
short,row
i2.jpg,p2.html,desc,2,Wohnung Zwei,\"20095, Hamburg\",Kaltmiete,\"1.360\",85,m²,3,Zimmer
";
        let outcomes = rows_from_csv(text);
        assert_eq!(outcomes.len(), 3);
        assert!(matches!(outcomes[0], RowOutcome::Parsed(_)));
        assert!(matches!(outcomes[1], RowOutcome::Skipped));
        assert!(matches!(outcomes[2], RowOutcome::Parsed(_)));
    }

    #[test]
    fn test_rows_from_json_numeric_rooms() {
        let values = vec![serde_json::json!({
            "Title": "Wohnung",
            "postcode-city": "80331 München",
            "zimmer": 3,
            "Rent": 1250
        })];
        match &rows_from_json(&values)[0] {
            RowOutcome::Parsed(p) => {
                assert_eq!(p.record.rooms, "3");
                assert_eq!(p.record.monthly_rent, 1250.0);
                assert_eq!(p.city_name, "München");
            }
            other => panic!("Expected Parsed, got {:?}", other),
        }
    }

    #[test]
    fn test_rows_from_json_non_object_row_fails() {
        let values = vec![serde_json::json!("not a row")];
        assert!(matches!(&rows_from_json(&values)[0], RowOutcome::Failed(_)));
    }
}
