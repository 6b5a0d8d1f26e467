//! Field-parsing helpers - normalize German spreadsheet values

use chrono::{NaiveDate, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

/// Location values look like "14199, Berlin" (CSV exports) or
/// "14199 Berlin" (XLSX exports). Anchored on exactly five digits.
static POSTAL_CITY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(\d{5})[,\s]+(.+)$").expect("postal regex"));

/// Split a raw location into (postal code, city name).
///
/// Falls back to token splitting when the primary pattern misses; a
/// value without a leading 5-digit code is treated as a bare city name.
pub fn split_location(raw: &str) -> (String, String) {
    let raw = raw.trim().trim_matches('"').trim();

    if let Some(caps) = POSTAL_CITY.captures(raw) {
        return (caps[1].to_string(), caps[2].trim().to_string());
    }

    let mut parts = raw.splitn(2, [',', ' ']);
    if let Some(first) = parts.next() {
        let first = first.trim();
        if first.len() == 5 && first.chars().all(|c| c.is_ascii_digit()) {
            let rest = parts.next().unwrap_or("").trim();
            return (first.to_string(), rest.to_string());
        }
    }

    (String::new(), raw.to_string())
}

/// Parse a German rent/price value.
///
/// Handles plain digits, decimal-comma notation ("3,24" -> 3.24) and the
/// dot-as-thousands convention used in listing exports ("1.360" -> 1360:
/// a comma-free value whose dot is followed by 1-3 digits has its dots
/// stripped). Currency symbols and "auf Anfrage" are removed before
/// conversion; anything unparseable yields `fallback`.
pub fn parse_german_price(raw: &str, fallback: f64) -> f64 {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return fallback;
    }
    if trimmed.to_lowercase().contains("auf anfrage") {
        return 0.0;
    }

    let cleaned: String = trimmed
        .chars()
        .filter(|c| !matches!(c, '€' | '$' | '£' | '¥') && !c.is_whitespace())
        .collect();
    if cleaned.is_empty() {
        return fallback;
    }

    if cleaned.contains(',') {
        // Dots are thousands separators, the comma is the decimal mark.
        let normalized = cleaned.replace('.', "").replace(',', ".");
        return normalized.parse().unwrap_or(fallback);
    }

    if let Some(pos) = cleaned.rfind('.') {
        let fraction = &cleaned[pos + 1..];
        if (1..=3).contains(&fraction.len()) && fraction.chars().all(|c| c.is_ascii_digit()) {
            let normalized = cleaned.replace('.', "");
            return normalized.parse().unwrap_or(fallback);
        }
    }

    cleaned.parse().unwrap_or(fallback)
}

/// Parse a decimal value with an optional comma as the decimal mark.
/// No thousands handling; used for non-rent numerics.
pub fn parse_decimal(raw: &str, fallback: f64) -> f64 {
    let cleaned = raw.trim().replace(',', ".");
    if cleaned.is_empty() {
        return fallback;
    }
    cleaned.parse().unwrap_or(fallback)
}

/// Parse an area value, stripping the unit suffix, rounded to whole m².
pub fn parse_area(raw: &str) -> i32 {
    let cleaned = raw
        .trim()
        .trim_end_matches("m²")
        .trim_end_matches("m2")
        .trim();
    parse_decimal(cleaned, 0.0).round() as i32
}

/// Normalize a rooms value, keeping it textual ("5+" is a valid count).
/// Raw numerics are rendered without a trailing fraction.
pub fn normalize_rooms(raw: &str) -> String {
    let trimmed = raw.trim();
    if let Ok(n) = trimmed.parse::<f64>() {
        if n.fract() == 0.0 {
            return format!("{}", n as i64);
        }
        return n.to_string();
    }
    trimmed.to_string()
}

/// Parse an availability date, defaulting to today when unparseable.
pub fn parse_available_from(raw: &str) -> NaiveDate {
    let trimmed = raw.trim();
    for format in ["%Y-%m-%d", "%d.%m.%Y", "%d/%m/%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return date;
        }
    }
    Utc::now().date_naive()
}

/// Derive a URL slug from a city name: lowercase, umlauts and ß
/// transliterated, non-alphanumeric runs collapsed to single hyphens.
pub fn city_slug(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.to_lowercase().chars() {
        match c {
            'ä' => slug.push_str("ae"),
            'ö' => slug.push_str("oe"),
            'ü' => slug.push_str("ue"),
            'ß' => slug.push_str("ss"),
            c if c.is_ascii_alphanumeric() => slug.push(c),
            _ => {
                if !slug.is_empty() && !slug.ends_with('-') {
                    slug.push('-');
                }
            }
        }
    }
    slug.trim_end_matches('-').to_string()
}
