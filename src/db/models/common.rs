//! Shared helpers for JSON-encoded columns.

use serde::{Deserialize, Serialize};

/// Structured address stored as a JSON column on listings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Address {
    #[serde(default)]
    pub street: Option<String>,
    #[serde(default)]
    pub coordinates: Option<Coordinates>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

/// Parse a JSON string-array column into a Vec. NULL or malformed JSON
/// yields an empty list.
pub fn parse_string_list(json: Option<&str>) -> Vec<String> {
    json.and_then(|s| serde_json::from_str(s).ok())
        .unwrap_or_default()
}

/// Serialize a string list for storage; empty lists are stored as NULL.
pub fn serialize_string_list(items: &[String]) -> Option<String> {
    if items.is_empty() {
        None
    } else {
        serde_json::to_string(items).ok()
    }
}

pub fn parse_address(json: Option<&str>) -> Option<Address> {
    json.and_then(|s| serde_json::from_str(s).ok())
}

pub fn serialize_address(address: &Option<Address>) -> Option<String> {
    address
        .as_ref()
        .and_then(|a| serde_json::to_string(a).ok())
}

/// Accept either a JSON array (`["WiFi","AC"]`) or a comma-separated string
/// (`WiFi, AC`) from form fields.
pub fn parse_list_field(raw: &str) -> Vec<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }
    if let Ok(items) = serde_json::from_str::<Vec<String>>(trimmed) {
        return items;
    }
    trimmed
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_list_round_trip() {
        let items = vec!["WiFi".to_string(), "AC Rooms".to_string()];
        let json = serialize_string_list(&items).unwrap();
        assert_eq!(parse_string_list(Some(&json)), items);
    }

    #[test]
    fn empty_list_stored_as_null() {
        assert_eq!(serialize_string_list(&[]), None);
        assert!(parse_string_list(None).is_empty());
        assert!(parse_string_list(Some("not json")).is_empty());
    }

    #[test]
    fn list_field_accepts_json_and_csv() {
        assert_eq!(
            parse_list_field(r#"["WiFi","Gym"]"#),
            vec!["WiFi".to_string(), "Gym".to_string()]
        );
        assert_eq!(
            parse_list_field("WiFi, Gym, "),
            vec!["WiFi".to_string(), "Gym".to_string()]
        );
        assert!(parse_list_field("  ").is_empty());
    }

    #[test]
    fn address_round_trip() {
        let address = Some(Address {
            street: Some("12 MG Road".to_string()),
            coordinates: Some(Coordinates {
                lat: 18.52,
                lng: 73.85,
            }),
        });
        let json = serialize_address(&address).unwrap();
        assert_eq!(parse_address(Some(&json)), address);
    }
}
