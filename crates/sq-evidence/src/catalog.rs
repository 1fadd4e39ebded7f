//! Field-definition catalog: which fields each message type declares.
//!
//! Loaded once and injected into the engine; never ambient process state.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use sq_protocol::{TIME_FIELD, TelemetryLog};

use crate::error::{CatalogError, CatalogResult};

/// Fields never expanded into per-field queries.
const NON_QUERYABLE: &[&str] = &[TIME_FIELD, "mavpackettype"];

/// One entry of a message-definitions file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessageDefinition {
    #[serde(default)]
    pub fields: Vec<String>,
}

/// Message type → declared fields, plus the inverse field → message types.
#[derive(Debug, Clone, Default)]
pub struct FieldCatalog {
    messages: BTreeMap<String, Vec<String>>,
    by_field: BTreeMap<String, Vec<String>>,
}

impl FieldCatalog {
    /// Build from definitions, lower-casing every name.
    pub fn from_definitions(definitions: BTreeMap<String, MessageDefinition>) -> Self {
        let messages: BTreeMap<String, Vec<String>> = definitions
            .into_iter()
            .map(|(msg, def)| {
                let fields = def.fields.iter().map(|f| f.to_lowercase()).collect();
                (msg.to_lowercase(), fields)
            })
            .collect();

        let mut by_field: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (msg, fields) in &messages {
            for field in fields {
                let owners = by_field.entry(field.clone()).or_default();
                if !owners.contains(msg) {
                    owners.push(msg.clone());
                }
            }
        }

        Self { messages, by_field }
    }

    /// Parse a `{"MSG": {"fields": [...]}, ...}` definitions document.
    pub fn from_json_str(json: &str) -> CatalogResult<Self> {
        let defs: BTreeMap<String, MessageDefinition> =
            serde_json::from_str(json).map_err(|e| CatalogError::Parse(e.to_string()))?;
        Ok(Self::from_definitions(defs))
    }

    pub fn from_file(path: &str) -> CatalogResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                CatalogError::NotFound(path.to_string())
            } else {
                CatalogError::Io(format!("{path}: {e}"))
            }
        })?;
        Self::from_json_str(&contents)
    }

    /// Derive definitions from the fields actually observed in a log.
    pub fn from_log(log: &TelemetryLog) -> Self {
        let defs = log
            .iter()
            .map(|(msg, records)| {
                let fields: BTreeSet<&str> = records.iter().flat_map(|r| r.fields()).collect();
                let def = MessageDefinition {
                    fields: fields.into_iter().map(str::to_string).collect(),
                };
                (msg.to_string(), def)
            })
            .collect();
        Self::from_definitions(defs)
    }

    pub fn contains_message(&self, message_type: &str) -> bool {
        self.messages.contains_key(message_type)
    }

    /// Every declared field of a message type (empty if unknown).
    pub fn fields_of(&self, message_type: &str) -> &[String] {
        self.messages
            .get(message_type)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Declared fields worth querying individually (no timestamp/marker).
    pub fn queryable_fields<'a>(&'a self, message_type: &str) -> impl Iterator<Item = &'a str> {
        self.fields_of(message_type)
            .iter()
            .map(String::as_str)
            .filter(|f| !NON_QUERYABLE.contains(f))
    }

    /// Message types declaring a field (empty if none).
    pub fn messages_with_field(&self, field: &str) -> &[String] {
        self.by_field
            .get(field)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn message_types(&self) -> impl Iterator<Item = &str> {
        self.messages.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    #[test]
    fn definitions_are_lowercased_and_indexed() {
        let catalog = FieldCatalog::from_json_str(
            r#"{"GPS": {"fields": ["TimeUS", "Alt"]}, "AHR2": {"fields": ["TimeUS", "Alt", "Roll"]}}"#,
        )
        .unwrap();
        assert!(catalog.contains_message("gps"));
        assert_eq!(catalog.fields_of("gps"), ["timeus", "alt"]);
        assert_eq!(catalog.messages_with_field("alt"), ["ahr2", "gps"]);
        assert!(catalog.messages_with_field("volt").is_empty());
    }

    #[test]
    fn queryable_fields_skip_timestamp_and_marker() {
        let catalog = FieldCatalog::from_json_str(
            r#"{"att": {"fields": ["TimeUS", "mavpackettype", "Roll", "Pitch"]}}"#,
        )
        .unwrap();
        let fields: Vec<&str> = catalog.queryable_fields("att").collect();
        assert_eq!(fields, vec!["roll", "pitch"]);
    }

    #[test]
    fn invalid_json_is_parse_error() {
        let err = FieldCatalog::from_json_str("not json").unwrap_err();
        assert!(matches!(err, CatalogError::Parse(_)));
    }

    #[test]
    fn missing_file_is_not_found() {
        let err = FieldCatalog::from_file("/nonexistent/message_definitions.json").unwrap_err();
        assert!(matches!(err, CatalogError::NotFound(_)));
    }

    #[test]
    fn derived_from_log() {
        let catalog = FieldCatalog::from_log(&fixtures::sample_flight_log());
        assert!(catalog.contains_message("bat"));
        assert!(catalog.fields_of("bat").contains(&"volt".to_string()));
        assert!(catalog.messages_with_field("timeus").len() >= 4);
    }
}
