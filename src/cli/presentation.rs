//! CLI presentation: text and JSON rendering of command results.

use crate::duplicates::DuplicateMap;
use crate::error::DigestError;
use comfy_table::presets::UTF8_FULL;
use comfy_table::Table;
use serde_json::{json, Map, Value};

pub fn format_duplicates_text(duplicates: &DuplicateMap) -> String {
    if duplicates.is_empty() {
        return "No duplicates found.".to_string();
    }
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Digest", "Count", "Sources"]);
    for (digest, sources) in duplicates {
        let listed: Vec<String> = sources.iter().map(|s| s.to_string()).collect();
        table.add_row(vec![
            digest.clone(),
            sources.len().to_string(),
            listed.join("\n"),
        ]);
    }
    table.to_string()
}

pub fn format_duplicates_json(duplicates: &DuplicateMap) -> Result<String, DigestError> {
    let groups: Map<String, Value> = duplicates
        .iter()
        .map(|(digest, sources)| {
            let listed: Vec<String> = sources.iter().map(|s| s.to_string()).collect();
            (digest.clone(), json!(listed))
        })
        .collect();
    serde_json::to_string_pretty(&Value::Object(groups))
        .map_err(|e| DigestError::InvalidArgument(format!("cannot encode duplicates: {}", e)))
}
