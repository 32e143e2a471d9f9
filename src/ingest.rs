// src/ingest.rs
//
// Batch JSON boundary. A batch file is an array whose entries are either
// nested `StageEntry`s or flat `FlatRecord`s (mixed arrays are fine). Each
// entry is decoded on its own so one malformed entry is logged and skipped
// instead of failing the file.

use std::fs;
use std::path::Path;

use serde_json::Value;

use crate::error::Result;
use crate::model::BatchEntry;

pub struct Batch {
    pub entries: Vec<BatchEntry>,
    pub skipped: usize,
}

pub fn load_batch(path: &Path) -> Result<Batch> {
    let text = fs::read_to_string(path)?;
    let batch = parse_batch(&text)?;
    logf!(
        "Loaded {}: {} entries ({} skipped)",
        path.display(), batch.entries.len(), batch.skipped
    );
    Ok(batch)
}

/// The top level must be a JSON array; a single object is accepted as a
/// one-entry batch.
pub fn parse_batch(text: &str) -> Result<Batch> {
    let values = match serde_json::from_str::<Value>(text)? {
        Value::Array(items) => items,
        obj @ Value::Object(_) => vec![obj],
        _ => Vec::new(),
    };

    let mut entries = Vec::with_capacity(values.len());
    let mut skipped = 0usize;
    for (i, v) in values.into_iter().enumerate() {
        match serde_json::from_value::<BatchEntry>(v) {
            Ok(entry) => entries.push(entry),
            Err(e) => {
                skipped += 1;
                logw!("batch entry #{i} skipped: {e}");
            }
        }
    }
    Ok(Batch { entries, skipped })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mixed_shapes_and_bad_entries() {
        let text = r#"[
            {"state":"Assam","stage":"Middle Stage","charts":[]},
            {"state":"Assam","stage":"Middle Stage","competency_code":"C-3.2",
             "chart_title":"C-3.2 Classifies matter","series_name":"MSSC",
             "data":[{"name":"Kamrup","y":62}]},
            {"state":"Assam"},
            42
        ]"#;
        let batch = parse_batch(text).unwrap();
        assert_eq!(batch.entries.len(), 2);
        assert_eq!(batch.skipped, 2);
        assert!(matches!(batch.entries[0], BatchEntry::Nested(_)));
        assert!(matches!(batch.entries[1], BatchEntry::Flat(_)));
    }

    #[test]
    fn invalid_json_is_an_error() {
        assert!(parse_batch("[{").is_err());
    }
}
