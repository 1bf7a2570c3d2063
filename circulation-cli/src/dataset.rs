//! Bulk dataset loading
//!
//! The dataset is a JSON array of flat objects, one per newspaper. A copy of
//! the circulation dataset is compiled into the binary for runs without `--data`.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use circulation_core::bson;
use circulation_core::Record;
use serde_json::{Map, Value};

const BUNDLED: &str = include_str!("../data/circulation.json");

/// Read records from `path`, or the bundled dataset when `None`
pub fn load(path: Option<&Path>) -> Result<Vec<Record>> {
    match path {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("Failed to read dataset {}", path.display()))?;
            parse(&text).with_context(|| format!("Invalid dataset {}", path.display()))
        }
        None => parse(BUNDLED).context("Invalid bundled dataset"),
    }
}

pub fn parse(text: &str) -> Result<Vec<Record>> {
    let objects: Vec<Map<String, Value>> =
        serde_json::from_str(text).context("dataset must be a JSON array of objects")?;

    objects
        .iter()
        .enumerate()
        .map(|(index, object)| {
            bson::to_document(object)
                .with_context(|| format!("record {} cannot be stored as a document", index))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn bundled_dataset_parses() {
        let records = load(None).unwrap();

        assert_eq!(records.len(), 20);
        assert!(records
            .iter()
            .all(|r| circulation_core::CirculationRecord::from_record(r).is_ok()));
        assert_eq!(records[2].get_str("Newspaper").unwrap(), "New York Times");
    }

    #[test]
    fn numbers_keep_their_sign() {
        let records = parse(r#"[{"Newspaper": "A", "Change in Daily Circulation, 2004-2013": -24}]"#)
            .unwrap();
        assert_eq!(
            records[0].get_i64("Change in Daily Circulation, 2004-2013").unwrap(),
            -24
        );
    }

    #[test]
    fn rejects_non_array() {
        let err = parse(r#"{"Newspaper": "A"}"#).unwrap_err();
        assert!(format!("{:#}", err).contains("JSON array of objects"));
    }

    #[test]
    fn reads_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"[{{"Newspaper": "A"}}, {{"Newspaper": "B"}}]"#).unwrap();
        file.flush().unwrap();

        assert_eq!(load(Some(file.path())).unwrap().len(), 2);
    }

    #[test]
    fn missing_file_names_the_path() {
        let err = load(Some(Path::new("/nonexistent/circulation.json"))).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/circulation.json"));
    }
}
