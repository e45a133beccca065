//! Score-distribution data files.
//!
//! One file per province and subject track, named
//! `ranking_score_<province>_<subject>.json`, holding `{"data": [...]}` with
//! rows ordered from the highest score down.

use serde_json::{Map, Value};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

use crate::ranking::TableKey;

const FILE_PREFIX: &str = "ranking_score_";
const FILE_SUFFIX: &str = ".json";

#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("data file not found: {file_name}")]
    NotFound { file_name: String },

    #[error("data file is malformed: {file_name}")]
    Malformed {
        file_name: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to read data file {file_name}: {source}")]
    Io {
        file_name: String,
        #[source]
        source: std::io::Error,
    },
}

/// File name for a province/subject pair
pub fn data_file_name(key: &TableKey) -> String {
    format!("{}{}_{}{}", FILE_PREFIX, key.province, key.subject, FILE_SUFFIX)
}

/// Province and subject end up in a file path; only plain names are allowed.
fn is_safe_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// Resolve the data file path, or None when the key cannot name a file.
pub fn data_file_path(data_dir: &Path, key: &TableKey) -> Option<PathBuf> {
    if is_safe_segment(&key.province) && is_safe_segment(&key.subject) {
        Some(data_dir.join(data_file_name(key)))
    } else {
        None
    }
}

/// Read a data file as a JSON object.
///
/// Unsafe names and missing files are `NotFound`. Content that is not a JSON
/// object is `Malformed`.
pub async fn load_dataset(data_dir: &Path, key: &TableKey) -> Result<Map<String, Value>, DatasetError> {
    let file_name = data_file_name(key);
    let Some(path) = data_file_path(data_dir, key) else {
        debug!(province = %key.province, subject = %key.subject, "rejected data file name");
        return Err(DatasetError::NotFound { file_name });
    };

    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(DatasetError::NotFound { file_name });
        }
        Err(source) => return Err(DatasetError::Io { file_name, source }),
    };

    serde_json::from_slice::<Map<String, Value>>(&bytes)
        .map_err(|source| DatasetError::Malformed { file_name, source })
}

/// List the province/subject pairs that have a data file.
///
/// The subject is taken after the last underscore, so subjects never contain
/// one. Unreadable directories yield an empty list.
pub fn available_datasets(data_dir: &Path) -> Vec<TableKey> {
    let Some(dir) = data_dir.to_str() else {
        return Vec::new();
    };
    let pattern = format!(
        "{}/{}*{}",
        glob::Pattern::escape(dir),
        FILE_PREFIX,
        FILE_SUFFIX
    );
    let Ok(paths) = glob::glob(&pattern) else {
        return Vec::new();
    };

    let mut keys: Vec<TableKey> = paths
        .filter_map(|entry| entry.ok())
        .filter_map(|path| {
            let name = path.file_name()?.to_str()?;
            let stem = name.strip_prefix(FILE_PREFIX)?.strip_suffix(FILE_SUFFIX)?;
            let (province, subject) = stem.rsplit_once('_')?;
            let key = TableKey::new(province, subject);
            data_file_path(data_dir, &key).map(|_| key)
        })
        .collect();

    keys.sort_by(|a, b| {
        a.province
            .cmp(&b.province)
            .then_with(|| a.subject.cmp(&b.subject))
    });
    keys
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const SAMPLE: &str = r#"{"data":[
        {"score":"695-750","num":100,"accumulate":100},
        {"score":"694","num":10,"accumulate":110}
    ]}"#;

    #[test]
    fn test_file_name() {
        let key = TableKey::new("hubei", "physics");
        assert_eq!(data_file_name(&key), "ranking_score_hubei_physics.json");
    }

    #[test]
    fn test_unsafe_segments_rejected() {
        let dir = Path::new("/data");
        assert!(data_file_path(dir, &TableKey::new("../etc", "physics")).is_none());
        assert!(data_file_path(dir, &TableKey::new("hubei", "a/b")).is_none());
        assert!(data_file_path(dir, &TableKey::new("", "physics")).is_none());
        assert!(data_file_path(dir, &TableKey::new("hubei", "physics")).is_some());
    }

    #[tokio::test]
    async fn test_load_existing() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("ranking_score_hubei_physics.json"), SAMPLE).unwrap();

        let map = load_dataset(dir.path(), &TableKey::new("hubei", "physics"))
            .await
            .unwrap();
        assert_eq!(map["data"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_load_missing() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_dataset(dir.path(), &TableKey::new("hubei", "physics"))
            .await
            .unwrap_err();
        assert!(matches!(err, DatasetError::NotFound { .. }));
        assert!(err.to_string().contains("ranking_score_hubei_physics.json"));
    }

    #[tokio::test]
    async fn test_load_malformed() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("ranking_score_hubei_history.json"), "{not json").unwrap();

        let err = load_dataset(dir.path(), &TableKey::new("hubei", "history"))
            .await
            .unwrap_err();
        assert!(matches!(err, DatasetError::Malformed { .. }));
    }

    #[tokio::test]
    async fn test_load_non_object_is_malformed() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("ranking_score_hubei_history.json"), "[1,2,3]").unwrap();

        let err = load_dataset(dir.path(), &TableKey::new("hubei", "history"))
            .await
            .unwrap_err();
        assert!(matches!(err, DatasetError::Malformed { .. }));
    }

    #[tokio::test]
    async fn test_load_traversal_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_dataset(dir.path(), &TableKey::new("..", "physics"))
            .await
            .unwrap_err();
        assert!(matches!(err, DatasetError::NotFound { .. }));
    }

    #[test]
    fn test_available_datasets() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("ranking_score_hubei_physics.json"), SAMPLE).unwrap();
        fs::write(dir.path().join("ranking_score_hubei_history.json"), SAMPLE).unwrap();
        fs::write(dir.path().join("ranking_score_new_york_physics.json"), SAMPLE).unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let keys = available_datasets(dir.path());
        assert_eq!(
            keys,
            vec![
                TableKey::new("hubei", "history"),
                TableKey::new("hubei", "physics"),
                TableKey::new("new_york", "physics"),
            ]
        );
    }

    #[test]
    fn test_available_datasets_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(available_datasets(&dir.path().join("absent")).is_empty());
    }
}
