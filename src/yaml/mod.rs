//! YAML loading with diagnostics

pub mod diagnostics;

pub use diagnostics::{YamlError, YamlSyntaxError};

use serde::de::DeserializeOwned;
use std::path::Path;

/// Parse YAML text into `T`, mapping failures to a located diagnostic
pub fn parse_yaml_str<T: DeserializeOwned>(content: &str, filename: &str) -> Result<T, YamlError> {
    serde_yml::from_str(content)
        .map_err(|e| YamlSyntaxError::from_serde_error(&e, content, filename).into())
}

/// Read and parse a YAML (or JSON) file
pub fn parse_yaml_file<T: DeserializeOwned>(path: &Path) -> Result<T, YamlError> {
    let content = std::fs::read_to_string(path).map_err(|source| YamlError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_yaml_str(&content, &path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tempfile::TempDir;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Doc {
        revision: String,
    }

    #[test]
    fn test_parse_yaml_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("doc.yaml");
        std::fs::write(&path, "revision: A\n").unwrap();
        let doc: Doc = parse_yaml_file(&path).unwrap();
        assert_eq!(doc.revision, "A");
    }

    #[test]
    fn test_parse_yaml_file_missing_names_path() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("absent.yaml");
        let err = parse_yaml_file::<Doc>(&path).unwrap_err();
        assert!(matches!(err, YamlError::Io { .. }));
        assert!(err.to_string().contains("absent.yaml"));
    }

    #[test]
    fn test_parse_yaml_file_reports_shape_errors() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("doc.yaml");
        std::fs::write(&path, "other: 1\n").unwrap();
        let err = parse_yaml_file::<Doc>(&path).unwrap_err();
        assert!(matches!(err, YamlError::Syntax(_)));
    }
}
