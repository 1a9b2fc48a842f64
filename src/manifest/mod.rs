//! Document manifest: the curated `{uri, display_title}` list seeding the index
//!
//! Accepted file formats (JSON or YAML, picked by extension):
//!
//! ```yaml
//! docs:
//!   - uri: https://docs.example.com/getting-started
//!     display_title: Getting Started
//! ```
//!
//! or a bare list of entries. `title` is accepted as an alias of `display_title`.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

use crate::constants::BUILTIN_MANIFEST;
use crate::error::{DocSearchError, Result};
use crate::url_validator::normalize_uri;

/// One manifest line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub uri: String,
    #[serde(alias = "title")]
    pub display_title: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ManifestFile {
    Wrapped { docs: Vec<ManifestEntry> },
    List(Vec<ManifestEntry>),
}

/// Validated, de-duplicated manifest
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Manifest {
    pub docs: Vec<ManifestEntry>,
}

impl Manifest {
    /// Build from entries: trims fields, drops blank URIs and later duplicates,
    /// and falls back to the URI when a title is blank
    pub fn new(entries: Vec<ManifestEntry>) -> Self {
        let mut seen = HashSet::new();
        let mut docs = Vec::with_capacity(entries.len());

        for entry in entries {
            let uri = entry.uri.trim().to_string();
            if uri.is_empty() {
                tracing::warn!("Manifest entry with empty uri skipped");
                continue;
            }
            if !seen.insert(normalize_uri(&uri)) {
                tracing::warn!("Duplicate manifest uri skipped: {}", uri);
                continue;
            }
            let title = entry.display_title.trim();
            let display_title = if title.is_empty() {
                uri.clone()
            } else {
                title.to_string()
            };
            docs.push(ManifestEntry { uri, display_title });
        }

        Self { docs }
    }

    /// The compiled-in manifest
    pub fn builtin() -> Self {
        Self::new(
            BUILTIN_MANIFEST
                .iter()
                .map(|(uri, title)| ManifestEntry {
                    uri: uri.to_string(),
                    display_title: title.to_string(),
                })
                .collect(),
        )
    }

    /// Parse manifest text; `yaml` selects the YAML parser
    pub fn parse(text: &str, yaml: bool) -> Result<Self> {
        let file: ManifestFile = if yaml {
            serde_yaml_ng::from_str(text)
                .map_err(|e| DocSearchError::manifest(format!("invalid YAML manifest: {}", e)))?
        } else {
            serde_json::from_str(text)
                .map_err(|e| DocSearchError::manifest(format!("invalid JSON manifest: {}", e)))?
        };
        let entries = match file {
            ManifestFile::Wrapped { docs } => docs,
            ManifestFile::List(docs) => docs,
        };
        Ok(Self::new(entries))
    }

    /// Load from a `.json`, `.yaml` or `.yml` file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| DocSearchError::io(path, e.to_string()))?;
        let yaml = matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("yaml") | Some("yml")
        );
        let manifest = Self::parse(&text, yaml)?;
        if manifest.is_empty() {
            return Err(DocSearchError::manifest(format!(
                "manifest {} contains no documents",
                path.display()
            )));
        }
        tracing::info!("Loaded manifest {} ({} docs)", path.display(), manifest.len());
        Ok(manifest)
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    pub fn uris(&self) -> impl Iterator<Item = &str> {
        self.docs.iter().map(|d| d.uri.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_parse_wrapped_json() {
        let manifest = Manifest::parse(
            r#"{"docs": [{"uri": "https://x/a", "display_title": "Getting Started"}]}"#,
            false,
        )
        .unwrap();
        assert_eq!(
            manifest.docs,
            vec![ManifestEntry {
                uri: "https://x/a".into(),
                display_title: "Getting Started".into()
            }]
        );
    }

    #[test]
    fn test_parse_list_yaml_with_title_alias() {
        let manifest = Manifest::parse(
            "- uri: https://x/a\n  title: Alpha\n- uri: https://x/b\n  display_title: Beta\n",
            true,
        )
        .unwrap();
        assert_eq!(manifest.len(), 2);
        assert_eq!(manifest.docs[0].display_title, "Alpha");
        assert_eq!(manifest.docs[1].display_title, "Beta");
    }

    #[test]
    fn test_dedup_and_blank_handling() {
        let manifest = Manifest::new(vec![
            ManifestEntry { uri: " https://x/a ".into(), display_title: "A".into() },
            ManifestEntry { uri: "https://x/a#frag".into(), display_title: "A again".into() },
            ManifestEntry { uri: "".into(), display_title: "Nothing".into() },
            ManifestEntry { uri: "https://x/b".into(), display_title: "  ".into() },
        ]);
        assert_eq!(manifest.len(), 2);
        assert_eq!(manifest.docs[0].uri, "https://x/a");
        assert_eq!(manifest.docs[1].display_title, "https://x/b");
    }

    #[test]
    fn test_invalid_manifest() {
        assert!(Manifest::parse("{not json", false).is_err());
        assert!(Manifest::parse("docs: 3", true).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("docs.yaml");
        std::fs::write(&path, "docs:\n  - uri: https://x/a\n    display_title: A\n").unwrap();
        let manifest = Manifest::load(&path).unwrap();
        assert_eq!(manifest.uris().collect::<Vec<_>>(), vec!["https://x/a"]);

        let empty = dir.path().join("empty.json");
        std::fs::write(&empty, "[]").unwrap();
        assert!(Manifest::load(&empty).is_err());

        assert!(Manifest::load(&dir.path().join("missing.json")).is_err());
    }

    #[test]
    fn test_builtin_is_nonempty_and_unique() {
        let manifest = Manifest::builtin();
        assert_eq!(manifest.len(), BUILTIN_MANIFEST.len());
    }
}
