//! Satis repository definition handling
//!
//! This module provides:
//! - Loading the base manifest and validating its `repositories` member
//! - Merging discovered releases into it
//! - Writing the result as pretty-printed JSON, to a file or to stdout
//!
//! # Output
//!
//! ```json
//! {
//!     "name": "my/repo",
//!     "repositories": [
//!         {
//!             "type": "package",
//!             "package": {
//!                 "description": "Autogenerated by satisfy",
//!                 "name": "acme/x",
//!                 "version": "1.0.0",
//!                 "source": { "url": "git://x", "type": "git", "reference": "v1.0.0" }
//!             }
//!         }
//!     ]
//! }
//! ```

mod merger;
mod types;

use std::io::Write;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{hints, ResultExt, SatisfyError};
use types::REPOSITORIES_KEY;

pub use merger::{ManifestMerger, MergeSummary, PackageReleases};
pub use types::Manifest;

/// Indentation of the generated JSON
const INDENT: &[u8] = b"    ";

impl Manifest {
    /// Load the base manifest from a JSON file
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, SatisfyError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .context_with_hint(format!("Cannot open {}", path.display()), hints::manifest())?;

        Self::parse(&content).map_err(|e| {
            SatisfyError::config_error_with_hint(
                format!("Cannot parse repo definition in {}", path.display()),
                Some(e),
                hints::manifest(),
            )
        })
    }

    /// Parse a manifest from a JSON string
    ///
    /// The `repositories` member is required, even if empty.
    pub fn parse(content: &str) -> Result<Self> {
        let root: Map<String, Value> =
            serde_json::from_str(content).context("Repo definition must be a JSON object")?;

        match root.get(REPOSITORIES_KEY) {
            None | Some(Value::Null) => {
                bail!("Repo file must contain repositories member, even if empty")
            }
            Some(_) => {}
        }

        Self::from_object(root).context("Invalid repositories member")
    }

    /// Serialize with four-space indentation and unescaped slashes
    pub fn to_pretty_json(&self) -> Result<String> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(INDENT);
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.serialize(&mut serializer)
            .context("Failed to serialize manifest")?;

        let mut output = String::from_utf8(buf).context("Manifest is not valid UTF-8")?;
        output.push('\n');
        Ok(output)
    }

    /// Write the manifest to a file, atomically
    ///
    /// The content goes to a temporary file next to the target and is then
    /// renamed over it, so a failure never leaves a truncated manifest.
    pub fn write_to_path<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let output = self.to_pretty_json()?;

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut file = tempfile::NamedTempFile::new_in(dir)
            .with_context(|| format!("Failed to create temporary file in {}", dir.display()))?;
        file.write_all(output.as_bytes())
            .with_context(|| format!("Failed to write {}", path.display()))?;
        file.persist(path)
            .with_context(|| format!("Failed to write {}", path.display()))?;

        Ok(())
    }

    /// Write the manifest to standard output
    pub fn write_to_stdout(&self) -> Result<()> {
        let output = self.to_pretty_json()?;
        let stdout = std::io::stdout();
        let mut handle = stdout.lock();
        handle
            .write_all(output.as_bytes())
            .context("Failed to write manifest to stdout")?;
        handle.flush().context("Failed to flush stdout")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_requires_repositories() {
        let err = Manifest::parse(r#"{ "name": "my/repo" }"#).unwrap_err();
        assert!(err.to_string().contains("repositories member"));

        let err = Manifest::parse(r#"{ "repositories": null }"#).unwrap_err();
        assert!(err.to_string().contains("repositories member"));

        assert!(Manifest::parse(r#"{ "repositories": {} }"#).is_err());
        assert!(Manifest::parse(r#"[]"#).is_err());
        assert!(Manifest::parse(r#"{ "repositories": [ { "url": "no-type" } ] }"#).is_err());
    }

    #[test]
    fn test_passthrough_fields_survive() {
        let manifest = Manifest::parse(
            r#"{
                "name": "my/repo",
                "homepage": "http://packages.example.com",
                "repositories": [
                    { "type": "vcs", "url": "https://example.com/a.git", "no-api": true }
                ],
                "require-all": true
            }"#,
        )
        .unwrap();

        assert_eq!(manifest.extra["name"], "my/repo");
        assert_eq!(manifest.extra["require-all"], true);
        assert_eq!(manifest.repositories[0].field("no-api"), true);

        let output = manifest.to_pretty_json().unwrap();
        let reparsed = Manifest::parse(&output).unwrap();
        assert_eq!(reparsed, manifest);

        // Top-level members keep their original order
        let name = output.find("\"name\"").unwrap();
        let repositories = output.find("\"repositories\"").unwrap();
        let require_all = output.find("\"require-all\"").unwrap();
        assert!(name < repositories && repositories < require_all);
    }

    #[test]
    fn test_pretty_output_format() {
        let manifest = Manifest::parse(
            r#"{ "repositories": [ { "type": "git", "url": "https://example.com/a.git" } ] }"#,
        )
        .unwrap();
        let output = manifest.to_pretty_json().unwrap();

        assert_eq!(
            output,
            "{\n    \"repositories\": [\n        {\n            \"type\": \"git\",\n            \"url\": \"https://example.com/a.git\"\n        }\n    ]\n}\n"
        );
    }

    #[test]
    fn test_untouched_entries_round_trip_exactly() {
        let input = "{\n    \"repositories\": [\n        {\n            \"no-api\": true,\n            \"url\": null,\n            \"type\": \"vcs\"\n        }\n    ]\n}\n";
        let manifest = Manifest::parse(input).unwrap();

        assert_eq!(manifest.repositories[0].kind(), "vcs");
        assert_eq!(manifest.repositories[0].url(), None);
        assert_eq!(manifest.to_pretty_json().unwrap(), input);
    }

    #[test]
    fn test_write_to_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("satis.json");
        std::fs::write(&path, "stale").unwrap();

        let manifest = Manifest::parse(r#"{ "repositories": [] }"#).unwrap();
        manifest.write_to_path(&path).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, "{\n    \"repositories\": []\n}\n");
    }

    #[test]
    fn test_load_from_path_errors() {
        let dir = tempfile::tempdir().unwrap();

        let err = Manifest::load_from_path(dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, SatisfyError::Config { .. }));

        let path = dir.path().join("satis.json");
        std::fs::write(&path, r#"{ "name": "x" }"#).unwrap();
        let err = Manifest::load_from_path(&path).unwrap_err();
        assert!(err.to_string().contains("Cannot parse repo definition"));
    }
}
