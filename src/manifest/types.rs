//! Satis repository definition types
//!
//! Only the fields this tool reads or writes are typed; everything else in
//! the manifest passes through untouched and in its original order.

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

/// Repository type of a native git entry
pub const GIT_TYPE: &str = "git";

/// Repository type of an inline package entry
pub const PACKAGE_TYPE: &str = "package";

/// Top-level key holding the repository list
pub const REPOSITORIES_KEY: &str = "repositories";

/// Keys of a package entry that are always set by the generator
const GENERATED_KEYS: [&str; 4] = ["description", "name", "version", "source"];

/// Base manifest (satis.json)
#[derive(Debug, Clone, PartialEq)]
pub struct Manifest {
    /// Repository entries, in order
    pub repositories: Vec<ManifestEntry>,

    /// Every other top-level member (name, homepage, require, ...)
    pub extra: Map<String, Value>,

    /// Position of `repositories` among the top-level members
    pub(super) position: usize,
}

impl Manifest {
    /// Split a decoded JSON object into the repository list and the rest
    pub(super) fn from_object(root: Map<String, Value>) -> serde_json::Result<Self> {
        let mut repositories = Vec::new();
        let mut extra = Map::new();
        let mut position = 0;

        for (index, (key, value)) in root.into_iter().enumerate() {
            if key == REPOSITORIES_KEY {
                repositories = serde_json::from_value(value)?;
                position = index;
            } else {
                extra.insert(key, value);
            }
        }

        Ok(Self {
            repositories,
            extra,
            position,
        })
    }
}

impl Serialize for Manifest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.extra.len() + 1))?;
        let position = self.position.min(self.extra.len());

        for (index, (key, value)) in self.extra.iter().enumerate() {
            if index == position {
                map.serialize_entry(REPOSITORIES_KEY, &self.repositories)?;
            }
            map.serialize_entry(key, value)?;
        }
        if position == self.extra.len() {
            map.serialize_entry(REPOSITORIES_KEY, &self.repositories)?;
        }

        map.end()
    }
}

/// One element of the `repositories` list
///
/// The raw object is kept so entries this tool does not touch are written
/// back exactly as they were read.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "Map<String, Value>")]
pub struct ManifestEntry {
    fields: Map<String, Value>,
}

impl TryFrom<Map<String, Value>> for ManifestEntry {
    type Error = String;

    fn try_from(fields: Map<String, Value>) -> Result<Self, Self::Error> {
        match fields.get("type") {
            Some(Value::String(_)) => Ok(Self { fields }),
            Some(other) => Err(format!("repository type must be a string, found {}", other)),
            None => Err("repository entry has no \"type\"".to_string()),
        }
    }
}

impl Serialize for ManifestEntry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.fields.serialize(serializer)
    }
}

impl ManifestEntry {
    /// Wrap a package as an inline `"package"` repository
    pub fn package(package: &PackageEntry) -> serde_json::Result<Self> {
        let mut fields = Map::new();
        fields.insert("type".to_string(), Value::String(PACKAGE_TYPE.to_string()));
        fields.insert("package".to_string(), serde_json::to_value(package)?);
        Ok(Self { fields })
    }

    /// Repository type ("git", "vcs", "composer", "package", ...)
    pub fn kind(&self) -> &str {
        self.fields
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or_default()
    }

    /// Repository URL, for VCS-backed entries
    pub fn url(&self) -> Option<&str> {
        self.fields.get("url").and_then(Value::as_str)
    }

    /// Check whether this is a native git repository for the given URL
    pub fn is_git_repository_for(&self, url: &str) -> bool {
        self.kind() == GIT_TYPE && self.url() == Some(url)
    }

    #[cfg(test)]
    pub(crate) fn field(&self, key: &str) -> &Value {
        &self.fields[key]
    }
}

/// A single version-pinned package
///
/// Serialized as the package's defaults with the generated keys written
/// over them: a generated key already present in the defaults keeps its
/// position, the others follow in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct PackageEntry {
    /// Fields copied from the package's defaults
    pub defaults: Map<String, Value>,

    pub description: String,

    pub name: String,

    pub version: String,

    pub source: PackageSource,
}

impl PackageEntry {
    fn serialize_generated<M: SerializeMap>(&self, map: &mut M, key: &str) -> Result<(), M::Error> {
        match key {
            "description" => map.serialize_entry(key, &self.description),
            "name" => map.serialize_entry(key, &self.name),
            "version" => map.serialize_entry(key, &self.version),
            _ => map.serialize_entry(key, &self.source),
        }
    }
}

impl Serialize for PackageEntry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let missing = GENERATED_KEYS
            .iter()
            .filter(|key| !self.defaults.contains_key(**key))
            .count();
        let mut map = serializer.serialize_map(Some(self.defaults.len() + missing))?;

        for (key, value) in &self.defaults {
            if GENERATED_KEYS.contains(&key.as_str()) {
                self.serialize_generated(&mut map, key)?;
            } else {
                map.serialize_entry(key, value)?;
            }
        }
        for key in GENERATED_KEYS {
            if !self.defaults.contains_key(key) {
                self.serialize_generated(&mut map, key)?;
            }
        }

        map.end()
    }
}

/// Where a package version is fetched from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageSource {
    pub url: String,

    #[serde(rename = "type")]
    pub kind: String,

    /// Tag the version was published from
    pub reference: String,
}

impl PackageSource {
    /// A git tag source
    pub fn git(url: impl Into<String>, reference: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            kind: GIT_TYPE.to_string(),
            reference: reference.into(),
        }
    }
}
