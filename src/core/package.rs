//! Package data model: structured ids, descriptors, and the serialized view
//! of a content package archive.
//!
//! Archive parsing itself is an external concern. A `PackageDescriptor` is the
//! opaque, already-parsed handle the scan engine consumes: manifest headers,
//! install properties, an ordered list of tree entries, embedded sub-package
//! archives, and declared installables.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Stable identity of a package: the sole correlation key linking violations,
/// installables, and extraction order across nested packages.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PackageId {
    pub group: String,
    pub name: String,
    pub version: String,
}

impl PackageId {
    pub fn new(group: &str, name: &str, version: &str) -> Self {
        Self {
            group: group.to_string(),
            name: name.to_string(),
            version: version.to_string(),
        }
    }
}

impl fmt::Display for PackageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group, self.name, self.version)
    }
}

impl FromStr for PackageId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split(':');
        match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(group), Some(name), Some(version), None) if !name.is_empty() => {
                Ok(PackageId::new(group, name, version))
            }
            _ => Err(format!("invalid package id (expected group:name:version): {}", s)),
        }
    }
}

/// Identification of an in-flight package for abort messages.
///
/// Preference order when reporting a failure: repository node path, then
/// archive file, then package id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PackageLocation {
    NodePath(String),
    File(PathBuf),
    Id(PackageId),
    Unknown,
}

impl fmt::Display for PackageLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PackageLocation::NodePath(path) => write!(f, "{}", path),
            PackageLocation::File(file) => write!(f, "{}", file.display()),
            PackageLocation::Id(id) => write!(f, "{}", id),
            PackageLocation::Unknown => write!(f, "unknown source"),
        }
    }
}

/// Access control handling mode declared by a package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AcHandling {
    #[default]
    Ignore,
    Overwrite,
    Merge,
    MergePreserve,
    Clear,
}

impl fmt::Display for AcHandling {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            AcHandling::Ignore => "ignore",
            AcHandling::Overwrite => "overwrite",
            AcHandling::Merge => "merge",
            AcHandling::MergePreserve => "merge_preserve",
            AcHandling::Clear => "clear",
        };
        write!(f, "{}", label)
    }
}

impl FromStr for AcHandling {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ignore" => Ok(AcHandling::Ignore),
            "overwrite" => Ok(AcHandling::Overwrite),
            "merge" => Ok(AcHandling::Merge),
            "merge_preserve" => Ok(AcHandling::MergePreserve),
            "clear" => Ok(AcHandling::Clear),
            other => Err(format!("unknown acHandling mode: {}", other)),
        }
    }
}

/// What happened to a repository path during extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PathAction {
    #[default]
    Add,
    Modify,
    Delete,
    Noop,
}

/// Typed property value stored on a repository node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Bool(bool),
    Long(i64),
    String(String),
    Strings(Vec<String>),
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Bool(v) => write!(f, "{}", v),
            PropertyValue::Long(v) => write!(f, "{}", v),
            PropertyValue::String(v) => write!(f, "{}", v),
            PropertyValue::Strings(v) => write!(f, "{}", v.join(",")),
        }
    }
}

/// Manifest headers of a package archive.
pub type Manifest = BTreeMap<String, String>;

/// Install metadata declared by a package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PackageProperties {
    #[serde(default)]
    pub ac_handling: AcHandling,
    #[serde(default)]
    pub description: Option<String>,
}

/// Workspace metadata bundled with a package (filter roots and friends).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct MetaInfo {
    #[serde(default)]
    pub filter_roots: Vec<String>,
}

/// One serialized tree entry, in archive traversal order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageEntry {
    pub path: String,
    #[serde(default)]
    pub action: PathAction,
    #[serde(default = "default_node_type")]
    pub node_type: String,
    #[serde(default)]
    pub properties: BTreeMap<String, PropertyValue>,
}

fn default_node_type() -> String {
    "nt:unstructured".to_string()
}

/// One access control directive carried by a package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AclEntry {
    pub path: String,
    pub principal: String,
    #[serde(default = "default_allow")]
    pub allow: bool,
    #[serde(default)]
    pub privileges: Vec<String>,
}

fn default_allow() -> bool {
    true
}

/// An embedded sub-package archive and the repository path it was found at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubPackage {
    pub path: String,
    pub package: PackageDescriptor,
}

/// A deferred post-extraction action declared by a package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum InstallableDecl {
    RepoInit { path: String, scripts: Vec<String> },
    Resource { path: String },
}

/// Parsed view of one content package archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageDescriptor {
    pub id: PackageId,
    /// Archive file this descriptor was read from, when known.
    #[serde(default)]
    pub file: Option<PathBuf>,
    /// Repository path the archive was found at (embedded packages).
    #[serde(default)]
    pub node_path: Option<String>,
    #[serde(default)]
    pub manifest: Manifest,
    #[serde(default)]
    pub properties: PackageProperties,
    #[serde(default)]
    pub meta: MetaInfo,
    #[serde(default)]
    pub entries: Vec<PackageEntry>,
    #[serde(default)]
    pub acl: Vec<AclEntry>,
    /// Repository-initialization scripts applied during this package's own
    /// extraction window.
    #[serde(default)]
    pub repo_init: Vec<String>,
    #[serde(default)]
    pub subpackages: Vec<SubPackage>,
    #[serde(default)]
    pub installables: Vec<InstallableDecl>,
}

impl PackageDescriptor {
    pub fn new(id: PackageId) -> Self {
        Self {
            id,
            file: None,
            node_path: None,
            manifest: Manifest::new(),
            properties: PackageProperties::default(),
            meta: MetaInfo::default(),
            entries: Vec::new(),
            acl: Vec::new(),
            repo_init: Vec::new(),
            subpackages: Vec::new(),
            installables: Vec::new(),
        }
    }

    /// Best identification available for abort messages: node path, then
    /// archive file, then package id.
    pub fn location(&self) -> PackageLocation {
        if let Some(path) = &self.node_path {
            PackageLocation::NodePath(path.clone())
        } else if let Some(file) = &self.file {
            PackageLocation::File(file.clone())
        } else {
            PackageLocation::Id(self.id.clone())
        }
    }

    /// Content digest of the archive view, recorded at identification time so
    /// reports can be correlated back to the exact artifact scanned.
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        // Serialization of a descriptor is deterministic (ordered maps).
        let bytes = serde_json::to_vec(self).unwrap_or_default();
        hasher.update(&bytes);
        format!("{:x}", hasher.finalize())
    }
}
