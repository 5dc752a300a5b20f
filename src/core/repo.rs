//! In-memory simulated repository.
//!
//! The real repository engine is an external collaborator; this stand-in
//! supplies just enough tree semantics for an ephemeral install simulation:
//! ordered child nodes, typed properties, ACL read/write, and a minimal
//! repo-init script dialect. Built fresh per scan, dropped at scan end.

use crate::core::error::ScanError;
use crate::core::package::{AcHandling, AclEntry, PropertyValue};
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;

/// Property key under which ACL policies are stored on a node.
pub const ACL_PROPERTY: &str = "rep:policy";

/// One node of the simulated tree. Children are ordered by name so traversal
/// is deterministic.
#[derive(Debug, Clone)]
pub struct RepoNode {
    pub node_type: String,
    pub properties: FxHashMap<String, PropertyValue>,
    pub children: BTreeMap<String, RepoNode>,
}

impl RepoNode {
    fn new(node_type: &str) -> Self {
        Self {
            node_type: node_type.to_string(),
            properties: FxHashMap::default(),
            children: BTreeMap::new(),
        }
    }

    pub fn property(&self, key: &str) -> Option<&PropertyValue> {
        self.properties.get(key)
    }

    pub fn child_names(&self) -> Vec<&str> {
        self.children.keys().map(String::as_str).collect()
    }
}

/// The ephemeral repository one scan unit installs into.
#[derive(Debug)]
pub struct Repository {
    root: RepoNode,
}

impl Default for Repository {
    fn default() -> Self {
        Self::new()
    }
}

impl Repository {
    pub fn new() -> Self {
        Self { root: RepoNode::new("rep:root") }
    }

    fn segments(path: &str) -> Result<Vec<&str>, ScanError> {
        if !path.starts_with('/') || path.contains("//") {
            return Err(ScanError::Repo(format!("malformed path: {}", path)));
        }
        Ok(path.split('/').filter(|s| !s.is_empty()).collect())
    }

    pub fn node(&self, path: &str) -> Result<Option<&RepoNode>, ScanError> {
        let mut current = &self.root;
        for segment in Self::segments(path)? {
            match current.children.get(segment) {
                Some(child) => current = child,
                None => return Ok(None),
            }
        }
        Ok(Some(current))
    }

    pub fn node_exists(&self, path: &str) -> Result<bool, ScanError> {
        Ok(self.node(path)?.is_some())
    }

    pub fn root(&self) -> &RepoNode {
        &self.root
    }

    /// Create the node at `path`, creating intermediate nodes as needed.
    /// An existing node keeps its children and properties; only its type is
    /// updated.
    pub fn ensure_path(&mut self, path: &str, node_type: &str) -> Result<(), ScanError> {
        let segments = Self::segments(path)?;
        let mut current = &mut self.root;
        for segment in &segments {
            current = current
                .children
                .entry((*segment).to_string())
                .or_insert_with(|| RepoNode::new("nt:unstructured"));
        }
        if !segments.is_empty() {
            current.node_type = node_type.to_string();
        }
        Ok(())
    }

    /// Remove the subtree at `path`. Returns whether a node was removed.
    pub fn remove(&mut self, path: &str) -> Result<bool, ScanError> {
        let segments = Self::segments(path)?;
        let Some((leaf, ancestors)) = segments.split_last() else {
            return Err(ScanError::Repo("cannot remove the root node".to_string()));
        };
        let mut current = &mut self.root;
        for segment in ancestors {
            match current.children.get_mut(*segment) {
                Some(child) => current = child,
                None => return Ok(false),
            }
        }
        Ok(current.children.remove(*leaf).is_some())
    }

    pub fn set_property(
        &mut self,
        path: &str,
        key: &str,
        value: PropertyValue,
    ) -> Result<(), ScanError> {
        let node = self
            .node_mut(path)?
            .ok_or_else(|| ScanError::Repo(format!("no node at path: {}", path)))?;
        node.properties.insert(key.to_string(), value);
        Ok(())
    }

    fn node_mut(&mut self, path: &str) -> Result<Option<&mut RepoNode>, ScanError> {
        let mut current = &mut self.root;
        for segment in Self::segments(path)? {
            match current.children.get_mut(segment) {
                Some(child) => current = child,
                None => return Ok(None),
            }
        }
        Ok(Some(current))
    }

    /// Read the ACL policy entries stored at `path`.
    pub fn acl(&self, path: &str) -> Result<Vec<String>, ScanError> {
        match self.node(path)?.and_then(|n| n.property(ACL_PROPERTY)) {
            Some(PropertyValue::Strings(entries)) => Ok(entries.clone()),
            Some(other) => Ok(vec![other.to_string()]),
            None => Ok(Vec::new()),
        }
    }

    /// Apply one package ACL directive under the given handling mode. The
    /// target node is created if missing, mirroring installer behavior.
    pub fn apply_acl(&mut self, entry: &AclEntry, mode: AcHandling) -> Result<(), ScanError> {
        if mode == AcHandling::Ignore {
            return Ok(());
        }
        self.ensure_path(&entry.path, "nt:unstructured")?;
        let mut existing = self.acl(&entry.path)?;
        let rendered = format!(
            "{}:{}:{}",
            entry.principal,
            if entry.allow { "allow" } else { "deny" },
            entry.privileges.join(",")
        );
        match mode {
            AcHandling::Ignore => unreachable!("handled above"),
            AcHandling::Overwrite | AcHandling::Clear => existing = vec![rendered],
            AcHandling::Merge => {
                existing.retain(|e| !e.starts_with(&format!("{}:", entry.principal)));
                existing.push(rendered);
            }
            AcHandling::MergePreserve => {
                let has_principal =
                    existing.iter().any(|e| e.starts_with(&format!("{}:", entry.principal)));
                if !has_principal {
                    existing.push(rendered);
                }
            }
        }
        self.set_property(&entry.path, ACL_PROPERTY, PropertyValue::Strings(existing))
    }

    /// Apply one repo-init script. Supported statements, one per line:
    ///
    /// - `create path <path>`
    /// - `create service user <name>`
    /// - `register resource <path>` (returns the path for deferred handling)
    ///
    /// Blank lines and `#` comments are skipped; anything else is a
    /// repository error, matching installer behavior of refusing unknown
    /// statements.
    pub fn apply_repo_init(&mut self, script: &str) -> Result<Vec<String>, ScanError> {
        let mut registered = Vec::new();
        for line in script.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if let Some(path) = line.strip_prefix("create path ") {
                self.ensure_path(path.trim(), "nt:unstructured")?;
            } else if let Some(name) = line.strip_prefix("create service user ") {
                let path = format!("/home/users/system/{}", name.trim());
                self.ensure_path(&path, "rep:SystemUser")?;
            } else if let Some(path) = line.strip_prefix("register resource ") {
                registered.push(path.trim().to_string());
            } else {
                return Err(ScanError::Repo(format!("unknown repo-init statement: {}", line)));
            }
        }
        Ok(registered)
    }
}
