//! Read-only capability wrappers over the live repository.
//!
//! Checks only ever see these facades. Every inspection operation passes
//! through to the underlying repository; every operation classified as a
//! mutation fails with `ScanError::ReadOnly`, distinct from ordinary
//! repository errors, and never silently no-ops. Handles obtained from a
//! facade (node views) route back through the same enforcement, so the raw
//! delegate is never exposed.

use crate::core::error::ScanError;
use crate::core::package::{AclEntry, PropertyValue};
use crate::core::repo::{RepoNode, Repository};

/// Single classification point for rejected mutations.
fn deny(operation: &str) -> ScanError {
    ScanError::ReadOnly(format!("{} is not permitted during inspection", operation))
}

/// Per-event, read-only handle into the simulated repository.
///
/// Holds a shared borrow of the repository, so mutation is ruled out by the
/// type system as well; the mutating methods exist solely to reject bypass
/// attempts loudly instead of masking them.
#[derive(Debug)]
pub struct InspectSession<'a> {
    repo: &'a Repository,
}

impl<'a> InspectSession<'a> {
    pub fn new(repo: &'a Repository) -> Self {
        Self { repo }
    }

    pub fn node_exists(&self, path: &str) -> Result<bool, ScanError> {
        self.repo.node_exists(path)
    }

    pub fn node(&self, path: &str) -> Result<Option<NodeView<'a>>, ScanError> {
        Ok(self.repo.node(path)?.map(|node| NodeView { path: path.to_string(), node }))
    }

    pub fn root(&self) -> NodeView<'a> {
        NodeView { path: "/".to_string(), node: self.repo.root() }
    }

    pub fn acl(&self, path: &str) -> Result<Vec<String>, ScanError> {
        self.repo.acl(path)
    }

    // Mutating surface: always rejected.

    pub fn create_node(&self, _path: &str, _node_type: &str) -> Result<(), ScanError> {
        Err(deny("node creation"))
    }

    pub fn remove_node(&self, _path: &str) -> Result<(), ScanError> {
        Err(deny("node removal"))
    }

    pub fn set_property(&self, _path: &str, _key: &str, _value: PropertyValue) -> Result<(), ScanError> {
        Err(deny("property write"))
    }

    pub fn move_node(&self, _from: &str, _to: &str) -> Result<(), ScanError> {
        Err(deny("node move"))
    }

    pub fn apply_acl(&self, _entry: &AclEntry) -> Result<(), ScanError> {
        Err(deny("ACL policy write"))
    }

    pub fn refresh_lock(&self, _path: &str) -> Result<(), ScanError> {
        Err(deny("lock refresh"))
    }
}

/// Read surface over one node, obtained from an `InspectSession`.
#[derive(Debug)]
pub struct NodeView<'a> {
    path: String,
    node: &'a RepoNode,
}

impl<'a> NodeView<'a> {
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or("")
    }

    pub fn node_type(&self) -> &str {
        &self.node.node_type
    }

    pub fn property(&self, key: &str) -> Option<&PropertyValue> {
        self.node.property(key)
    }

    pub fn child_names(&self) -> Vec<&str> {
        self.node.child_names()
    }

    pub fn has_child(&self, name: &str) -> bool {
        self.node.children.contains_key(name)
    }

    pub fn child(&self, name: &str) -> Option<NodeView<'a>> {
        self.node.children.get(name).map(|node| NodeView {
            path: if self.path == "/" {
                format!("/{}", name)
            } else {
                format!("{}/{}", self.path, name)
            },
            node,
        })
    }

    // Mutating surface: always rejected, same policy as the session.

    pub fn set_property(&self, _key: &str, _value: PropertyValue) -> Result<(), ScanError> {
        Err(deny("property write"))
    }

    pub fn remove(&self) -> Result<(), ScanError> {
        Err(deny("node removal"))
    }
}
