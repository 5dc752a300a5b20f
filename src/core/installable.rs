//! Deferred post-extraction work units and their FIFO queue.
//!
//! The queue serializes the target repository's asynchronous installer
//! semantics into a deterministic drain: strict discovery order, each item
//! consumed exactly once, items discovered mid-drain appended to the tail.
//! Termination relies on package inputs not generating installables forever;
//! no cycle-detection limit is imposed here.

use crate::core::package::{InstallableDecl, PackageDescriptor, PackageId};
use std::collections::VecDeque;

/// A unit of deferred work discovered during extraction of its owning
/// package. Consumed exactly once; never re-queued.
#[derive(Debug, Clone)]
pub enum Installable {
    /// An embedded package archive to install later.
    EmbeddedPackage {
        parent: PackageId,
        path: String,
        package: Box<PackageDescriptor>,
    },
    /// A repository-initialization script to apply.
    RepoInit {
        parent: PackageId,
        path: String,
        scripts: Vec<String>,
    },
    /// A generic addressable resource to materialize.
    SlingResource { parent: PackageId, path: String },
}

impl Installable {
    /// The package that declared this work.
    pub fn parent_id(&self) -> &PackageId {
        match self {
            Installable::EmbeddedPackage { parent, .. }
            | Installable::RepoInit { parent, .. }
            | Installable::SlingResource { parent, .. } => parent,
        }
    }

    /// The repository path the work is addressed at.
    pub fn repo_path(&self) -> &str {
        match self {
            Installable::EmbeddedPackage { path, .. }
            | Installable::RepoInit { path, .. }
            | Installable::SlingResource { path, .. } => path,
        }
    }

    pub(crate) fn from_decl(decl: &InstallableDecl, parent: &PackageId) -> Self {
        match decl {
            InstallableDecl::RepoInit { path, scripts } => Installable::RepoInit {
                parent: parent.clone(),
                path: path.clone(),
                scripts: scripts.clone(),
            },
            InstallableDecl::Resource { path } => {
                Installable::SlingResource { parent: parent.clone(), path: path.clone() }
            }
        }
    }
}

/// Strict FIFO keyed by discovery order, never by package identity or type.
#[derive(Debug, Default)]
pub struct InstallableQueue {
    items: VecDeque<Installable>,
}

impl InstallableQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, installable: Installable) {
        self.items.push_back(installable);
    }

    pub fn pop(&mut self) -> Option<Installable> {
        self.items.pop_front()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }
}
