//! Scan engine: the ordered installation state machine.
//!
//! One engine drives one scan unit. Per package the state order is strict:
//! identify, read manifest, before-extract, interleaved path imports and
//! deletes, discovery of sub-packages and installables, ACL and repo-init
//! application, after-extract, a recursive drain of deferred installables,
//! and finally after-scan-package. The whole unit is bracketed by a single
//! started-scan and finished-scan pair.
//!
//! The engine is the single writer: it mutates the repository through the
//! raw handle and exposes only read-only `InspectSession` facades to checks.
//! Execution is single-threaded and deterministic; every event completes
//! across all checks, in configuration order, before the machine advances.

use crate::core::check::ProgressCheck;
use crate::core::error::ScanError;
use crate::core::facade::InspectSession;
use crate::core::installable::{Installable, InstallableQueue};
use crate::core::package::{PackageDescriptor, PackageId, PathAction};
use crate::core::repo::Repository;
use crate::core::violation::CheckReport;

pub struct ScanEngine {
    repo: Repository,
    checks: Vec<Box<dyn ProgressCheck>>,
}

impl ScanEngine {
    pub(crate) fn new(repo: Repository, checks: Vec<Box<dyn ProgressCheck>>) -> Self {
        Self { repo, checks }
    }

    /// Run one scan unit over the given packages, sharing one repository
    /// state across all of them. Pre-install packages are extracted first,
    /// inside the started/finished bracket but with every check silenced:
    /// checks observe those state transitions (so stateful checks account
    /// for pre-installed content) while their findings are dropped.
    pub(crate) fn run(
        &mut self,
        pre_install: &[PackageDescriptor],
        packages: &[PackageDescriptor],
    ) -> Result<(), ScanError> {
        for check in &mut self.checks {
            check.started_scan();
        }
        if !pre_install.is_empty() {
            for check in &mut self.checks {
                check.set_silenced(true);
            }
            let result = pre_install.iter().try_for_each(|desc| self.scan_package(desc));
            for check in &mut self.checks {
                check.set_silenced(false);
            }
            result?;
        }
        for desc in packages {
            self.scan_package(desc)?;
        }
        for check in &mut self.checks {
            check.finished_scan();
        }
        Ok(())
    }

    /// Consume the engine, producing per-check reports in configuration
    /// order. The repository is dropped here on every exit path.
    pub(crate) fn into_reports(self) -> Vec<CheckReport> {
        self.checks
            .iter()
            .map(|check| CheckReport {
                check_name: check.check_name().to_string(),
                violations: check.reported_violations(),
            })
            .collect()
    }

    /// Run the full per-package sequence. Any failure is wrapped with the
    /// identity of this package; for a failure inside an embedded package the
    /// innermost identity wins.
    fn scan_package(&mut self, desc: &PackageDescriptor) -> Result<(), ScanError> {
        self.scan_package_inner(desc).map_err(|err| err.abort(desc.location()))
    }

    fn scan_package_inner(&mut self, desc: &PackageDescriptor) -> Result<(), ScanError> {
        let id = &desc.id;
        let location = desc.location();

        // IDENTIFY
        for check in &mut self.checks {
            check.identify_package(id, &location);
        }

        // READ_MANIFEST
        for check in &mut self.checks {
            check.read_manifest(id, &desc.manifest);
        }

        // BEFORE_EXTRACT
        let subpackage_ids: Vec<PackageId> =
            desc.subpackages.iter().map(|sub| sub.package.id.clone()).collect();
        {
            let session = InspectSession::new(&self.repo);
            for check in &mut self.checks {
                check.before_extract(id, &session, &desc.properties, &desc.meta, &subpackage_ids)?;
            }
        }

        // IMPORT_PATH / DELETE_PATH, one event per tree entry in archive
        // traversal order.
        for entry in &desc.entries {
            match entry.action {
                PathAction::Delete => {
                    self.repo.remove(&entry.path)?;
                    let session = InspectSession::new(&self.repo);
                    for check in &mut self.checks {
                        check.deleted_path(id, &entry.path, &session)?;
                    }
                }
                action => {
                    self.repo.ensure_path(&entry.path, &entry.node_type)?;
                    if action != PathAction::Noop {
                        for (key, value) in &entry.properties {
                            self.repo.set_property(&entry.path, key, value.clone())?;
                        }
                    }
                    let session = InspectSession::new(&self.repo);
                    let node = session
                        .node(&entry.path)?
                        .ok_or_else(|| ScanError::Repo(format!("imported node vanished: {}", entry.path)))?;
                    for check in &mut self.checks {
                        check.imported_path(id, &entry.path, &node, action)?;
                    }
                }
            }
        }

        // DISCOVER_SUBPACKAGES / INSTALLABLES: queued in discovery order,
        // never extracted immediately. Descriptors list embedded archives
        // separately from tree entries, so discovery fires after the entry
        // loop rather than interleaved with the archive traversal.
        let mut queue = InstallableQueue::new();
        for sub in &desc.subpackages {
            for check in &mut self.checks {
                check.identify_subpackage(&sub.package.id, id);
            }
            queue.push(Installable::EmbeddedPackage {
                parent: id.clone(),
                path: sub.path.clone(),
                package: Box::new(sub.package.clone()),
            });
        }
        for decl in &desc.installables {
            queue.push(Installable::from_decl(decl, id));
        }

        // The package's own ACL and repo-init directives apply strictly
        // between BEFORE_EXTRACT and AFTER_EXTRACT.
        for acl in &desc.acl {
            self.repo.apply_acl(acl, desc.properties.ac_handling)?;
        }
        if !desc.repo_init.is_empty() {
            let inline = Installable::RepoInit {
                parent: id.clone(),
                path: format!("/etc/packages/{}/repoinit", id.name),
                scripts: desc.repo_init.clone(),
            };
            self.apply_repo_init_scripts(id, &inline, &mut queue)?;
        }

        // AFTER_EXTRACT
        {
            let session = InspectSession::new(&self.repo);
            for check in &mut self.checks {
                check.after_extract(id, &session)?;
            }
        }

        // DRAIN_INSTALLABLES: fixed-point loop; items discovered mid-drain
        // append to the tail and are consumed before the queue is empty.
        while let Some(installable) = queue.pop() {
            self.drain_one(id, &installable, &mut queue)?;
        }

        // AFTER_SCAN_PACKAGE
        {
            let session = InspectSession::new(&self.repo);
            for check in &mut self.checks {
                check.after_scan_package(id, &session)?;
            }
        }

        Ok(())
    }

    fn drain_one(
        &mut self,
        scan_id: &PackageId,
        installable: &Installable,
        queue: &mut InstallableQueue,
    ) -> Result<(), ScanError> {
        match installable {
            Installable::EmbeddedPackage { parent, path, package } => {
                for check in &mut self.checks {
                    check.identify_embedded_package(&package.id, parent, installable);
                }
                // An embedded package without its own archive location is
                // identified by the path it was found at.
                let mut embedded = (**package).clone();
                if embedded.node_path.is_none() && embedded.file.is_none() {
                    embedded.node_path = Some(path.clone());
                }
                self.scan_package(&embedded)?;
            }
            Installable::RepoInit { .. } => {
                self.apply_repo_init_scripts(scan_id, installable, queue)?;
            }
            Installable::SlingResource { path, .. } => {
                {
                    let session = InspectSession::new(&self.repo);
                    for check in &mut self.checks {
                        check.before_sling_install(scan_id, installable, &session)?;
                    }
                }
                self.repo.ensure_path(path, "nt:unstructured")?;
            }
        }
        Ok(())
    }

    /// Apply repo-init scripts, queue any resources they register, then fire
    /// the corresponding lifecycle event.
    fn apply_repo_init_scripts(
        &mut self,
        scan_id: &PackageId,
        installable: &Installable,
        queue: &mut InstallableQueue,
    ) -> Result<(), ScanError> {
        let Installable::RepoInit { scripts, .. } = installable else {
            return Err(ScanError::Repo("not a repo-init installable".to_string()));
        };
        for script in scripts {
            for path in self.repo.apply_repo_init(script)? {
                queue.push(Installable::SlingResource { parent: scan_id.clone(), path });
            }
        }
        let session = InspectSession::new(&self.repo);
        for check in &mut self.checks {
            check.applied_repo_init_scripts(scan_id, scripts, installable, &session)?;
        }
        Ok(())
    }
}
