//! Check plugin protocol: the lifecycle trait every validator implements,
//! the factory abstraction that builds validators from declarative
//! configuration, and the decorator facades composed at configuration time
//! (aliasing, silencing). The engine holds one `Box<dyn ProgressCheck>` per
//! configured check and never knows how many decorator layers are present.

use crate::core::error::ScanError;
use crate::core::facade::{InspectSession, NodeView};
use crate::core::installable::Installable;
use crate::core::package::{Manifest, MetaInfo, PackageId, PackageLocation, PackageProperties, PathAction};
use crate::core::violation::Violation;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Lifecycle contract observed by every check.
///
/// Every hook has a no-op default so implementers override only what they
/// need. Hooks with repository access return a `Result`; any error aborts the
/// whole scan rather than being skipped per-check.
#[allow(unused_variables)]
pub trait ProgressCheck {
    /// Self-reported name; a configured alias overrides it in reports.
    fn check_name(&self) -> &str;

    /// Findings collected so far, in reporting order.
    fn reported_violations(&self) -> Vec<Violation>;

    fn started_scan(&mut self) {}

    fn identify_package(&mut self, id: &PackageId, location: &PackageLocation) {}

    fn read_manifest(&mut self, id: &PackageId, manifest: &Manifest) {}

    fn before_extract(
        &mut self,
        id: &PackageId,
        session: &InspectSession<'_>,
        properties: &PackageProperties,
        meta: &MetaInfo,
        subpackages: &[PackageId],
    ) -> Result<(), ScanError> {
        Ok(())
    }

    fn imported_path(
        &mut self,
        id: &PackageId,
        path: &str,
        node: &NodeView<'_>,
        action: PathAction,
    ) -> Result<(), ScanError> {
        Ok(())
    }

    fn deleted_path(
        &mut self,
        id: &PackageId,
        path: &str,
        session: &InspectSession<'_>,
    ) -> Result<(), ScanError> {
        Ok(())
    }

    fn after_extract(&mut self, id: &PackageId, session: &InspectSession<'_>) -> Result<(), ScanError> {
        Ok(())
    }

    fn identify_subpackage(&mut self, child: &PackageId, parent: &PackageId) {}

    fn before_sling_install(
        &mut self,
        scan_id: &PackageId,
        installable: &Installable,
        session: &InspectSession<'_>,
    ) -> Result<(), ScanError> {
        Ok(())
    }

    fn identify_embedded_package(
        &mut self,
        child: &PackageId,
        parent: &PackageId,
        installable: &Installable,
    ) {
    }

    fn applied_repo_init_scripts(
        &mut self,
        scan_id: &PackageId,
        scripts: &[String],
        installable: &Installable,
        session: &InspectSession<'_>,
    ) -> Result<(), ScanError> {
        Ok(())
    }

    fn after_scan_package(
        &mut self,
        scan_id: &PackageId,
        session: &InspectSession<'_>,
    ) -> Result<(), ScanError> {
        Ok(())
    }

    fn finished_scan(&mut self) {}

    /// Whether this check honors `set_silenced` natively. Checks that do not
    /// are transparently upgraded by `AliasFacade`.
    fn supports_silencing(&self) -> bool {
        false
    }

    /// Toggled only by the orchestration layer, never by the check itself.
    fn set_silenced(&mut self, silenced: bool) {}
}

/// Builds a configured check instance from a declarative payload.
///
/// Unknown or malformed configuration keys must fail here, before any scan
/// starts.
pub trait CheckFactory {
    fn check_name(&self) -> &'static str;

    fn new_instance(&self, config: &serde_json::Value) -> Result<Box<dyn ProgressCheck>, ScanError>;
}

/// Deserialize a check configuration payload, rejecting unknown keys.
///
/// `Null` (config omitted) yields the default configuration. Intended for
/// config structs deriving `Deserialize` with `deny_unknown_fields`.
pub fn parse_config<T>(check_name: &str, config: &serde_json::Value) -> Result<T, ScanError>
where
    T: DeserializeOwned + Default,
{
    if config.is_null() {
        return Ok(T::default());
    }
    serde_json::from_value(config.clone())
        .map_err(|err| ScanError::Config(format!("{}: {}", check_name, err)))
}

/// Declarative configuration record for one check in a scan plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CheckSpec {
    /// Registry name of the check factory.
    pub name: String,
    /// Report name override; always wins over the self-reported name.
    #[serde(default)]
    pub alias: Option<String>,
    #[serde(default)]
    pub config: serde_json::Value,
    /// Leave the check out of the scan entirely.
    #[serde(default)]
    pub skip: bool,
}

impl CheckSpec {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            alias: None,
            config: serde_json::Value::Null,
            skip: false,
        }
    }

    pub fn with_alias(mut self, alias: &str) -> Self {
        self.alias = Some(alias.to_string());
        self
    }

    pub fn with_config(mut self, config: serde_json::Value) -> Self {
        self.config = config;
        self
    }
}

/// Upgrades a check without native silencing support.
///
/// Forwards every lifecycle call unchanged (a silenced check cannot detect
/// its state and change behavior), but drops findings reported while
/// silenced instead of storing them. Un-silencing resumes collection for
/// subsequent events only.
///
/// The facade diffs the wrapped check's reported collection, so a wrapped
/// check that dedupes its own findings can hide a re-report of a finding
/// first seen while silenced. Checks that own a `ViolationCollector` should
/// instead route `set_silenced` to the collector, which silences at the
/// point of storage.
pub struct SilencingFacade {
    wrapped: Box<dyn ProgressCheck>,
    silenced: bool,
    kept: Vec<Violation>,
    seen: usize,
}

impl SilencingFacade {
    pub fn new(wrapped: Box<dyn ProgressCheck>) -> Self {
        let seen = wrapped.reported_violations().len();
        Self { wrapped, silenced: false, kept: Vec::new(), seen }
    }

    /// Fold newly reported findings into the kept collection, or drop them
    /// while silenced.
    fn sync(&mut self) {
        let all = self.wrapped.reported_violations();
        if all.len() > self.seen {
            if !self.silenced {
                self.kept.extend_from_slice(&all[self.seen..]);
            }
            self.seen = all.len();
        }
    }
}

impl ProgressCheck for SilencingFacade {
    fn check_name(&self) -> &str {
        self.wrapped.check_name()
    }

    fn reported_violations(&self) -> Vec<Violation> {
        let mut visible = self.kept.clone();
        let all = self.wrapped.reported_violations();
        if all.len() > self.seen && !self.silenced {
            visible.extend_from_slice(&all[self.seen..]);
        }
        visible
    }

    fn started_scan(&mut self) {
        self.wrapped.started_scan();
        // the wrapped check may reset its collection at scan start
        self.kept.clear();
        self.seen = self.wrapped.reported_violations().len();
    }

    fn identify_package(&mut self, id: &PackageId, location: &PackageLocation) {
        self.wrapped.identify_package(id, location);
        self.sync();
    }

    fn read_manifest(&mut self, id: &PackageId, manifest: &Manifest) {
        self.wrapped.read_manifest(id, manifest);
        self.sync();
    }

    fn before_extract(
        &mut self,
        id: &PackageId,
        session: &InspectSession<'_>,
        properties: &PackageProperties,
        meta: &MetaInfo,
        subpackages: &[PackageId],
    ) -> Result<(), ScanError> {
        let result = self.wrapped.before_extract(id, session, properties, meta, subpackages);
        self.sync();
        result
    }

    fn imported_path(
        &mut self,
        id: &PackageId,
        path: &str,
        node: &NodeView<'_>,
        action: PathAction,
    ) -> Result<(), ScanError> {
        let result = self.wrapped.imported_path(id, path, node, action);
        self.sync();
        result
    }

    fn deleted_path(
        &mut self,
        id: &PackageId,
        path: &str,
        session: &InspectSession<'_>,
    ) -> Result<(), ScanError> {
        let result = self.wrapped.deleted_path(id, path, session);
        self.sync();
        result
    }

    fn after_extract(&mut self, id: &PackageId, session: &InspectSession<'_>) -> Result<(), ScanError> {
        let result = self.wrapped.after_extract(id, session);
        self.sync();
        result
    }

    fn identify_subpackage(&mut self, child: &PackageId, parent: &PackageId) {
        self.wrapped.identify_subpackage(child, parent);
        self.sync();
    }

    fn before_sling_install(
        &mut self,
        scan_id: &PackageId,
        installable: &Installable,
        session: &InspectSession<'_>,
    ) -> Result<(), ScanError> {
        let result = self.wrapped.before_sling_install(scan_id, installable, session);
        self.sync();
        result
    }

    fn identify_embedded_package(
        &mut self,
        child: &PackageId,
        parent: &PackageId,
        installable: &Installable,
    ) {
        self.wrapped.identify_embedded_package(child, parent, installable);
        self.sync();
    }

    fn applied_repo_init_scripts(
        &mut self,
        scan_id: &PackageId,
        scripts: &[String],
        installable: &Installable,
        session: &InspectSession<'_>,
    ) -> Result<(), ScanError> {
        let result = self.wrapped.applied_repo_init_scripts(scan_id, scripts, installable, session);
        self.sync();
        result
    }

    fn after_scan_package(
        &mut self,
        scan_id: &PackageId,
        session: &InspectSession<'_>,
    ) -> Result<(), ScanError> {
        let result = self.wrapped.after_scan_package(scan_id, session);
        self.sync();
        result
    }

    fn finished_scan(&mut self) {
        self.wrapped.finished_scan();
        self.sync();
    }

    fn supports_silencing(&self) -> bool {
        true
    }

    fn set_silenced(&mut self, silenced: bool) {
        // findings reported before the toggle keep their original fate
        self.sync();
        self.silenced = silenced;
    }
}

/// Configuration-time decorator ensuring a configured alias is respected and
/// that every check supports silencing.
pub struct AliasFacade {
    wrapped: Box<dyn ProgressCheck>,
    alias: Option<String>,
}

impl AliasFacade {
    pub fn new(check: Box<dyn ProgressCheck>, alias: Option<String>) -> Self {
        let wrapped = if check.supports_silencing() {
            check
        } else {
            Box::new(SilencingFacade::new(check))
        };
        Self { wrapped, alias }
    }
}

impl ProgressCheck for AliasFacade {
    fn check_name(&self) -> &str {
        match &self.alias {
            Some(alias) => alias,
            None => self.wrapped.check_name(),
        }
    }

    fn reported_violations(&self) -> Vec<Violation> {
        self.wrapped.reported_violations()
    }

    fn started_scan(&mut self) {
        self.wrapped.started_scan();
    }

    fn identify_package(&mut self, id: &PackageId, location: &PackageLocation) {
        self.wrapped.identify_package(id, location);
    }

    fn read_manifest(&mut self, id: &PackageId, manifest: &Manifest) {
        self.wrapped.read_manifest(id, manifest);
    }

    fn before_extract(
        &mut self,
        id: &PackageId,
        session: &InspectSession<'_>,
        properties: &PackageProperties,
        meta: &MetaInfo,
        subpackages: &[PackageId],
    ) -> Result<(), ScanError> {
        self.wrapped.before_extract(id, session, properties, meta, subpackages)
    }

    fn imported_path(
        &mut self,
        id: &PackageId,
        path: &str,
        node: &NodeView<'_>,
        action: PathAction,
    ) -> Result<(), ScanError> {
        self.wrapped.imported_path(id, path, node, action)
    }

    fn deleted_path(
        &mut self,
        id: &PackageId,
        path: &str,
        session: &InspectSession<'_>,
    ) -> Result<(), ScanError> {
        self.wrapped.deleted_path(id, path, session)
    }

    fn after_extract(&mut self, id: &PackageId, session: &InspectSession<'_>) -> Result<(), ScanError> {
        self.wrapped.after_extract(id, session)
    }

    fn identify_subpackage(&mut self, child: &PackageId, parent: &PackageId) {
        self.wrapped.identify_subpackage(child, parent);
    }

    fn before_sling_install(
        &mut self,
        scan_id: &PackageId,
        installable: &Installable,
        session: &InspectSession<'_>,
    ) -> Result<(), ScanError> {
        self.wrapped.before_sling_install(scan_id, installable, session)
    }

    fn identify_embedded_package(
        &mut self,
        child: &PackageId,
        parent: &PackageId,
        installable: &Installable,
    ) {
        self.wrapped.identify_embedded_package(child, parent, installable);
    }

    fn applied_repo_init_scripts(
        &mut self,
        scan_id: &PackageId,
        scripts: &[String],
        installable: &Installable,
        session: &InspectSession<'_>,
    ) -> Result<(), ScanError> {
        self.wrapped.applied_repo_init_scripts(scan_id, scripts, installable, session)
    }

    fn after_scan_package(
        &mut self,
        scan_id: &PackageId,
        session: &InspectSession<'_>,
    ) -> Result<(), ScanError> {
        self.wrapped.after_scan_package(scan_id, session)
    }

    fn finished_scan(&mut self) {
        self.wrapped.finished_scan();
    }

    fn supports_silencing(&self) -> bool {
        true
    }

    fn set_silenced(&mut self, silenced: bool) {
        self.wrapped.set_silenced(silenced);
    }
}
