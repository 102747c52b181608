//! Per-file state threaded through the traversal.
//!
//! A [`FileContext`] is created fresh for each file, handed `&mut` to every
//! handler, and dropped when the file is done. Nothing in it outlives or is
//! shared across files.

use std::any::{Any, TypeId};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};

// ============================================================================
// Import State
// ============================================================================

/// Names imported so far, keyed by originating module.
///
/// Grows monotonically during the walk: at any node it reflects exactly the
/// `from X import a, b` statements visited before that node. Only unaliased
/// names are recorded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportState {
    modules: BTreeMap<String, BTreeSet<String>>,
}

impl ImportState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `names` as imported from `module`.
    pub fn record<I, S>(&mut self, module: &str, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let entry = self.modules.entry(module.to_string()).or_default();
        entry.extend(names.into_iter().map(Into::into));
    }

    /// Was `name` imported from `module` so far?
    pub fn contains(&self, module: &str, name: &str) -> bool {
        self.modules
            .get(module)
            .is_some_and(|names| names.contains(name))
    }

    /// Names imported from `module` so far.
    pub fn names(&self, module: &str) -> impl Iterator<Item = &str> {
        self.modules
            .get(module)
            .into_iter()
            .flat_map(|names| names.iter().map(String::as_str))
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

// ============================================================================
// File Context
// ============================================================================

/// Mutable per-file context passed to every handler.
pub struct FileContext {
    namespace: String,
    path: Option<PathBuf>,
    imports: ImportState,
    scratch: HashMap<TypeId, Box<dyn Any>>,
}

impl FileContext {
    /// Context for one file. Imports are tracked for modules equal to
    /// `namespace` or under `namespace.`.
    pub fn new(namespace: impl Into<String>, path: Option<&Path>) -> Self {
        FileContext {
            namespace: namespace.into(),
            path: path.map(Path::to_path_buf),
            imports: ImportState::new(),
            scratch: HashMap::new(),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// File name of the path being rewritten, if any.
    pub fn file_name(&self) -> Option<&str> {
        self.path.as_deref()?.file_name()?.to_str()
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Full path of a framework module: `"db"` -> `"django.db"`.
    pub fn framework_module(&self, submodule: &str) -> String {
        if submodule.is_empty() {
            self.namespace.clone()
        } else {
            format!("{}.{}", self.namespace, submodule)
        }
    }

    /// Does `module` belong to the tracked framework namespace?
    pub fn in_namespace(&self, module: &str) -> bool {
        module == self.namespace
            || module
                .strip_prefix(self.namespace.as_str())
                .is_some_and(|rest| rest.starts_with('.'))
    }

    pub fn imports(&self) -> &ImportState {
        &self.imports
    }

    pub fn imports_mut(&mut self) -> &mut ImportState {
        &mut self.imports
    }

    /// Typed scratch storage for cross-node bookkeeping, created on first use.
    ///
    /// One value per type per file; rules define private types to keep their
    /// entries apart.
    pub fn scratch<T: Default + 'static>(&mut self) -> &mut T {
        let slot = self
            .scratch
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Box::new(T::default()));
        match slot.downcast_mut::<T>() {
            Some(value) => value,
            None => unreachable!("scratch slot keyed by TypeId holds another type"),
        }
    }

    /// Read-only view of a scratch entry, if one was created.
    pub fn scratch_ref<T: 'static>(&self) -> Option<&T> {
        self.scratch.get(&TypeId::of::<T>())?.downcast_ref::<T>()
    }
}

impl fmt::Debug for FileContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileContext")
            .field("namespace", &self.namespace)
            .field("path", &self.path)
            .field("imports", &self.imports)
            .field("scratch_entries", &self.scratch.len())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn import_state_records_and_queries() {
        let mut state = ImportState::new();
        assert!(state.is_empty());
        state.record("django.db", ["models"]);
        state.record("django.db", vec!["connection".to_string()]);
        assert!(state.contains("django.db", "models"));
        assert!(state.contains("django.db", "connection"));
        assert!(!state.contains("django.db.models", "models"));
        assert_eq!(
            state.names("django.db").collect::<Vec<_>>(),
            vec!["connection", "models"]
        );
        assert_eq!(state.names("os").count(), 0);
    }

    #[test]
    fn namespace_membership() {
        let ctx = FileContext::new("django", None);
        assert!(ctx.in_namespace("django"));
        assert!(ctx.in_namespace("django.utils.encoding"));
        assert!(!ctx.in_namespace("djangorestframework"));
        assert!(!ctx.in_namespace("os.path"));
    }

    #[test]
    fn framework_modules_follow_the_namespace() {
        let ctx = FileContext::new("vendor.django", None);
        assert_eq!(ctx.framework_module("db"), "vendor.django.db");
        assert_eq!(ctx.framework_module(""), "vendor.django");
        assert!(ctx.in_namespace(&ctx.framework_module("utils.encoding")));
    }

    #[test]
    fn file_name_from_path() {
        let ctx = FileContext::new("django", Some(Path::new("app/polls/__init__.py")));
        assert_eq!(ctx.file_name(), Some("__init__.py"));
        assert_eq!(FileContext::new("django", None).file_name(), None);
    }

    #[test]
    fn scratch_is_typed_and_persistent() {
        #[derive(Default)]
        struct Seen(Vec<u32>);
        #[derive(Default)]
        struct Count(usize);

        let mut ctx = FileContext::new("django", None);
        assert!(ctx.scratch_ref::<Seen>().is_none());
        ctx.scratch::<Seen>().0.push(7);
        ctx.scratch::<Count>().0 += 2;
        ctx.scratch::<Seen>().0.push(9);
        assert_eq!(ctx.scratch_ref::<Seen>().map(|s| s.0.clone()), Some(vec![7, 9]));
        assert_eq!(ctx.scratch_ref::<Count>().map(|c| c.0), Some(2));
    }
}
