//! Generator module resolution, loading, and caching.
//!
//! A [`PluginHost`] is scoped to one generation pass: it owns the module
//! cache and the consulted-asset list, so repeated or parallel passes in
//! one process never share state. Modules resolve by logical name, first
//! against host-registered builtins, then against the configured reference
//! paths, then against each plugin search directory in order.

use std::collections::HashMap;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use grafter_plugin::{ENGINE_VERSION, GeneratorFactory, MODULE_SYMBOL, ModuleDecl, ModuleRegistrar};
use libloading::{Library, Symbol};

use crate::error::ResolveError;

/// A loaded generator module.
///
/// Factories must drop before the library unloads, which the field order
/// guarantees.
pub struct ModuleHandle {
    name: String,
    factories: HashMap<String, Box<dyn GeneratorFactory>>,
    _library: Option<Library>,
}

impl ModuleHandle {
    /// The logical module name this handle was resolved under.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Look up a generator factory by type name, case-insensitively.
    pub fn factory(&self, generator: &str) -> Option<&dyn GeneratorFactory> {
        self.factories
            .get(&generator.to_ascii_lowercase())
            .map(Box::as_ref)
    }

    /// Names of the generators this module provides.
    pub fn generator_names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }
}

impl std::fmt::Debug for ModuleHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleHandle")
            .field("name", &self.name)
            .field("generators", &self.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[derive(Default)]
struct FactoryCollector(HashMap<String, Box<dyn GeneratorFactory>>);

impl ModuleRegistrar for FactoryCollector {
    fn register(&mut self, generator: &str, factory: Box<dyn GeneratorFactory>) {
        self.0.insert(generator.to_ascii_lowercase(), factory);
    }
}

/// Resolves and caches generator modules for the lifetime of one pass.
pub struct PluginHost {
    reference_paths: Vec<PathBuf>,
    search_paths: Vec<PathBuf>,
    modules: HashMap<String, Arc<ModuleHandle>>,
    consulted: Vec<PathBuf>,
}

impl PluginHost {
    /// Create a host over the given search spaces.
    pub fn new(
        reference_paths: impl IntoIterator<Item = PathBuf>,
        search_paths: impl IntoIterator<Item = PathBuf>,
    ) -> Self {
        Self {
            reference_paths: reference_paths.into_iter().collect(),
            search_paths: search_paths.into_iter().collect(),
            modules: HashMap::new(),
            consulted: Vec::new(),
        }
    }

    /// Register an in-process module under a logical name.
    ///
    /// Builtin modules take precedence over on-disk modules of the same
    /// name and consult no asset.
    pub fn register_builtin(&mut self, name: &str, register: impl FnOnce(&mut dyn ModuleRegistrar)) {
        let mut collector = FactoryCollector::default();
        register(&mut collector);
        self.modules.insert(
            name.to_ascii_lowercase(),
            Arc::new(ModuleHandle {
                name: name.to_string(),
                factories: collector.0,
                _library: None,
            }),
        );
    }

    /// Resolve a logical module name to a loaded handle.
    ///
    /// Names are cached case-insensitively for the lifetime of the host, so
    /// a module is located and loaded at most once per pass.
    pub fn resolve(&mut self, name: &str) -> Result<Arc<ModuleHandle>, ResolveError> {
        let key = name.to_ascii_lowercase();
        if let Some(handle) = self.modules.get(&key) {
            return Ok(Arc::clone(handle));
        }

        let path = self.locate(name).ok_or_else(|| ResolveError::NotFound {
            module: name.to_string(),
        })?;
        let handle = Arc::new(load_module(name, &path)?);

        self.consulted.push(path);
        self.modules.insert(key, Arc::clone(&handle));
        Ok(handle)
    }

    /// The plugin module paths consulted so far, in resolution order.
    pub fn consulted(&self) -> &[PathBuf] {
        &self.consulted
    }

    fn locate(&self, name: &str) -> Option<PathBuf> {
        let file_name = dylib_file_name(name);

        for reference in &self.reference_paths {
            if reference.file_name() == Some(OsStr::new(&file_name)) && reference.is_file() {
                return Some(reference.clone());
            }
        }

        for dir in &self.search_paths {
            let candidate = dir.join(&file_name);
            if candidate.is_file() {
                return Some(candidate);
            }
        }

        None
    }
}

impl std::fmt::Debug for PluginHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginHost")
            .field("reference_paths", &self.reference_paths)
            .field("search_paths", &self.search_paths)
            .field("cached", &self.modules.keys().collect::<Vec<_>>())
            .field("consulted", &self.consulted)
            .finish()
    }
}

/// Platform file name for a generator module's dynamic library.
pub fn dylib_file_name(name: &str) -> String {
    if cfg!(target_os = "windows") {
        format!("{name}.dll")
    } else if cfg!(target_os = "macos") {
        format!("lib{name}.dylib")
    } else {
        format!("lib{name}.so")
    }
}

fn load_module(name: &str, path: &Path) -> Result<ModuleHandle, ResolveError> {
    // SAFETY: loading executes the module's initializers; modules are
    // trusted build-time tooling supplied by the project being built.
    let library = unsafe { Library::new(path) }.map_err(|source| ResolveError::Load {
        path: path.to_path_buf(),
        source,
    })?;

    let decl: &ModuleDecl = unsafe {
        let symbol: Symbol<'_, *const ModuleDecl> =
            library
                .get(MODULE_SYMBOL)
                .map_err(|source| ResolveError::MissingDecl {
                    path: path.to_path_buf(),
                    source,
                })?;
        &**symbol
    };

    if decl.engine_version != ENGINE_VERSION {
        return Err(ResolveError::VersionMismatch {
            path: path.to_path_buf(),
            module_version: decl.engine_version.to_string(),
            host_version: ENGINE_VERSION.to_string(),
        });
    }

    let mut collector = FactoryCollector::default();
    (decl.register)(&mut collector);

    Ok(ModuleHandle {
        name: name.to_string(),
        factories: collector.0,
        _library: Some(library),
    })
}
