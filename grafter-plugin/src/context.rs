//! Generation context handed to generator invocations.

use std::path::Path;

use grafter_model::{CompilationInfo, Declaration, ExternAlias, Import, SemanticScope};
use indexmap::IndexMap;

/// All the inputs and context necessary to perform one generation.
///
/// Built per directive occurrence, immutable once built, owned exclusively
/// by the invocation that created it, and discarded after the generator
/// call returns.
#[derive(Debug)]
pub struct GenerationContext<'a> {
    /// The declaration node the generator directive is found on.
    pub node: &'a Declaration,
    /// The semantic scope enclosing the processing node.
    pub scope: SemanticScope,
    /// Compilation-wide reference metadata.
    pub compilation: &'a CompilationInfo,
    /// The absolute path of the directory where the project file is located.
    pub project_dir: &'a Path,
    /// Build properties supplied by the driving build tool.
    pub properties: &'a IndexMap<String, String>,
    /// Imports already queued to be generated for this document.
    pub queued_imports: &'a [Import],
    /// Extern aliases already queued to be generated for this document.
    pub queued_aliases: &'a [ExternAlias],
}

impl GenerationContext<'_> {
    /// Look up a build property.
    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    /// True if an import of the given path is already queued. Generators
    /// can use this to avoid piling up duplicates; the engine itself never
    /// de-duplicates.
    pub fn has_queued_import(&self, path: &str) -> bool {
        self.queued_imports.iter().any(|import| import.path == path)
    }

    /// True if an extern alias of the given name is already queued.
    pub fn has_queued_alias(&self, name: &str) -> bool {
        self.queued_aliases.iter().any(|alias| alias.name == name)
    }

    /// The fully-qualified name of the processing node.
    pub fn qualified_name(&self) -> String {
        self.scope.qualified_name(self.node.name())
    }
}
