//! Compilation-wide semantic services.
//!
//! The engine never owns a language front-end; it consumes the narrow
//! read-only queries defined here. The semantic model is built once per
//! generation pass from every parsed input document and answers one
//! question: which generator, if any, does an annotation name.

use std::path::PathBuf;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::annotation::Annotation;
use crate::document::Document;

/// Binding from an annotation name to a generator module and type.
///
/// Declared in document `[directives]` tables, e.g.:
///
/// ```toml
/// [directives]
/// DuplicateWithSuffix = { module = "dup_generators", generator = "duplicate_with_suffix" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectiveBinding {
    /// Logical name of the generator module to load.
    pub module: String,
    /// Generator type within the module.
    pub generator: String,
}

/// A resolved generator directive: the logical identity of the generator
/// plus the annotation occurrence that invoked it (whose arguments become
/// the generator's construction arguments).
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorDescriptor {
    pub module: String,
    pub generator: String,
    pub annotation: Annotation,
}

/// Compilation-wide reference metadata made available to generators.
#[derive(Debug, Clone, Default)]
pub struct CompilationInfo {
    /// Paths of reference assets supplied to the pass.
    pub reference_paths: Vec<PathBuf>,
    /// Paths of every input document in the compilation.
    pub input_paths: Vec<PathBuf>,
}

/// Annotation-to-generator resolution across a whole compilation.
///
/// Binding names are case-insensitive; the first binding seen for a name
/// wins, so re-declaring a directive in a later document is inert.
#[derive(Debug, Clone, Default)]
pub struct SemanticModel {
    bindings: IndexMap<String, DirectiveBinding>,
}

impl SemanticModel {
    /// Create an empty model.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a model from every document in the compilation.
    pub fn from_documents<'a>(documents: impl IntoIterator<Item = &'a Document>) -> Self {
        let mut model = Self::new();
        for document in documents {
            for (name, binding) in &document.directives {
                model.bind(name, binding.clone());
            }
        }
        model
    }

    /// Bind an annotation name to a generator. First binding wins.
    pub fn bind(&mut self, name: &str, binding: DirectiveBinding) {
        self.bindings
            .entry(name.to_ascii_lowercase())
            .or_insert(binding);
    }

    /// True if the annotation name is bound to a generator.
    pub fn is_directive(&self, name: &str) -> bool {
        self.bindings.contains_key(&name.to_ascii_lowercase())
    }

    /// Resolve an annotation occurrence to a generator descriptor.
    pub fn directive_for(&self, annotation: &Annotation) -> Option<GeneratorDescriptor> {
        let binding = self.bindings.get(&annotation.name.to_ascii_lowercase())?;
        Some(GeneratorDescriptor {
            module: binding.module.clone(),
            generator: binding.generator.clone(),
            annotation: annotation.clone(),
        })
    }

    /// Number of bound directives.
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// True if no directives are bound.
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

/// The enclosing semantic scope of a processing node: the namespace chain
/// and container-type chain from the document root down to (but excluding)
/// the node itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SemanticScope {
    /// Flattened namespace segments, outermost first. Dotted namespace
    /// names contribute one segment per dot-separated part.
    pub namespace: Vec<String>,
    /// Names of enclosing type containers, outermost first.
    pub containers: Vec<String>,
}

impl SemanticScope {
    /// Push a (possibly dotted) namespace name onto the scope.
    pub fn push_namespace(&mut self, name: &str) {
        self.namespace
            .extend(name.split('.').map(|part| part.to_string()));
    }

    /// Push an enclosing container type name onto the scope.
    pub fn push_container(&mut self, name: &str) {
        self.containers.push(name.to_string());
    }

    /// The fully-qualified name a declaration named `name` has in this
    /// scope.
    pub fn qualified_name(&self, name: &str) -> String {
        self.namespace
            .iter()
            .map(String::as_str)
            .chain(self.containers.iter().map(String::as_str))
            .chain(std::iter::once(name))
            .collect::<Vec<_>>()
            .join(".")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn binding(module: &str) -> DirectiveBinding {
        DirectiveBinding {
            module: module.to_string(),
            generator: "gen".to_string(),
        }
    }

    #[test]
    fn test_binding_is_case_insensitive() {
        let mut model = SemanticModel::new();
        model.bind("DuplicateWithSuffix", binding("dup"));

        assert!(model.is_directive("duplicatewithsuffix"));
        assert!(model.is_directive("DUPLICATEWITHSUFFIX"));
        assert!(!model.is_directive("Other"));
    }

    #[test]
    fn test_first_binding_wins() {
        let mut model = SemanticModel::new();
        model.bind("Dup", binding("first"));
        model.bind("dup", binding("second"));

        let descriptor = model
            .directive_for(&Annotation::new("Dup"))
            .expect("directive should resolve");
        assert_eq!(descriptor.module, "first");
    }

    #[test]
    fn test_descriptor_carries_annotation_args() {
        let mut model = SemanticModel::new();
        model.bind("Dup", binding("dup"));

        let descriptor = model
            .directive_for(&Annotation::new("Dup").arg("A"))
            .expect("directive should resolve");
        assert_eq!(descriptor.annotation.string_arg(0), Some("A"));
    }

    #[test]
    fn test_qualified_name() {
        let mut scope = SemanticScope::default();
        scope.push_namespace("Testing.Middle");
        scope.push_namespace("Inner");
        scope.push_container("OuterClass");

        assert_eq!(
            scope.qualified_name("NestedType"),
            "Testing.Middle.Inner.OuterClass.NestedType"
        );
    }
}
