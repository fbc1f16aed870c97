//! The generator contract.

use eyre::Result;
use grafter_model::{Annotation, Declaration, ExternAlias, Import};

use crate::context::GenerationContext;
use crate::diagnostic::DiagnosticSink;

/// A code generator constructed from one directive occurrence.
///
/// Generators expose a single operation. The engine invokes entries for a
/// document strictly sequentially, so a generator observes every import and
/// alias queued by the generators that ran before it.
pub trait Generator {
    /// Produce declarations for the processing node in `ctx`.
    ///
    /// # Errors
    ///
    /// An error aborts generation for the whole document (and only this
    /// document); it is reported with a zero-length span anchored at the
    /// start of the document.
    fn generate(&self, ctx: &GenerationContext<'_>, diagnostics: &dyn DiagnosticSink)
    -> Result<Generated>;
}

/// Constructs generator instances from a directive's annotation arguments.
///
/// A fresh instance is constructed per directive occurrence, since the
/// arguments vary between occurrences even of the same generator type.
pub trait GeneratorFactory: Send + Sync {
    /// Construct a generator from the annotation that invoked it.
    fn create(&self, directive: &Annotation) -> Result<Box<dyn Generator>>;
}

/// The output of one generator invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum Generated {
    /// Simple contract: a flat member list, merged into the mirror of the
    /// container the originating declaration lives in.
    Members(Vec<Declaration>),
    /// Rich contract: separate buckets, appended independently at document
    /// scope.
    Rich(RichGenerated),
}

impl Generated {
    /// An empty simple result.
    pub fn none() -> Self {
        Generated::Members(Vec::new())
    }

    /// True if the result carries nothing at all.
    pub fn is_empty(&self) -> bool {
        match self {
            Generated::Members(members) => members.is_empty(),
            Generated::Rich(rich) => rich.is_empty(),
        }
    }
}

/// A rich generation result.
///
/// Buckets are appended to the output document in a fixed order (imports,
/// then aliases, then annotation lists, then members), independently of one
/// another. Members land at compilation-unit level, so a namespace member
/// redirects generated declarations into a different namespace container
/// than the one the directive was found in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RichGenerated {
    pub imports: Vec<Import>,
    pub aliases: Vec<ExternAlias>,
    pub annotations: Vec<Annotation>,
    pub members: Vec<Declaration>,
}

impl RichGenerated {
    /// Create an empty result.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an import directive.
    pub fn add_import(mut self, path: impl Into<String>) -> Self {
        self.imports.push(Import::new(path));
        self
    }

    /// Queue an extern alias.
    pub fn add_alias(mut self, name: impl Into<String>) -> Self {
        self.aliases.push(ExternAlias::new(name));
        self
    }

    /// Queue a document-level annotation.
    pub fn add_annotation(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    /// Queue a compilation-unit-level member.
    pub fn add_member(mut self, member: impl Into<Declaration>) -> Self {
        self.members.push(member.into());
        self
    }

    /// True if every bucket is empty.
    pub fn is_empty(&self) -> bool {
        self.imports.is_empty()
            && self.aliases.is_empty()
            && self.annotations.is_empty()
            && self.members.is_empty()
    }
}

impl From<RichGenerated> for Generated {
    fn from(rich: RichGenerated) -> Self {
        Generated::Rich(rich)
    }
}

#[cfg(test)]
mod tests {
    use grafter_model::TypeDecl;

    use super::*;

    #[test]
    fn test_generated_is_empty() {
        assert!(Generated::none().is_empty());
        assert!(Generated::Rich(RichGenerated::new()).is_empty());
        assert!(!Generated::Members(vec![TypeDecl::record("Foo").into()]).is_empty());
        assert!(!Generated::from(RichGenerated::new().add_import("System")).is_empty());
    }

    #[test]
    fn test_rich_builder_buckets() {
        let rich = RichGenerated::new()
            .add_import("System")
            .add_alias("Legacy")
            .add_annotation(Annotation::new("Marker"))
            .add_member(TypeDecl::record("Foo"));

        assert_eq!(rich.imports.len(), 1);
        assert_eq!(rich.aliases.len(), 1);
        assert_eq!(rich.annotations.len(), 1);
        assert_eq!(rich.members.len(), 1);
    }
}
