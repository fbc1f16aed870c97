//! Directive scanning and target-kind dispatch.
//!
//! The scanner walks a document's declaration tree depth-first and emits
//! one entry per generator-directive occurrence, in source order. A
//! declaration carrying two directives yields two entries against the same
//! node.

use grafter_model::{
    DeclKind, Declaration, Document, GeneratorDescriptor, NamespaceDecl, SemanticModel,
    SemanticScope, TypeDecl,
};
use grafter_plugin::{Diagnostic, DiagnosticSink};

/// The set of declaration shapes accepted as generation targets.
///
/// Directives on shapes outside the set are flagged with a warning and
/// generate nothing, rather than silently disappearing.
#[derive(Debug, Clone)]
pub struct TargetKinds {
    kinds: Vec<DeclKind>,
}

impl TargetKinds {
    /// Accept the given shapes.
    pub fn new(kinds: impl IntoIterator<Item = DeclKind>) -> Self {
        Self {
            kinds: kinds.into_iter().collect(),
        }
    }

    /// Accept only record- and struct-like containers.
    pub fn containers_only() -> Self {
        Self::new([DeclKind::Record, DeclKind::Struct])
    }

    /// True if the shape is an accepted generation target.
    pub fn allows(&self, kind: DeclKind) -> bool {
        self.kinds.contains(&kind)
    }
}

impl Default for TargetKinds {
    /// Containers plus leaf members; namespaces are never targets.
    fn default() -> Self {
        Self::new([
            DeclKind::Record,
            DeclKind::Struct,
            DeclKind::Function,
            DeclKind::Field,
        ])
    }
}

/// One container on the path from the document root to a processing node.
#[derive(Debug, Clone, Copy)]
pub enum AncestorLink<'a> {
    Namespace(&'a NamespaceDecl),
    Type(&'a TypeDecl),
}

/// A directive occurrence found by the scanner.
#[derive(Debug)]
pub struct ScanEntry<'a> {
    /// The declaration the directive is attached to.
    pub declaration: &'a Declaration,
    /// Containers enclosing the declaration, outermost first. The
    /// declaration itself is not part of the chain.
    pub chain: Vec<AncestorLink<'a>>,
    /// The resolved generator identity plus the annotation occurrence.
    pub descriptor: GeneratorDescriptor,
}

impl ScanEntry<'_> {
    /// The semantic scope enclosing this entry's declaration.
    pub fn scope(&self) -> SemanticScope {
        let mut scope = SemanticScope::default();
        for link in &self.chain {
            match link {
                AncestorLink::Namespace(ns) => scope.push_namespace(&ns.name),
                AncestorLink::Type(ty) => scope.push_container(&ty.name),
            }
        }
        scope
    }
}

/// Scan a document for generator-directive occurrences, in source order.
pub fn scan<'a>(
    document: &'a Document,
    model: &SemanticModel,
    targets: &TargetKinds,
    sink: &dyn DiagnosticSink,
) -> Vec<ScanEntry<'a>> {
    let mut entries = Vec::new();
    let mut chain = Vec::new();
    for member in &document.members {
        walk(document, member, &mut chain, model, targets, sink, &mut entries);
    }
    entries
}

fn walk<'a>(
    document: &'a Document,
    declaration: &'a Declaration,
    chain: &mut Vec<AncestorLink<'a>>,
    model: &SemanticModel,
    targets: &TargetKinds,
    sink: &dyn DiagnosticSink,
    entries: &mut Vec<ScanEntry<'a>>,
) {
    for annotation in declaration.annotations() {
        let Some(descriptor) = model.directive_for(annotation) else {
            continue;
        };
        if targets.allows(declaration.kind()) {
            entries.push(ScanEntry {
                declaration,
                chain: chain.clone(),
                descriptor,
            });
        } else {
            sink.report(
                Diagnostic::warning(format!(
                    "declaration '{}' is a {}, which is not a configured generation target; \
                     directive [{}] ignored",
                    declaration.name(),
                    declaration.kind(),
                    annotation.name,
                ))
                .at_document_start(&document.path),
            );
        }
    }

    match declaration {
        Declaration::Namespace(ns) => {
            chain.push(AncestorLink::Namespace(ns));
            for member in &ns.members {
                walk(document, member, chain, model, targets, sink, entries);
            }
            chain.pop();
        }
        Declaration::Type(ty) => {
            chain.push(AncestorLink::Type(ty));
            for member in &ty.members {
                walk(document, member, chain, model, targets, sink, entries);
            }
            chain.pop();
        }
        Declaration::Member(_) => {}
    }
}
