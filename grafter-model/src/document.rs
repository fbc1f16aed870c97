//! Parsed declaration documents.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::annotation::Annotation;
use crate::decl::{Declaration, TypeDecl};
use crate::semantic::DirectiveBinding;

/// An import directive in a document or namespace prologue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Import {
    pub path: String,
}

impl Import {
    /// Create an import of the given path.
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

/// An extern-alias directive in a document prologue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExternAlias {
    pub name: String,
}

impl ExternAlias {
    /// Create an alias of the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// A parsed declaration document.
///
/// Documents are read once per generation pass and never mutated; the
/// synthesized output of a pass is a fresh `Document` carrying only the
/// prologue and the generated member tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Absolute path of the source file. Assigned by the front-end, not
    /// present in the serialized form.
    #[serde(skip)]
    pub path: PathBuf,
    /// Extern aliases, before any import.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<ExternAlias>,
    /// Document-level imports.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub imports: Vec<Import>,
    /// Document-level annotation lists. Inputs rarely carry these; rich
    /// generator results append to them in the output.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<Annotation>,
    /// Directive bindings declared by this document (annotation name to
    /// generator module/type). Merged compilation-wide by the semantic
    /// model.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub directives: IndexMap<String, DirectiveBinding>,
    /// Top-level declarations.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub members: Vec<Declaration>,
}

impl Document {
    /// Create an empty document for the given path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// The source path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// True if the document declares no members at all.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// True if no type declaration exists anywhere in the tree. Outputs for
    /// which this holds are classified as "empty generated files".
    pub fn has_no_types(&self) -> bool {
        fn contains_type(decls: &[Declaration]) -> bool {
            decls.iter().any(|decl| match decl {
                Declaration::Type(_) => true,
                Declaration::Namespace(ns) => contains_type(&ns.members),
                Declaration::Member(_) => false,
            })
        }
        !contains_type(&self.members)
    }

    /// Iterate over every type declaration in the tree, depth-first.
    pub fn types(&self) -> impl Iterator<Item = &TypeDecl> {
        fn walk<'a>(decls: &'a [Declaration], out: &mut Vec<&'a TypeDecl>) {
            for decl in decls {
                match decl {
                    Declaration::Type(ty) => {
                        out.push(ty);
                        walk(&ty.members, out);
                    }
                    Declaration::Namespace(ns) => walk(&ns.members, out),
                    Declaration::Member(_) => {}
                }
            }
        }
        let mut out = Vec::new();
        walk(&self.members, &mut out);
        out.into_iter()
    }
}
