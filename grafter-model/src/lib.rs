//! Declaration-tree model for the grafter engine.
//!
//! This crate defines the language-neutral declaration documents the engine
//! transforms, the TOML front-end that parses them, the compilation-wide
//! semantic model used to resolve generator directives, and a canonical text
//! renderer for previews and golden comparisons.
//!
//! # Module Organization
//!
//! - [`decl`] - Declaration tree nodes (namespaces, types, members)
//! - [`annotation`] - Annotations and their argument payloads
//! - [`document`] - Parsed documents and their prologue (aliases, imports)
//! - [`semantic`] - Directive bindings, scopes, and compilation metadata
//! - `source` - TOML front-end (`Document::open` / `Document::from_source`)
//! - [`render`] - Canonical text rendering

pub mod annotation;
pub mod decl;
pub mod document;
pub mod error;
pub mod render;
pub mod semantic;
mod source;

pub use annotation::{Annotation, AnnotationValue};
pub use decl::{
    DeclKind, Declaration, MemberDecl, MemberKind, Modifier, NamespaceDecl, TypeDecl, TypeKind,
    TypeParam,
};
pub use document::{Document, ExternAlias, Import};
pub use error::{Error, Result};
pub use render::{Indent, Renderer};
pub use semantic::{
    CompilationInfo, DirectiveBinding, GeneratorDescriptor, SemanticModel, SemanticScope,
};
