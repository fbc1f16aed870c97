//! Declaration tree nodes.

use serde::{Deserialize, Serialize};

use crate::annotation::Annotation;
use crate::document::Import;

/// Kind of a type-level container declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeKind {
    /// Record-like container (reference semantics).
    Record,
    /// Struct-like container (value semantics).
    Struct,
}

impl TypeKind {
    /// Get the lowercase keyword for this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            TypeKind::Record => "record",
            TypeKind::Struct => "struct",
        }
    }
}

/// Kind of a leaf member declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberKind {
    /// A callable member.
    Function,
    /// A data member.
    Field,
}

impl MemberKind {
    /// Get the lowercase keyword for this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            MemberKind::Function => "function",
            MemberKind::Field => "field",
        }
    }
}

/// Declaration modifiers. The merger copies these verbatim onto mirrored
/// containers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Modifier {
    Public,
    Internal,
    Private,
    Static,
    Partial,
    Readonly,
}

impl Modifier {
    /// Get the lowercase keyword for this modifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            Modifier::Public => "public",
            Modifier::Internal => "internal",
            Modifier::Private => "private",
            Modifier::Static => "static",
            Modifier::Partial => "partial",
            Modifier::Readonly => "readonly",
        }
    }
}

/// A type parameter on a container declaration.
///
/// In documents a parameter may be written either as a bare string
/// (`type_params = ["T"]`) or as a table with a constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "TypeParamRepr")]
pub struct TypeParam {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraint: Option<String>,
}

impl TypeParam {
    /// Create an unconstrained type parameter.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            constraint: None,
        }
    }

    /// Create a constrained type parameter.
    pub fn constrained(name: impl Into<String>, constraint: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            constraint: Some(constraint.into()),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TypeParamRepr {
    Name(String),
    Full {
        name: String,
        #[serde(default)]
        constraint: Option<String>,
    },
}

impl From<TypeParamRepr> for TypeParam {
    fn from(repr: TypeParamRepr) -> Self {
        match repr {
            TypeParamRepr::Name(name) => TypeParam::new(name),
            TypeParamRepr::Full { name, constraint } => TypeParam { name, constraint },
        }
    }
}

/// The shape of a declaration, used for target-kind dispatch and
/// diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeclKind {
    Namespace,
    Record,
    Struct,
    Function,
    Field,
}

impl DeclKind {
    /// Get the lowercase keyword for this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            DeclKind::Namespace => "namespace",
            DeclKind::Record => "record",
            DeclKind::Struct => "struct",
            DeclKind::Function => "function",
            DeclKind::Field => "field",
        }
    }
}

impl std::fmt::Display for DeclKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A node in the declaration tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "decl", rename_all = "snake_case")]
pub enum Declaration {
    Namespace(NamespaceDecl),
    Type(TypeDecl),
    Member(MemberDecl),
}

impl Declaration {
    /// The declared name (dotted for namespaces).
    pub fn name(&self) -> &str {
        match self {
            Declaration::Namespace(ns) => &ns.name,
            Declaration::Type(ty) => &ty.name,
            Declaration::Member(member) => &member.name,
        }
    }

    /// The shape of this declaration.
    pub fn kind(&self) -> DeclKind {
        match self {
            Declaration::Namespace(_) => DeclKind::Namespace,
            Declaration::Type(ty) => match ty.kind {
                TypeKind::Record => DeclKind::Record,
                TypeKind::Struct => DeclKind::Struct,
            },
            Declaration::Member(member) => match member.kind {
                MemberKind::Function => DeclKind::Function,
                MemberKind::Field => DeclKind::Field,
            },
        }
    }

    /// Annotations attached to this declaration. Namespaces carry none.
    pub fn annotations(&self) -> &[Annotation] {
        match self {
            Declaration::Namespace(_) => &[],
            Declaration::Type(ty) => &ty.annotations,
            Declaration::Member(member) => &member.annotations,
        }
    }

    /// Child declarations, for containers.
    pub fn members(&self) -> &[Declaration] {
        match self {
            Declaration::Namespace(ns) => &ns.members,
            Declaration::Type(ty) => &ty.members,
            Declaration::Member(_) => &[],
        }
    }
}

/// A namespace container. The name may be dotted (`Testing.Middle`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamespaceDecl {
    pub name: String,
    /// Imports scoped to this namespace.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub imports: Vec<Import>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub members: Vec<Declaration>,
}

impl NamespaceDecl {
    /// Create an empty namespace.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            imports: Vec::new(),
            members: Vec::new(),
        }
    }

    /// Append a member declaration.
    pub fn member(mut self, member: impl Into<Declaration>) -> Self {
        self.members.push(member.into());
        self
    }

    /// Append a scoped import.
    pub fn import(mut self, path: impl Into<String>) -> Self {
        self.imports.push(Import::new(path));
        self
    }
}

impl From<NamespaceDecl> for Declaration {
    fn from(ns: NamespaceDecl) -> Self {
        Declaration::Namespace(ns)
    }
}

/// A record- or struct-like container declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeDecl {
    pub kind: TypeKind,
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub modifiers: Vec<Modifier>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub type_params: Vec<TypeParam>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<Annotation>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub members: Vec<Declaration>,
}

impl TypeDecl {
    /// Create an empty record declaration.
    pub fn record(name: impl Into<String>) -> Self {
        Self::new(TypeKind::Record, name)
    }

    /// Create an empty struct declaration.
    pub fn strukt(name: impl Into<String>) -> Self {
        Self::new(TypeKind::Struct, name)
    }

    /// Create an empty declaration of the given kind.
    pub fn new(kind: TypeKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            modifiers: Vec::new(),
            type_params: Vec::new(),
            annotations: Vec::new(),
            members: Vec::new(),
        }
    }

    /// Append a modifier.
    pub fn modifier(mut self, modifier: Modifier) -> Self {
        self.modifiers.push(modifier);
        self
    }

    /// Append a type parameter.
    pub fn type_param(mut self, param: TypeParam) -> Self {
        self.type_params.push(param);
        self
    }

    /// Append an annotation.
    pub fn annotation(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    /// Append a member declaration.
    pub fn member(mut self, member: impl Into<Declaration>) -> Self {
        self.members.push(member.into());
        self
    }
}

impl From<TypeDecl> for Declaration {
    fn from(ty: TypeDecl) -> Self {
        Declaration::Type(ty)
    }
}

/// A leaf member declaration (function or field).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberDecl {
    pub kind: MemberKind,
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub modifiers: Vec<Modifier>,
    /// Field type or function return type.
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub ty: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<Annotation>,
}

impl MemberDecl {
    /// Create a function member.
    pub fn function(name: impl Into<String>) -> Self {
        Self::new(MemberKind::Function, name)
    }

    /// Create a field member.
    pub fn field(name: impl Into<String>) -> Self {
        Self::new(MemberKind::Field, name)
    }

    /// Create a member of the given kind.
    pub fn new(kind: MemberKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            modifiers: Vec::new(),
            ty: None,
            annotations: Vec::new(),
        }
    }

    /// Set the type payload.
    pub fn typed(mut self, ty: impl Into<String>) -> Self {
        self.ty = Some(ty.into());
        self
    }

    /// Append a modifier.
    pub fn modifier(mut self, modifier: Modifier) -> Self {
        self.modifiers.push(modifier);
        self
    }

    /// Append an annotation.
    pub fn annotation(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }
}

impl From<MemberDecl> for Declaration {
    fn from(member: MemberDecl) -> Self {
        Declaration::Member(member)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declaration_kind() {
        let record = Declaration::from(TypeDecl::record("Foo"));
        let strukt = Declaration::from(TypeDecl::strukt("Bar"));
        let ns = Declaration::from(NamespaceDecl::new("Testing"));
        let func = Declaration::from(MemberDecl::function("run"));

        assert_eq!(record.kind(), DeclKind::Record);
        assert_eq!(strukt.kind(), DeclKind::Struct);
        assert_eq!(ns.kind(), DeclKind::Namespace);
        assert_eq!(func.kind(), DeclKind::Function);
    }

    #[test]
    fn test_builders_nest() {
        let tree = NamespaceDecl::new("Testing")
            .member(TypeDecl::record("Foo").modifier(Modifier::Partial).member(
                MemberDecl::field("counter").typed("int"),
            ));

        assert_eq!(tree.members.len(), 1);
        assert_eq!(tree.members[0].name(), "Foo");
        assert_eq!(tree.members[0].members()[0].name(), "counter");
    }

    #[test]
    fn test_type_param_repr() {
        let param = TypeParam::constrained("T", "Display");
        assert_eq!(param.name, "T");
        assert_eq!(param.constraint.as_deref(), Some("Display"));
    }
}
