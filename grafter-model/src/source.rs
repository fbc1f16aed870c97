//! TOML front-end for declaration documents.
//!
//! A document is a TOML file describing the declaration tree:
//!
//! ```toml
//! aliases = ["LegacyCore"]
//! imports = ["System", "System.Linq"]
//!
//! [directives]
//! DuplicateWithSuffix = { module = "dup_generators", generator = "duplicate_with_suffix" }
//!
//! [[members]]
//! decl = "namespace"
//! name = "Testing"
//!
//! [[members.members]]
//! decl = "type"
//! kind = "record"
//! name = "Foo"
//! modifiers = ["public", "partial"]
//!
//! [[members.members.annotations]]
//! name = "DuplicateWithSuffix"
//! args = ["A"]
//! ```

use std::path::Path;

use crate::decl::Declaration;
use crate::document::Document;
use crate::error::{Error, Result};

impl Document {
    /// Read and parse a document from disk. The document's `path` is set to
    /// the given path.
    pub fn open(path: &Path) -> Result<Document> {
        let src = std::fs::read_to_string(path).map_err(|source| {
            Box::new(Error::Io {
                path: path.to_path_buf(),
                source,
            })
        })?;
        Self::from_source(&src, path)
    }

    /// Parse a document from source text, recording `path` as its identity.
    pub fn from_source(src: &str, path: impl AsRef<Path>) -> Result<Document> {
        let path = path.as_ref();
        let filename = path.display().to_string();

        let mut document: Document =
            toml::from_str(src).map_err(|source| Error::parse(source, src, &filename))?;
        document.path = path.to_path_buf();

        validate(&document, src, &filename)?;
        Ok(document)
    }

    /// Serialize the document back to its TOML form.
    ///
    /// Serialization is deterministic for a given tree, which is what makes
    /// written outputs byte-stable across runs.
    pub fn to_toml(&self) -> String {
        toml::to_string(self).expect("document serialization is infallible")
    }
}

fn validate(document: &Document, src: &str, filename: &str) -> Result<()> {
    for (name, binding) in &document.directives {
        if !is_identifier(name) {
            return Err(Error::invalid_identifier(name, "directive", src, filename));
        }
        if binding.module.trim().is_empty() {
            return Err(Error::validation(
                format!("directive '{name}' has an empty module name"),
                src,
                filename,
            ));
        }
        if binding.generator.trim().is_empty() {
            return Err(Error::validation(
                format!("directive '{name}' has an empty generator name"),
                src,
                filename,
            ));
        }
    }

    for member in &document.members {
        validate_declaration(member, src, filename)?;
    }
    Ok(())
}

fn validate_declaration(decl: &Declaration, src: &str, filename: &str) -> Result<()> {
    match decl {
        Declaration::Namespace(ns) => {
            if !is_namespace_name(&ns.name) {
                return Err(Error::invalid_identifier(&ns.name, "namespace", src, filename));
            }
            for member in &ns.members {
                validate_declaration(member, src, filename)?;
            }
        }
        Declaration::Type(ty) => {
            if !is_identifier(&ty.name) {
                return Err(Error::invalid_identifier(&ty.name, ty.kind.as_str(), src, filename));
            }
            for member in &ty.members {
                validate_declaration(member, src, filename)?;
            }
        }
        Declaration::Member(member) => {
            if !is_identifier(&member.name) {
                return Err(Error::invalid_identifier(
                    &member.name,
                    member.kind.as_str(),
                    src,
                    filename,
                ));
            }
        }
    }
    Ok(())
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_')
}

fn is_namespace_name(name: &str) -> bool {
    !name.is_empty() && name.split('.').all(is_identifier)
}

#[cfg(test)]
mod tests {
    use crate::decl::{DeclKind, Modifier};
    use crate::document::Document;

    fn parse(src: &str) -> Document {
        Document::from_source(src, "/project/test.toml").expect("document should parse")
    }

    #[test]
    fn test_empty_document() {
        let doc = parse("");
        assert!(doc.is_empty());
        assert!(doc.imports.is_empty());
    }

    #[test]
    fn test_prologue_only() {
        let doc = parse(
            r#"
            aliases = ["Legacy"]
            imports = ["System", "System.Linq"]
            "#,
        );
        assert_eq!(doc.aliases[0].name, "Legacy");
        assert_eq!(doc.imports.len(), 2);
        assert!(doc.is_empty());
    }

    #[test]
    fn test_nested_tree() {
        let doc = parse(
            r#"
            [[members]]
            decl = "namespace"
            name = "Testing.Middle"
            imports = ["System.Linq"]

            [[members.members]]
            decl = "type"
            kind = "record"
            name = "Foo"
            modifiers = ["public", "partial"]
            type_params = ["T"]

            [[members.members.annotations]]
            name = "DuplicateWithSuffix"
            args = ["A"]
            "#,
        );

        let ns = &doc.members[0];
        assert_eq!(ns.kind(), DeclKind::Namespace);
        assert_eq!(ns.name(), "Testing.Middle");

        let ty = &ns.members()[0];
        assert_eq!(ty.kind(), DeclKind::Record);
        assert_eq!(ty.annotations()[0].string_arg(0), Some("A"));
        match ty {
            crate::decl::Declaration::Type(ty) => {
                assert_eq!(ty.modifiers, vec![Modifier::Public, Modifier::Partial]);
                assert_eq!(ty.type_params[0].name, "T");
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_directives_table() {
        let doc = parse(
            r#"
            [directives]
            Dup = { module = "dup_generators", generator = "duplicate_with_suffix" }
            "#,
        );
        assert_eq!(doc.directives["Dup"].module, "dup_generators");
    }

    #[test]
    fn test_parse_error_has_span() {
        let err = Document::from_source("members = 3", "/project/bad.toml")
            .expect_err("parse should fail");
        assert!(matches!(*err, crate::error::Error::Parse { .. }));
    }

    #[test]
    fn test_invalid_identifier_rejected() {
        let err = Document::from_source(
            r#"
            [[members]]
            decl = "type"
            kind = "record"
            name = "1Bad"
            "#,
            "/project/bad.toml",
        )
        .expect_err("validation should fail");
        assert!(matches!(*err, crate::error::Error::InvalidIdentifier { .. }));
    }

    #[test]
    fn test_empty_directive_module_rejected() {
        let err = Document::from_source(
            r#"
            [directives]
            Dup = { module = "", generator = "g" }
            "#,
            "/project/bad.toml",
        )
        .expect_err("validation should fail");
        assert!(matches!(*err, crate::error::Error::Validation { .. }));
    }

    #[test]
    fn test_open_reads_from_disk() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("widgets.toml");
        std::fs::write(&path, "imports = [\"System\"]").unwrap();

        let doc = Document::open(&path).expect("document should open");
        assert_eq!(doc.path, path);
        assert_eq!(doc.imports.len(), 1);

        let err = Document::open(&temp.path().join("absent.toml"))
            .expect_err("missing file should fail");
        assert!(matches!(*err, crate::error::Error::Io { .. }));
    }

    #[test]
    fn test_toml_round_trip() {
        let src = r#"
            imports = ["System"]

            [[members]]
            decl = "namespace"
            name = "Testing"

            [[members.members]]
            decl = "type"
            kind = "struct"
            name = "Inner"
            "#;
        let doc = parse(src);
        let rewritten = Document::from_source(&doc.to_toml(), "/project/test.toml")
            .expect("serialized form should re-parse");
        assert_eq!(doc, rewritten);
    }
}
