//! Canonical text rendering for declaration documents.
//!
//! The rendered form is deterministic: one fixed layout for a given tree,
//! independent of how the tree was produced. Golden tests compare rendered
//! documents, and the CLI prints them for `--dry-run` previews.

use crate::annotation::Annotation;
use crate::decl::{Declaration, MemberDecl, NamespaceDecl, TypeDecl, TypeParam};
use crate::document::Document;

/// Indentation style for rendered documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Indent {
    /// Spaces with the specified width.
    Spaces(u8),
    /// Tab character.
    Tab,
}

impl Indent {
    /// Convert to the string representation for one indent level.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Spaces(2) => "  ",
            Self::Spaces(4) => "    ",
            // Fallback to 4 whitespaces
            Self::Spaces(_) => "    ",
            Self::Tab => "\t",
        }
    }
}

impl Default for Indent {
    fn default() -> Self {
        Self::Spaces(4)
    }
}

/// Renders documents into their canonical text form.
#[derive(Debug, Default)]
pub struct Renderer {
    indent: Indent,
}

impl Renderer {
    /// Create a renderer with 4-space indentation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a renderer with the given indentation style.
    pub fn with_indent(indent: Indent) -> Self {
        Self { indent }
    }

    /// Render a whole document.
    pub fn render(&self, document: &Document) -> String {
        let mut out = Writer::new(self.indent);

        if !document.aliases.is_empty() {
            for alias in &document.aliases {
                out.line(&format!("extern alias {};", alias.name));
            }
            out.blank();
        }

        if !document.imports.is_empty() {
            for import in &document.imports {
                out.line(&format!("use {};", import.path));
            }
            out.blank();
        }

        for annotation in &document.annotations {
            out.line(&render_annotation(annotation));
        }

        for (index, member) in document.members.iter().enumerate() {
            if index > 0 {
                out.blank();
            }
            self.render_declaration(member, &mut out);
        }

        out.finish()
    }

    /// Render a single declaration subtree.
    pub fn render_declaration_to_string(&self, declaration: &Declaration) -> String {
        let mut out = Writer::new(self.indent);
        self.render_declaration(declaration, &mut out);
        out.finish()
    }

    fn render_declaration(&self, declaration: &Declaration, out: &mut Writer) {
        match declaration {
            Declaration::Namespace(ns) => self.render_namespace(ns, out),
            Declaration::Type(ty) => self.render_type(ty, out),
            Declaration::Member(member) => render_member(member, out),
        }
    }

    fn render_namespace(&self, ns: &NamespaceDecl, out: &mut Writer) {
        out.line(&format!("namespace {} {{", ns.name));
        out.indent();

        if !ns.imports.is_empty() {
            for import in &ns.imports {
                out.line(&format!("use {};", import.path));
            }
            if !ns.members.is_empty() {
                out.blank();
            }
        }

        for member in &ns.members {
            self.render_declaration(member, out);
        }

        out.dedent();
        out.line("}");
    }

    fn render_type(&self, ty: &TypeDecl, out: &mut Writer) {
        for annotation in &ty.annotations {
            out.line(&render_annotation(annotation));
        }

        let mut header = String::new();
        for modifier in &ty.modifiers {
            header.push_str(modifier.as_str());
            header.push(' ');
        }
        header.push_str(ty.kind.as_str());
        header.push(' ');
        header.push_str(&ty.name);
        header.push_str(&render_type_params(&ty.type_params));
        header.push_str(" {");
        out.line(&header);

        out.indent();
        for member in &ty.members {
            self.render_declaration(member, out);
        }
        out.dedent();
        out.line("}");
    }
}

fn render_member(member: &MemberDecl, out: &mut Writer) {
    for annotation in &member.annotations {
        out.line(&render_annotation(annotation));
    }

    let mut line = String::new();
    for modifier in &member.modifiers {
        line.push_str(modifier.as_str());
        line.push(' ');
    }
    line.push_str(member.kind.as_str());
    line.push(' ');
    line.push_str(&member.name);
    match member.kind {
        crate::decl::MemberKind::Function => {
            line.push_str("()");
            if let Some(ty) = &member.ty {
                line.push_str(" -> ");
                line.push_str(ty);
            }
        }
        crate::decl::MemberKind::Field => {
            if let Some(ty) = &member.ty {
                line.push_str(": ");
                line.push_str(ty);
            }
        }
    }
    line.push(';');
    out.line(&line);
}

fn render_type_params(params: &[TypeParam]) -> String {
    if params.is_empty() {
        return String::new();
    }
    let inner = params
        .iter()
        .map(|param| match &param.constraint {
            Some(constraint) => format!("{}: {}", param.name, constraint),
            None => param.name.clone(),
        })
        .collect::<Vec<_>>()
        .join(", ");
    format!("<{}>", inner)
}

fn render_annotation(annotation: &Annotation) -> String {
    let mut args = Vec::new();
    for value in &annotation.args {
        args.push(value.to_string());
    }
    for (name, value) in &annotation.named {
        args.push(format!("{} = {}", name, value));
    }
    if args.is_empty() {
        format!("@[{}]", annotation.name)
    } else {
        format!("@[{}({})]", annotation.name, args.join(", "))
    }
}

/// Line buffer with indentation tracking.
struct Writer {
    out: String,
    indent: Indent,
    level: usize,
}

impl Writer {
    fn new(indent: Indent) -> Self {
        Self {
            out: String::new(),
            indent,
            level: 0,
        }
    }

    fn line(&mut self, text: &str) {
        for _ in 0..self.level {
            self.out.push_str(self.indent.as_str());
        }
        self.out.push_str(text);
        self.out.push('\n');
    }

    fn blank(&mut self) {
        self.out.push('\n');
    }

    fn indent(&mut self) {
        self.level += 1;
    }

    fn dedent(&mut self) {
        self.level = self.level.saturating_sub(1);
    }

    fn finish(self) -> String {
        self.out
    }
}
