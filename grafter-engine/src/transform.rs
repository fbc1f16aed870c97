//! Generator invocation and result merging.
//!
//! One [`DocumentTransform`] turns an input document into its generated
//! counterpart: it invokes the generator behind every scanned directive,
//! strictly in source order, and reassembles the outputs into a single
//! tree that mirrors the input's nesting. Only containers on the path to
//! an annotated declaration (or created by a redirecting rich result)
//! appear in the output; everything else is dropped.

use indexmap::IndexMap;

use grafter_model::{
    CompilationInfo, Declaration, Document, Import, Modifier, NamespaceDecl, SemanticModel,
    TypeDecl, TypeKind, TypeParam,
};
use grafter_plugin::{Diagnostic, DiagnosticSink, Generated, GenerationContext};

use crate::cancel::CancellationToken;
use crate::error::{ResolveError, TransformError};
use crate::resolver::PluginHost;
use crate::scanner::{AncestorLink, TargetKinds, scan};

use std::path::PathBuf;

/// Per-pass configuration shared by every document's transformation.
#[derive(Debug, Default)]
pub struct TransformOptions {
    /// Directory containing the project file, exposed to generators.
    pub project_dir: PathBuf,
    /// Build properties supplied by the driving build tool.
    pub properties: IndexMap<String, String>,
    /// Declaration shapes accepted as generation targets.
    pub targets: TargetKinds,
}

/// The result of transforming one document.
#[derive(Debug)]
pub struct TransformOutcome {
    /// The synthesized output document.
    pub document: Document,
    /// Messages for entries that could not generate (unresolvable modules
    /// or generator types). The document was still assembled without them.
    pub failed_entries: Vec<String>,
}

/// Transforms documents against one plugin host and semantic model.
pub struct DocumentTransform<'a> {
    host: &'a mut PluginHost,
    model: &'a SemanticModel,
    compilation: &'a CompilationInfo,
    options: &'a TransformOptions,
}

impl<'a> DocumentTransform<'a> {
    pub fn new(
        host: &'a mut PluginHost,
        model: &'a SemanticModel,
        compilation: &'a CompilationInfo,
        options: &'a TransformOptions,
    ) -> Self {
        Self {
            host,
            model,
            compilation,
            options,
        }
    }

    /// Transform one document.
    ///
    /// Entries are processed strictly sequentially so that the shared
    /// import/alias accumulation is deterministic: each generator observes
    /// what every earlier generator queued.
    ///
    /// # Errors
    ///
    /// A generator construction or invocation failure aborts this
    /// document's generation; the error diagnostic is anchored to the
    /// zero-length span at the start of the document.
    pub fn transform(
        &mut self,
        document: &Document,
        sink: &dyn DiagnosticSink,
        cancel: &CancellationToken,
    ) -> Result<TransformOutcome, TransformError> {
        let entries = scan(document, self.model, &self.options.targets, sink);

        let mut aliases = document.aliases.clone();
        let mut imports = document.imports.clone();
        let mut annotations = document.annotations.clone();
        let mut tree = MergeTree::default();
        let mut failed_entries = Vec::new();

        for entry in entries {
            if cancel.is_cancelled() {
                return Err(TransformError::Cancelled);
            }

            let module = match self.host.resolve(&entry.descriptor.module) {
                Ok(module) => module,
                Err(err @ ResolveError::NotFound { .. }) => {
                    let message = format!(
                        "[{}] on '{}': {}",
                        entry.descriptor.annotation.name,
                        entry.declaration.name(),
                        err
                    );
                    sink.report(Diagnostic::error(&message).at_document_start(&document.path));
                    failed_entries.push(message);
                    continue;
                }
                Err(err) => return Err(document_failure(document, sink, err.to_string())),
            };

            let Some(factory) = module.factory(&entry.descriptor.generator) else {
                let message = format!(
                    "module '{}' does not provide generator '{}' required by [{}] on '{}'",
                    entry.descriptor.module,
                    entry.descriptor.generator,
                    entry.descriptor.annotation.name,
                    entry.declaration.name()
                );
                sink.report(Diagnostic::error(&message).at_document_start(&document.path));
                failed_entries.push(message);
                continue;
            };

            let generator = match factory.create(&entry.descriptor.annotation) {
                Ok(generator) => generator,
                Err(err) => {
                    return Err(document_failure(
                        document,
                        sink,
                        format!(
                            "constructing generator '{}' failed: {err:#}",
                            entry.descriptor.generator
                        ),
                    ));
                }
            };

            let ctx = GenerationContext {
                node: entry.declaration,
                scope: entry.scope(),
                compilation: self.compilation,
                project_dir: &self.options.project_dir,
                properties: &self.options.properties,
                queued_imports: &imports,
                queued_aliases: &aliases,
            };

            let generated = match generator.generate(&ctx, sink) {
                Ok(generated) => generated,
                Err(err) => {
                    return Err(document_failure(
                        document,
                        sink,
                        format!("generator '{}' failed: {err:#}", entry.descriptor.generator),
                    ));
                }
            };

            match generated {
                Generated::Members(members) => tree.graft(&entry.chain, members),
                Generated::Rich(rich) => {
                    imports.extend(rich.imports);
                    aliases.extend(rich.aliases);
                    annotations.extend(rich.annotations);
                    for member in rich.members {
                        tree.insert_document_level(member);
                    }
                }
            }
        }

        Ok(TransformOutcome {
            document: Document {
                path: document.path.clone(),
                aliases,
                imports,
                annotations,
                directives: IndexMap::new(),
                members: tree.into_members(),
            },
            failed_entries,
        })
    }
}

fn document_failure(
    document: &Document,
    sink: &dyn DiagnosticSink,
    message: String,
) -> TransformError {
    sink.report(Diagnostic::error(&message).at_document_start(&document.path));
    TransformError::Invocation {
        path: document.path.clone(),
        message,
    }
}

/// The output tree under assembly.
///
/// Sibling containers that share a nesting path merge into one node;
/// containers and generated leaves interleave in first-touch order, which
/// is what makes the merge deterministic.
#[derive(Debug, Default)]
struct MergeTree {
    items: Vec<MergeItem>,
}

#[derive(Debug)]
enum MergeItem {
    Node(MergeNode),
    Leaf(Declaration),
}

#[derive(Debug)]
struct MergeNode {
    skeleton: Skeleton,
    items: Vec<MergeItem>,
}

/// A mirrored container: modifiers and type-parameter names are copied
/// from the source declaration, constraints and annotations are not.
#[derive(Debug)]
enum Skeleton {
    Namespace {
        name: String,
        imports: Vec<Import>,
    },
    Type {
        kind: TypeKind,
        name: String,
        modifiers: Vec<Modifier>,
        type_params: Vec<String>,
    },
}

impl Skeleton {
    fn from_link(link: &AncestorLink<'_>) -> Self {
        match link {
            AncestorLink::Namespace(ns) => Skeleton::Namespace {
                name: ns.name.clone(),
                imports: ns.imports.clone(),
            },
            AncestorLink::Type(ty) => Skeleton::Type {
                kind: ty.kind,
                name: ty.name.clone(),
                modifiers: ty.modifiers.clone(),
                type_params: ty.type_params.iter().map(|p| p.name.clone()).collect(),
            },
        }
    }

    fn same_container(&self, other: &Skeleton) -> bool {
        match (self, other) {
            (Skeleton::Namespace { name: a, .. }, Skeleton::Namespace { name: b, .. }) => a == b,
            (
                Skeleton::Type { kind: ka, name: a, .. },
                Skeleton::Type { kind: kb, name: b, .. },
            ) => ka == kb && a == b,
            _ => false,
        }
    }
}

impl MergeTree {
    /// Append generated members under the mirror of the given ancestor
    /// chain, creating the chain's containers as needed. An empty member
    /// list still materializes the chain, so an annotated declaration
    /// always leaves its enclosing skeleton in the output.
    fn graft(&mut self, chain: &[AncestorLink<'_>], members: Vec<Declaration>) {
        let target = ensure_chain(&mut self.items, chain);
        target.extend(members.into_iter().map(MergeItem::Leaf));
    }

    /// Insert a rich-result member at compilation-unit level. Namespace
    /// members are decomposed so that results redirected to the same
    /// namespace share one output container.
    fn insert_document_level(&mut self, member: Declaration) {
        insert_merged(&mut self.items, member);
    }

    fn into_members(self) -> Vec<Declaration> {
        self.items.into_iter().map(MergeItem::into_declaration).collect()
    }
}

fn ensure_chain<'t>(
    items: &'t mut Vec<MergeItem>,
    chain: &[AncestorLink<'_>],
) -> &'t mut Vec<MergeItem> {
    let Some((link, rest)) = chain.split_first() else {
        return items;
    };

    let skeleton = Skeleton::from_link(link);
    let position = items.iter().position(
        |item| matches!(item, MergeItem::Node(node) if node.skeleton.same_container(&skeleton)),
    );
    let position = match position {
        Some(position) => position,
        None => {
            items.push(MergeItem::Node(MergeNode {
                skeleton,
                items: Vec::new(),
            }));
            items.len() - 1
        }
    };

    match &mut items[position] {
        MergeItem::Node(node) => ensure_chain(&mut node.items, rest),
        MergeItem::Leaf(_) => unreachable!("position matched a node"),
    }
}

fn insert_merged(items: &mut Vec<MergeItem>, declaration: Declaration) {
    let Declaration::Namespace(ns) = declaration else {
        items.push(MergeItem::Leaf(declaration));
        return;
    };

    let skeleton = Skeleton::Namespace {
        name: ns.name,
        imports: ns.imports,
    };
    let position = items.iter().position(
        |item| matches!(item, MergeItem::Node(node) if node.skeleton.same_container(&skeleton)),
    );
    let position = match position {
        Some(position) => {
            // Merge scoped imports of a repeated namespace, preserving
            // arrival order and duplicates.
            if let MergeItem::Node(node) = &mut items[position] {
                if let (
                    Skeleton::Namespace { imports, .. },
                    Skeleton::Namespace {
                        imports: incoming, ..
                    },
                ) = (&mut node.skeleton, skeleton)
                {
                    imports.extend(incoming);
                }
            }
            position
        }
        None => {
            items.push(MergeItem::Node(MergeNode {
                skeleton,
                items: Vec::new(),
            }));
            items.len() - 1
        }
    };

    match &mut items[position] {
        MergeItem::Node(node) => {
            for member in ns.members {
                insert_merged(&mut node.items, member);
            }
        }
        MergeItem::Leaf(_) => unreachable!("position matched a node"),
    }
}

impl MergeItem {
    fn into_declaration(self) -> Declaration {
        match self {
            MergeItem::Leaf(declaration) => declaration,
            MergeItem::Node(node) => {
                let members = node
                    .items
                    .into_iter()
                    .map(MergeItem::into_declaration)
                    .collect();
                match node.skeleton {
                    Skeleton::Namespace { name, imports } => Declaration::Namespace(NamespaceDecl {
                        name,
                        imports,
                        members,
                    }),
                    Skeleton::Type {
                        kind,
                        name,
                        modifiers,
                        type_params,
                    } => Declaration::Type(TypeDecl {
                        kind,
                        name,
                        modifiers,
                        type_params: type_params.into_iter().map(TypeParam::new).collect(),
                        annotations: Vec::new(),
                        members,
                    }),
                }
            }
        }
    }
}
