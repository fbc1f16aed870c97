//! Sample generators and wiring helpers for tests.
//!
//! This module is only available when the `testing` feature is enabled or
//! during tests. The generators mirror the common plugin shapes: simple
//! copy generators, rich bucket generators, a namespace redirector, and a
//! deliberately failing generator for error-path coverage.

use eyre::{Result, eyre};
use grafter_model::{
    Annotation, Declaration, DirectiveBinding, NamespaceDecl, SemanticModel, TypeDecl, TypeParam,
};
use grafter_plugin::{
    DiagnosticSink, Generated, GenerationContext, Generator, GeneratorFactory, ModuleRegistrar,
    RichGenerated,
};

use crate::resolver::PluginHost;

/// Logical name the sample module is registered under.
pub const SAMPLE_MODULE: &str = "sample_generators";

/// Register every sample generator on a registrar.
pub fn register_sample_generators(registrar: &mut dyn ModuleRegistrar) {
    registrar.register("empty_partial", Box::new(EmptyPartialFactory));
    registrar.register("duplicate_with_suffix", Box::new(DuplicateWithSuffixFactory));
    registrar.register(
        "duplicate_in_other_namespace",
        Box::new(DuplicateInOtherNamespaceFactory),
    );
    registrar.register("add_import", Box::new(AddImportFactory));
    registrar.register("add_alias", Box::new(AddAliasFactory));
    registrar.register("add_annotation", Box::new(AddAnnotationFactory));
    registrar.register("failing", Box::new(FailingFactory));
}

/// A host with the sample module registered as a builtin.
pub fn sample_host() -> PluginHost {
    let mut host = PluginHost::new([], []);
    host.register_builtin(SAMPLE_MODULE, register_sample_generators);
    host
}

/// A semantic model binding one annotation name per sample generator.
pub fn sample_semantic_model() -> SemanticModel {
    let mut model = SemanticModel::new();
    for (annotation, generator) in [
        ("EmptyPartial", "empty_partial"),
        ("DuplicateWithSuffix", "duplicate_with_suffix"),
        ("DuplicateInOtherNamespace", "duplicate_in_other_namespace"),
        ("AddImport", "add_import"),
        ("AddAlias", "add_alias"),
        ("AddAnnotation", "add_annotation"),
        ("Failing", "failing"),
    ] {
        model.bind(
            annotation,
            DirectiveBinding {
                module: SAMPLE_MODULE.to_string(),
                generator: generator.to_string(),
            },
        );
    }
    model
}

/// Emits an empty partial mirror of the annotated type; nothing for other
/// shapes.
struct EmptyPartialFactory;

impl GeneratorFactory for EmptyPartialFactory {
    fn create(&self, _directive: &Annotation) -> Result<Box<dyn Generator>> {
        Ok(Box::new(EmptyPartialGenerator))
    }
}

struct EmptyPartialGenerator;

impl Generator for EmptyPartialGenerator {
    fn generate(
        &self,
        ctx: &GenerationContext<'_>,
        _diagnostics: &dyn DiagnosticSink,
    ) -> Result<Generated> {
        let Declaration::Type(ty) = ctx.node else {
            return Ok(Generated::none());
        };

        let mut partial = TypeDecl::new(ty.kind, &ty.name).modifier(grafter_model::Modifier::Partial);
        for param in &ty.type_params {
            partial = partial.type_param(TypeParam::new(&param.name));
        }
        Ok(Generated::Members(vec![partial.into()]))
    }
}

/// Copies the annotated type under a suffixed name.
struct DuplicateWithSuffixFactory;

impl GeneratorFactory for DuplicateWithSuffixFactory {
    fn create(&self, directive: &Annotation) -> Result<Box<dyn Generator>> {
        let suffix = directive
            .string_arg(0)
            .ok_or_else(|| eyre!("DuplicateWithSuffix requires a string suffix argument"))?
            .to_string();
        Ok(Box::new(DuplicateWithSuffixGenerator { suffix }))
    }
}

struct DuplicateWithSuffixGenerator {
    suffix: String,
}

impl Generator for DuplicateWithSuffixGenerator {
    fn generate(
        &self,
        ctx: &GenerationContext<'_>,
        _diagnostics: &dyn DiagnosticSink,
    ) -> Result<Generated> {
        let Declaration::Type(ty) = ctx.node else {
            return Ok(Generated::none());
        };

        let mut copy = ty.clone();
        copy.name = format!("{}{}", ty.name, self.suffix);
        Ok(Generated::Members(vec![copy.into()]))
    }
}

/// Re-declares the annotated type inside a different namespace.
struct DuplicateInOtherNamespaceFactory;

impl GeneratorFactory for DuplicateInOtherNamespaceFactory {
    fn create(&self, directive: &Annotation) -> Result<Box<dyn Generator>> {
        let namespace = directive
            .string_arg(0)
            .ok_or_else(|| eyre!("DuplicateInOtherNamespace requires a namespace argument"))?
            .to_string();
        Ok(Box::new(DuplicateInOtherNamespaceGenerator { namespace }))
    }
}

struct DuplicateInOtherNamespaceGenerator {
    namespace: String,
}

impl Generator for DuplicateInOtherNamespaceGenerator {
    fn generate(
        &self,
        ctx: &GenerationContext<'_>,
        _diagnostics: &dyn DiagnosticSink,
    ) -> Result<Generated> {
        let Declaration::Type(ty) = ctx.node else {
            return Ok(Generated::Rich(RichGenerated::new()));
        };

        let bare = TypeDecl::new(ty.kind, &ty.name);
        let rich = RichGenerated::new()
            .add_member(NamespaceDecl::new(&self.namespace).member(bare));
        Ok(rich.into())
    }
}

/// Queues one import directive.
struct AddImportFactory;

impl GeneratorFactory for AddImportFactory {
    fn create(&self, directive: &Annotation) -> Result<Box<dyn Generator>> {
        let path = directive
            .string_arg(0)
            .ok_or_else(|| eyre!("AddImport requires an import path argument"))?
            .to_string();
        Ok(Box::new(AddImportGenerator { path }))
    }
}

struct AddImportGenerator {
    path: String,
}

impl Generator for AddImportGenerator {
    fn generate(
        &self,
        _ctx: &GenerationContext<'_>,
        _diagnostics: &dyn DiagnosticSink,
    ) -> Result<Generated> {
        Ok(RichGenerated::new().add_import(&self.path).into())
    }
}

/// Queues one extern alias.
struct AddAliasFactory;

impl GeneratorFactory for AddAliasFactory {
    fn create(&self, directive: &Annotation) -> Result<Box<dyn Generator>> {
        let name = directive
            .string_arg(0)
            .ok_or_else(|| eyre!("AddAlias requires an alias name argument"))?
            .to_string();
        Ok(Box::new(AddAliasGenerator { name }))
    }
}

struct AddAliasGenerator {
    name: String,
}

impl Generator for AddAliasGenerator {
    fn generate(
        &self,
        _ctx: &GenerationContext<'_>,
        _diagnostics: &dyn DiagnosticSink,
    ) -> Result<Generated> {
        Ok(RichGenerated::new().add_alias(&self.name).into())
    }
}

/// Queues one document-level annotation.
struct AddAnnotationFactory;

impl GeneratorFactory for AddAnnotationFactory {
    fn create(&self, directive: &Annotation) -> Result<Box<dyn Generator>> {
        let name = directive
            .string_arg(0)
            .ok_or_else(|| eyre!("AddAnnotation requires an annotation name argument"))?
            .to_string();
        Ok(Box::new(AddAnnotationGenerator { name }))
    }
}

struct AddAnnotationGenerator {
    name: String,
}

impl Generator for AddAnnotationGenerator {
    fn generate(
        &self,
        _ctx: &GenerationContext<'_>,
        _diagnostics: &dyn DiagnosticSink,
    ) -> Result<Generated> {
        Ok(RichGenerated::new()
            .add_annotation(Annotation::new(&self.name))
            .into())
    }
}

/// Always fails; exercises the per-document failure path.
struct FailingFactory;

impl GeneratorFactory for FailingFactory {
    fn create(&self, _directive: &Annotation) -> Result<Box<dyn Generator>> {
        Ok(Box::new(FailingGenerator))
    }
}

struct FailingGenerator;

impl Generator for FailingGenerator {
    fn generate(
        &self,
        _ctx: &GenerationContext<'_>,
        _diagnostics: &dyn DiagnosticSink,
    ) -> Result<Generated> {
        Err(eyre!("deliberate generation failure"))
    }
}
