//! Generator plugin contract for the grafter engine.
//!
//! A generator module is a dynamic library (or a host-registered builtin)
//! exposing named [`GeneratorFactory`] values. The engine constructs one
//! generator instance per directive occurrence, hands it an immutable
//! [`GenerationContext`], and merges whatever it returns back into the
//! output document.
//!
//! Dynamic modules export their registration entry with [`export_module!`]:
//!
//! ```ignore
//! use grafter_plugin::{ModuleRegistrar, export_module};
//!
//! fn register(registrar: &mut dyn ModuleRegistrar) {
//!     registrar.register("duplicate_with_suffix", Box::new(DuplicateWithSuffixFactory));
//! }
//!
//! export_module!(register);
//! ```

mod context;
mod diagnostic;
mod generator;
mod module;

pub use context::GenerationContext;
pub use diagnostic::{
    CollectingSink, Diagnostic, DiagnosticSink, Location, NullSink, Severity, Span,
};
pub use generator::{Generated, Generator, GeneratorFactory, RichGenerated};
pub use module::{ENGINE_VERSION, MODULE_SYMBOL, ModuleDecl, ModuleRegistrar};
