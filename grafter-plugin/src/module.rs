//! Dynamic module export surface.
//!
//! A generator module compiled as a `cdylib` exposes one well-known static,
//! [`ModuleDecl`], under the symbol name in [`MODULE_SYMBOL`]. The engine
//! loads the library, checks the declared engine version against its own,
//! and calls `register` with a registrar that collects the module's
//! generator factories.

use crate::generator::GeneratorFactory;

/// The contract version a module was compiled against. The loader refuses
/// modules built against a different version.
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Symbol name of the exported [`ModuleDecl`] static.
pub const MODULE_SYMBOL: &[u8] = b"GRAFTER_MODULE";

/// Receives generator registrations from a module.
///
/// Generator names are matched case-insensitively at resolution time.
pub trait ModuleRegistrar {
    /// Register a generator factory under the given generator type name.
    fn register(&mut self, generator: &str, factory: Box<dyn GeneratorFactory>);
}

/// The static a generator module exports.
#[repr(C)]
pub struct ModuleDecl {
    /// Must equal the host's [`ENGINE_VERSION`].
    pub engine_version: &'static str,
    /// Called once at load time to collect the module's factories.
    pub register: fn(&mut dyn ModuleRegistrar),
}

/// Export a registration function as this crate's module declaration.
///
/// ```ignore
/// fn register(registrar: &mut dyn ModuleRegistrar) {
///     registrar.register("duplicate_with_suffix", Box::new(DuplicateWithSuffixFactory));
/// }
///
/// export_module!(register);
/// ```
#[macro_export]
macro_rules! export_module {
    ($register:path) => {
        #[unsafe(no_mangle)]
        pub static GRAFTER_MODULE: $crate::ModuleDecl = $crate::ModuleDecl {
            engine_version: $crate::ENGINE_VERSION,
            register: $register,
        };
    };
}
