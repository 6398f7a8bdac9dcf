//! Dynamic constructor loading using `libloading` (feature-gated).
//!
//! A plugin library exports a registration function under
//! [`REGISTER_SYMBOL`](dynamic_loader::REGISTER_SYMBOL):
//!
//! ```rust,ignore
//! #[unsafe(no_mangle)]
//! pub fn triggerkit_register(registry: &mut ConstructorRegistry) -> AppResult<()> {
//!     registry.register("billing.tax", Arc::new(TaxConstructor))
//! }
//! ```
//!
//! Libraries must be built with the same compiler and `triggerkit-dispatch`
//! version as the host, since the function uses the Rust ABI.

#[cfg(feature = "dynamic")]
pub mod dynamic_loader {
    use std::path::Path;

    use tracing::info;

    use triggerkit_core::error::AppError;

    use crate::plugin::registry::ConstructorRegistry;

    /// Symbol every plugin library exports.
    pub const REGISTER_SYMBOL: &[u8] = b"triggerkit_register";

    /// Type of the exported registration function.
    pub type RegisterFn = unsafe fn(&mut ConstructorRegistry) -> Result<(), AppError>;

    /// Loads constructors from shared libraries (.so / .dll / .dylib).
    ///
    /// Constructors point into library code, so the loader must outlive
    /// every registry and engine it populated.
    pub struct DynamicLoader {
        libraries: Vec<libloading::Library>,
    }

    impl DynamicLoader {
        /// Creates a new dynamic loader.
        pub fn new() -> Self {
            Self {
                libraries: Vec::new(),
            }
        }

        /// Loads a library and lets it register its constructors.
        ///
        /// Returns the number of constructors added.
        ///
        /// # Safety
        /// This runs arbitrary code from a shared library. Only load trusted
        /// plugins built against the same toolchain.
        pub unsafe fn load_from_path(
            &mut self,
            path: &Path,
            registry: &mut ConstructorRegistry,
        ) -> Result<usize, AppError> {
            let lib = unsafe { libloading::Library::new(path) }.map_err(|e| {
                AppError::configuration(format!(
                    "Failed to load plugin library '{}': {}",
                    path.display(),
                    e
                ))
            })?;

            let before = registry.len();
            let registered = {
                let register: libloading::Symbol<RegisterFn> =
                    unsafe { lib.get(REGISTER_SYMBOL) }.map_err(|e| {
                        AppError::configuration(format!(
                            "Plugin library '{}' missing registration symbol: {}",
                            path.display(),
                            e
                        ))
                    })?;

                unsafe { register(registry) }
            };
            let added = registry.len() - before;

            // a failed registration may still have added constructors
            if let Err(e) = registered {
                if added > 0 {
                    self.libraries.push(lib);
                }
                return Err(e);
            }

            info!(
                path = %path.display(),
                constructors = added,
                "Plugin library loaded"
            );

            self.libraries.push(lib);
            Ok(added)
        }

        /// Number of libraries kept alive.
        pub fn loaded_count(&self) -> usize {
            self.libraries.len()
        }
    }

    impl Default for DynamicLoader {
        fn default() -> Self {
            Self::new()
        }
    }

    impl std::fmt::Debug for DynamicLoader {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("DynamicLoader")
                .field("loaded_count", &self.libraries.len())
                .finish()
        }
    }
}

/// Stub loader when the `dynamic` feature is not enabled.
#[cfg(not(feature = "dynamic"))]
pub mod dynamic_loader {
    use std::path::Path;

    use triggerkit_core::error::AppError;

    use crate::plugin::registry::ConstructorRegistry;

    /// Stub dynamic loader; every load fails.
    #[derive(Debug, Default)]
    pub struct DynamicLoader;

    impl DynamicLoader {
        /// Creates a stub loader.
        pub fn new() -> Self {
            Self
        }

        /// Always fails: the crate was built without `dynamic`.
        ///
        /// # Safety
        /// Mirrors the signature of the real loader; performs no unsafe work.
        pub unsafe fn load_from_path(
            &mut self,
            path: &Path,
            _registry: &mut ConstructorRegistry,
        ) -> Result<usize, AppError> {
            Err(AppError::configuration(format!(
                "Cannot load '{}': built without the `dynamic` feature",
                path.display()
            )))
        }

        /// Always zero.
        pub fn loaded_count(&self) -> usize {
            0
        }
    }
}

pub use dynamic_loader::DynamicLoader;
