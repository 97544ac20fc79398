//! Service module system for modular registration.
//!
//! A binding collaborator (manual wiring, generated code, whatever the
//! surrounding system uses) can package its registrations as a module
//! and hand them to the collection in one call.

use crate::{DiResult, ServiceCollection};

/// A reusable bundle of service registrations.
///
/// # Examples
///
/// ```rust
/// use graft_di::{DiResult, Resolver, ServiceCollection, ServiceModule};
///
/// #[derive(Default)]
/// struct UserConfig;
///
/// struct UserService;
///
/// struct UserModule;
///
/// impl ServiceModule for UserModule {
///     fn register_services(self, services: &mut ServiceCollection) -> DiResult<()> {
///         services.add_singleton(UserConfig);
///         services.add_scoped_factory::<UserService, _>(|r| {
///             let _config = r.get_required::<UserConfig>();
///             UserService
///         });
///         Ok(())
///     }
/// }
///
/// # fn main() -> DiResult<()> {
/// let mut services = ServiceCollection::new();
/// services.add_module(UserModule)?;
/// let container = services.build();
/// # Ok(())
/// # }
/// ```
pub trait ServiceModule {
    /// Register this module's services with the collection.
    fn register_services(self, services: &mut ServiceCollection) -> DiResult<()>;
}

impl ServiceCollection {
    /// Adds a module's registrations to this collection.
    pub fn add_module<M: ServiceModule>(&mut self, module: M) -> DiResult<&mut Self> {
        module.register_services(self)?;
        Ok(self)
    }
}
