//! # System Registry
//!
//! Maps system names to the means of producing a system instance, consulted
//! only when a world is built from a snapshot. The registry is an ordinary
//! owned value: the embedding application creates it at startup, fills it,
//! passes it to the loader and clears or drops it at teardown.

use std::collections::HashMap;

use tracing::debug;

use crate::ecs::System;
use crate::error::{EcsError, EcsResult};

/// Produces a fresh system instance.
pub type SystemFactory<E> = Box<dyn Fn() -> Box<dyn System<E>>>;

/// How a registered name resolves to a system.
enum Provider<E> {
    /// Builds a new instance every time.
    Factory(SystemFactory<E>),
    /// A pre-built instance, handed out once.
    Instance(Option<Box<dyn System<E>>>),
}

/// Registry of systems available to snapshot loading.
pub struct SystemRegistry<E = ()> {
    providers: HashMap<String, Provider<E>>,
}

impl<E> Default for SystemRegistry<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> std::fmt::Debug for SystemRegistry<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SystemRegistry")
            .field("names", &self.names())
            .finish()
    }
}

impl<E: 'static> SystemRegistry<E> {
    /// Registers a system type built with `Default`, under its own name.
    pub fn register_default<S: System<E> + Default + 'static>(&mut self) -> &mut Self {
        let name = S::default().name().to_string();
        self.register_factory(name, || Box::new(S::default()) as Box<dyn System<E>>)
    }
}

impl<E> SystemRegistry<E> {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            providers: HashMap::new(),
        }
    }

    /// Registers a factory under `name`, replacing any previous entry.
    pub fn register_factory<F>(&mut self, name: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn() -> Box<dyn System<E>> + 'static,
    {
        self.providers
            .insert(name.into(), Provider::Factory(Box::new(factory)));
        self
    }

    /// Registers a pre-built instance under its own name.
    ///
    /// The instance can be handed out once; a second lookup fails with
    /// [`EcsError::SystemConsumed`].
    pub fn register_instance(&mut self, system: Box<dyn System<E>>) -> &mut Self {
        let name = system.name().to_string();
        self.providers.insert(name, Provider::Instance(Some(system)));
        self
    }

    /// Checks if a name is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.providers.contains_key(name)
    }

    /// Registered names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.providers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Number of registered names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Checks if the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Removes a registration.
    pub fn unregister(&mut self, name: &str) -> bool {
        self.providers.remove(name).is_some()
    }

    /// Removes every registration.
    pub fn clear(&mut self) {
        self.providers.clear();
    }

    /// Produces the system registered under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::UnknownSystem`] if nothing is registered under the
    /// name, [`EcsError::SystemConsumed`] if its one-shot instance was
    /// already taken, or [`EcsError::SystemNameMismatch`] if the entry built
    /// a system that reports another name (it could not be reloaded from an
    /// export).
    pub fn instantiate(&mut self, name: &str) -> EcsResult<Box<dyn System<E>>> {
        let provider = self
            .providers
            .get_mut(name)
            .ok_or_else(|| EcsError::UnknownSystem(name.to_string()))?;

        let system = match provider {
            Provider::Factory(factory) => factory(),
            Provider::Instance(slot) => slot
                .take()
                .ok_or_else(|| EcsError::SystemConsumed(name.to_string()))?,
        };

        if system.name() != name {
            return Err(EcsError::SystemNameMismatch {
                registered: name.to_string(),
                actual: system.name().to_string(),
            });
        }
        debug!(system = name, "system instantiated from registry");
        Ok(system)
    }
}
