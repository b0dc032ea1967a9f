//! Procedure registry shared by every session.
//!
//! The registry maps procedure names to immutable [`Procedure`] descriptors.
//! All mutation goes through [`Registry::register`], which takes exclusive
//! access; lookups take shared access and never block each other. A
//! registration waits for in-flight lookups to release and holds back new
//! ones until the insertion completes, so readers never observe a partially
//! registered procedure.
//!
//! Registrations are validated before the lock is taken. The uniqueness check
//! and the insertion happen under the same exclusive guard, so two racing
//! registrations of one name produce exactly one success.

mod callable;
mod errors;
mod procedure;
#[cfg(test)]
mod tests;
mod value;

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::{Arc, RwLock};

use tracing::{debug, info};

pub use self::callable::{Arg, Callable, IntoCallable, ProcedureFailure, Reply, Returns};
pub use self::errors::{RegistrationError, RegistryError};
pub use self::procedure::{Procedure, Signature};
pub use self::value::{Kind, Value};

use crate::dispatch::is_meta_command;

/// Tracing target for registry operations.
pub(crate) const REGISTRY_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::registry");

/// Concurrency-safe mapping from procedure name to descriptor.
#[derive(Debug, Default)]
pub struct Registry {
    procedures: RwLock<HashMap<String, Arc<Procedure>>>,
}

impl Registry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a procedure under `name`.
    ///
    /// Registration never replaces an existing procedure. The descriptor is
    /// visible to every lookup that starts after this call returns.
    ///
    /// # Errors
    ///
    /// Returns the first offending condition: a nil callable, an empty name,
    /// a name with whitespace or control characters, a reserved name, a parameter kind that is not one of the five scalar
    /// kinds, or a name that is already registered.
    pub fn register<C, M>(
        &self,
        name: &str,
        description: &str,
        callable: C,
    ) -> Result<(), RegistrationError>
    where
        C: IntoCallable<M>,
    {
        let callable = callable
            .into_callable()
            .ok_or(RegistrationError::NilCallable)?;
        if name.is_empty() {
            return Err(RegistrationError::EmptyName);
        }
        if name
            .chars()
            .any(|ch| ch.is_whitespace() || ch.is_control())
        {
            return Err(RegistrationError::InvalidName {
                name: name.to_owned(),
            });
        }
        if is_meta_command(name) {
            return Err(RegistrationError::ReservedName {
                name: name.to_owned(),
            });
        }
        if let Some((index, kind)) = callable
            .params()
            .iter()
            .enumerate()
            .find(|(_, kind)| !kind.is_parameter())
        {
            return Err(RegistrationError::UnsupportedParameterKind {
                name: name.to_owned(),
                position: index + 1,
                kind: kind.clone(),
            });
        }

        let procedure = Procedure::new(name.to_owned(), description.to_owned(), callable);
        let mut procedures = self
            .procedures
            .write()
            .map_err(|_| RegistrationError::Poisoned)?;
        match procedures.entry(name.to_owned()) {
            Entry::Occupied(_) => {
                debug!(target: REGISTRY_TARGET, procedure = name, "duplicate registration rejected");
                Err(RegistrationError::NameAlreadyRegistered {
                    name: name.to_owned(),
                })
            }
            Entry::Vacant(slot) => {
                info!(
                    target: REGISTRY_TARGET,
                    procedure = name,
                    signature = %procedure.signature(),
                    "procedure registered"
                );
                slot.insert(Arc::new(procedure));
                Ok(())
            }
        }
    }

    /// Registers a procedure during startup wiring, panicking on failure.
    ///
    /// Use this only while building the registry before serving; request
    /// handling code must call [`Registry::register`] and handle the error.
    ///
    /// # Panics
    ///
    /// Panics with the registration error when [`Registry::register`] fails.
    pub fn must_register<C, M>(&self, name: &str, description: &str, callable: C)
    where
        C: IntoCallable<M>,
    {
        if let Err(error) = self.register(name, description, callable) {
            panic!("failed to register procedure '{name}': {error}");
        }
    }

    /// Looks up a procedure, returning a shared handle to its descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Poisoned`] if a writer panicked while holding
    /// the lock.
    pub fn lookup(&self, name: &str) -> Result<Option<Arc<Procedure>>, RegistryError> {
        let procedures = self.procedures.read().map_err(|_| RegistryError::Poisoned)?;
        Ok(procedures.get(name).cloned())
    }

    /// Runs `f` with the named procedure while holding shared access.
    ///
    /// Registrations issued while `f` runs wait until it returns.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Poisoned`] if a writer panicked while holding
    /// the lock.
    pub fn with_procedure<F, R>(&self, name: &str, f: F) -> Result<R, RegistryError>
    where
        F: FnOnce(Option<&Procedure>) -> R,
    {
        let procedures = self.procedures.read().map_err(|_| RegistryError::Poisoned)?;
        Ok(f(procedures.get(name).map(Arc::as_ref)))
    }

    /// All registered procedures ordered by name.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Poisoned`] if a writer panicked while holding
    /// the lock.
    pub fn procedures(&self) -> Result<Vec<Arc<Procedure>>, RegistryError> {
        let procedures = self.procedures.read().map_err(|_| RegistryError::Poisoned)?;
        let mut listed: Vec<_> = procedures.values().cloned().collect();
        listed.sort_by(|left, right| left.name().cmp(right.name()));
        Ok(listed)
    }

    /// Registered names in sorted order.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Poisoned`] if a writer panicked while holding
    /// the lock.
    pub fn names(&self) -> Result<Vec<String>, RegistryError> {
        let procedures = self.procedures.read().map_err(|_| RegistryError::Poisoned)?;
        let mut names: Vec<_> = procedures.keys().cloned().collect();
        names.sort_unstable();
        Ok(names)
    }

    /// Whether a procedure with the given name exists.
    ///
    /// A poisoned registry reports `false`; use [`Registry::lookup`] to tell
    /// the two apart.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.procedures
            .read()
            .is_ok_and(|procedures| procedures.contains_key(name))
    }

    /// Number of registered procedures.
    ///
    /// A poisoned registry reports zero; use [`Registry::names`] to tell the
    /// two apart.
    #[must_use]
    pub fn len(&self) -> usize {
        self.procedures
            .read()
            .map_or(0, |procedures| procedures.len())
    }

    /// Poisons the lock the way a panicking writer would.
    #[cfg(test)]
    pub(crate) fn poison(&self) {
        let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = self.procedures.write();
            panic!("writer panics while holding the lock");
        }));
    }

    /// Whether no procedures are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
