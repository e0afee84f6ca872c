//! Name-to-command lookup.
//!
//! The registry is populated from an explicit table at startup. Each entry
//! is a factory that deserialises a command from keyword arguments.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::command::Command;
use crate::commands;
use crate::error::CommandError;

/// Builds a command from a request's keyword arguments.
pub type Factory = fn(&str, Map<String, Value>) -> Result<Box<dyn Command>, CommandError>;

/// Deserialise `C` from keyword arguments.
pub fn build_command<C>(
    name: &str,
    kwargs: Map<String, Value>,
) -> Result<Box<dyn Command>, CommandError>
where
    C: Command + DeserializeOwned + 'static,
{
    serde_json::from_value::<C>(Value::Object(kwargs))
        .map(|command| Box::new(command) as Box<dyn Command>)
        .map_err(|e| CommandError::argument(name, e))
}

#[derive(Default)]
pub struct CommandRegistry {
    factories: BTreeMap<String, Factory>,
}

impl std::fmt::Debug for CommandRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.factories.keys()).finish()
    }
}

impl CommandRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every built-in command.
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for (name, factory) in commands::BUILTINS {
            registry.register_factory(name, *factory);
        }
        registry
    }

    /// Register `C` under `name`. Returns `false` if the name was taken.
    pub fn register<C>(&mut self, name: &str) -> bool
    where
        C: Command + DeserializeOwned + 'static,
    {
        self.register_factory(name, build_command::<C>)
    }

    /// Register a factory. The first registration of a name wins; later ones
    /// are logged and ignored.
    pub fn register_factory(&mut self, name: &str, factory: Factory) -> bool {
        if self.factories.contains_key(name) {
            warn!(command = name, "duplicate command registration ignored");
            return false;
        }
        debug!(command = name, "command registered");
        self.factories.insert(name.to_string(), factory);
        true
    }

    pub fn resolve(&self, name: &str) -> Option<Factory> {
        self.factories.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Resolve `name` and deserialise the command from `kwargs`.
    pub fn build(
        &self,
        name: &str,
        kwargs: Map<String, Value>,
    ) -> Result<Box<dyn Command>, CommandError> {
        let factory = self
            .resolve(name)
            .ok_or_else(|| CommandError::UnknownCommand(name.to_string()))?;
        factory(name, kwargs)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}
