//! The `PersonaLoader` external-collaborator seam (spec §1, §6.4).
//!
//! Persona files on disk and their YAML/Markdown parsing are explicitly
//! out of scope for this core; real persona discovery is expected to live
//! in a layer that implements this trait against `theme.yaml` /
//! `personality.md` / `vocabulary.yaml`. This module declares the trait
//! plus a trivial in-memory reference implementation so
//! `PersonaRuntime::load_by_name` has something real to depend on and the
//! crate is runnable end-to-end without a persona directory.

use super::{Persona, PersonaDescriptor};
use std::collections::HashMap;
use std::sync::RwLock;

/// Discovers and loads personas by name. The core never hard-codes a
/// persona name; this trait is the only way it learns about one.
pub trait PersonaLoader: Send + Sync {
    fn list_available(&self) -> Vec<PersonaDescriptor>;

    /// # Errors
    ///
    /// Returns a human-readable message if `name` doesn't match any
    /// discovered persona.
    fn load_by_name(&self, name: &str) -> Result<Persona, String>;
}

/// `HashMap`-backed loader used for `--no-voice` default startup and
/// tests. Adding a persona means inserting an entry; removing one means
/// deleting it — mirroring the on-disk contract's "drop a directory /
/// remove a directory" model without actually touching a filesystem.
pub struct InMemoryPersonaLoader {
    personas: RwLock<HashMap<String, Persona>>,
}

impl InMemoryPersonaLoader {
    pub fn new(personas: impl IntoIterator<Item = Persona>) -> Self {
        let map = personas.into_iter().map(|p| (p.name.clone(), p)).collect();
        Self {
            personas: RwLock::new(map),
        }
    }

    pub fn insert(&self, persona: Persona) {
        self.personas
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(persona.name.clone(), persona);
    }

    pub fn remove(&self, name: &str) {
        self.personas
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(name);
    }
}

impl PersonaLoader for InMemoryPersonaLoader {
    fn list_available(&self) -> Vec<PersonaDescriptor> {
        self.personas
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .values()
            .map(PersonaDescriptor::from)
            .collect()
    }

    fn load_by_name(&self, name: &str) -> Result<Persona, String> {
        self.personas
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(name)
            .cloned()
            .ok_or_else(|| format!("persona '{name}' not found"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn persona_named(name: &str) -> Persona {
        let mut p = Persona::fallback();
        p.name = name.to_owned();
        p
    }

    #[test]
    fn list_available_reflects_insert_and_remove() {
        let loader = InMemoryPersonaLoader::new(vec![persona_named("a")]);
        assert_eq!(loader.list_available().len(), 1);
        loader.insert(persona_named("b"));
        assert_eq!(loader.list_available().len(), 2);
        loader.remove("a");
        let names: Vec<_> = loader.list_available().into_iter().map(|d| d.name).collect();
        assert_eq!(names, vec!["b".to_owned()]);
    }

    #[test]
    fn load_missing_persona_is_an_error() {
        let loader = InMemoryPersonaLoader::new(vec![]);
        assert!(loader.load_by_name("nope").is_err());
    }
}
