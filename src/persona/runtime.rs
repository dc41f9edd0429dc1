//! Atomic hot-swap runtime for the active [`Persona`].
//!
//! Grounded on the pack's `ArcSwap`-backed hot-reload idiom (see the
//! `bytebeat` reference: a `LazyLock<ArcSwap<Beat>>` swapped from a config
//! watcher and read lock-free from the audio thread) — the same shape
//! spec §4.7 asks for: `active()` is a cheap lock-free read, `swap()` is a
//! single pointer store so any in-flight step either sees the whole old
//! persona or the whole new one, never a torn mix (spec §8 invariant 3).

use super::loader::PersonaLoader;
use super::{Persona, PersonaDescriptor};
use crate::error::{Result, VoiceError};
use arc_swap::ArcSwap;
use std::sync::Arc;

/// Observer callback fired after a successful swap (dashboard wake-word
/// set refresh, status text, etc. — spec §4.7 "Change observer").
pub type SwapObserver = Box<dyn Fn(&Persona) + Send + Sync>;

/// Holds the currently active persona and mediates hot-swap.
pub struct PersonaRuntime {
    current: ArcSwap<Persona>,
    loader: Box<dyn PersonaLoader>,
    observers: std::sync::Mutex<Vec<SwapObserver>>,
}

impl PersonaRuntime {
    pub fn new(initial: Persona, loader: Box<dyn PersonaLoader>) -> Self {
        Self {
            current: ArcSwap::from_pointee(initial),
            loader,
            observers: std::sync::Mutex::new(Vec::new()),
        }
    }

    /// Cheap, lock-free read of the active persona.
    pub fn active(&self) -> Arc<Persona> {
        self.current.load_full()
    }

    /// Atomically replace the active persona. Any caller observing
    /// `active()` after this returns sees `new`; a step already in flight
    /// keeps using the `Arc<Persona>` it captured before the swap.
    pub fn swap(&self, new: Persona) {
        self.current.store(Arc::new(new));
        let active = self.active();
        for observer in self.observers.lock().unwrap_or_else(|e| e.into_inner()).iter() {
            observer(&active);
        }
    }

    /// Register a swap observer (e.g. the dashboard's wake-word refresh).
    pub fn on_swap(&self, observer: SwapObserver) {
        self.observers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(observer);
    }

    pub fn list_available(&self) -> Vec<PersonaDescriptor> {
        self.loader.list_available()
    }

    /// Load a persona by name via the injected [`PersonaLoader`], without
    /// swapping it in — the caller decides when to call [`Self::swap`].
    ///
    /// # Errors
    ///
    /// Returns [`VoiceError::Persona`] if no persona with that name exists.
    pub fn load_by_name(&self, name: &str) -> Result<Persona> {
        self.loader
            .load_by_name(name)
            .map_err(|e| VoiceError::Persona(e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persona::loader::InMemoryPersonaLoader;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn persona_named(name: &str) -> Persona {
        let mut p = Persona::fallback();
        p.name = name.to_owned();
        p
    }

    #[test]
    fn active_reflects_latest_swap() {
        let loader = InMemoryPersonaLoader::new(vec![]);
        let runtime = PersonaRuntime::new(persona_named("a"), Box::new(loader));
        assert_eq!(runtime.active().name, "a");
        runtime.swap(persona_named("b"));
        assert_eq!(runtime.active().name, "b");
    }

    #[test]
    fn swap_never_produces_a_torn_persona() {
        // Every observed `active()` is either fully "p1" or fully "p2" —
        // the point of using a single Arc pointer store.
        let loader = InMemoryPersonaLoader::new(vec![]);
        let mut p1 = persona_named("p1");
        p1.traits.formality = 0.1;
        let mut p2 = persona_named("p2");
        p2.traits.formality = 0.9;

        let runtime = PersonaRuntime::new(p1.clone(), Box::new(loader));
        runtime.swap(p2.clone());

        let active = runtime.active();
        assert!(
            (active.name == "p1" && (active.traits.formality - 0.1).abs() < f32::EPSILON)
                || (active.name == "p2" && (active.traits.formality - 0.9).abs() < f32::EPSILON)
        );
    }

    #[test]
    fn swap_fires_registered_observers() {
        let loader = InMemoryPersonaLoader::new(vec![]);
        let runtime = PersonaRuntime::new(persona_named("a"), Box::new(loader));
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = Arc::clone(&calls);
        runtime.on_swap(Box::new(move |_| {
            calls_clone.fetch_add(1, Ordering::Relaxed);
        }));
        runtime.swap(persona_named("b"));
        assert_eq!(calls.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn load_by_name_delegates_to_loader() {
        let loader = InMemoryPersonaLoader::new(vec![persona_named("demo")]);
        let runtime = PersonaRuntime::new(persona_named("a"), Box::new(loader));
        let loaded = runtime.load_by_name("demo").unwrap();
        assert_eq!(loaded.name, "demo");
        assert!(runtime.load_by_name("missing").is_err());
    }
}
