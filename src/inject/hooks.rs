//! Automatic injection into objects produced through a named hook.

use std::collections::HashMap;

use crate::error::DiResult;
use crate::instance::Instance;

use super::{InjectionTarget, Injector};

/// Hook re-armed by [`ChildInjector::inject_to_children`].
pub const INJECT_HOOK: &str = "inject";

/// Callback run for every object produced through a hook.
pub type HookHandler = Box<dyn FnMut(&mut dyn InjectionTarget) -> DiResult<()>>;

/// Host exposing named hooks: register a callback, remove all callbacks.
pub trait HookHost {
    fn on(&mut self, hook: &str, handler: HookHandler);

    fn off(&mut self, hook: &str);
}

/// Minimal [`HookHost`]: callbacks per hook name, run in registration order.
#[derive(Default)]
pub struct EventHooks {
    handlers: HashMap<String, Vec<HookHandler>>,
}

impl EventHooks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs every callback registered under `hook` on `target` and returns
    /// how many ran.
    pub fn trigger(&mut self, hook: &str, target: &mut dyn InjectionTarget) -> DiResult<usize> {
        let Some(handlers) = self.handlers.get_mut(hook) else {
            return Ok(0);
        };
        for handler in handlers.iter_mut() {
            handler(&mut *target)?;
        }
        Ok(handlers.len())
    }

    /// Number of callbacks registered under `hook`.
    pub fn count(&self, hook: &str) -> usize {
        self.handlers.get(hook).map_or(0, Vec::len)
    }
}

impl HookHost for EventHooks {
    fn on(&mut self, hook: &str, handler: HookHandler) {
        self.handlers.entry(hook.to_string()).or_default().push(handler);
    }

    fn off(&mut self, hook: &str) {
        self.handlers.remove(hook);
    }
}

impl std::fmt::Debug for EventHooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let counts: HashMap<&str, usize> = self.handlers.iter().map(|(k, v)| (k.as_str(), v.len())).collect();
        f.debug_struct("EventHooks").field("handlers", &counts).finish()
    }
}

/// Injector role holding a fixed set of objects to offer to children.
///
/// ```rust
/// use ferrous_wire::{
///     Binding, Class, ClassCatalog, ChildInjector, DiResult, EventHooks, InjectionRules, InjectionTarget,
///     Injector, Instance, INJECT_HOOK,
/// };
/// use std::rc::Rc;
///
/// struct Clock;
///
/// struct Widget {
///     rules: InjectionRules,
///     clock: Option<Instance>,
/// }
///
/// impl InjectionTarget for Widget {
///     fn injection_rules(&self) -> &InjectionRules {
///         &self.rules
///     }
///
///     fn assign(&mut self, _property: &str, object: Instance) -> DiResult<()> {
///         self.clock = Some(object);
///         Ok(())
///     }
/// }
///
/// let catalog = Rc::new(ClassCatalog::new());
/// catalog.register(Class::<Clock>::new("app::Clock"));
///
/// let mut hooks = EventHooks::new();
/// let mut children = ChildInjector::new(Injector::new(catalog));
/// children.inject_to_children(&mut hooks, vec![Instance::new(Clock)]);
///
/// let mut widget = Widget {
///     rules: InjectionRules::new().strict("app::Clock", Binding::property("clock")),
///     clock: None,
/// };
/// hooks.trigger(INJECT_HOOK, &mut widget).unwrap();
/// assert!(widget.clock.is_some());
/// ```
#[derive(Debug, Clone)]
pub struct ChildInjector {
    injector: Injector,
    objects: Vec<Instance>,
}

impl ChildInjector {
    pub fn new(injector: Injector) -> Self {
        ChildInjector { injector, objects: Vec::new() }
    }

    /// Objects currently offered to children.
    pub fn objects(&self) -> &[Instance] {
        &self.objects
    }

    /// Injects `objects` into `target` now.
    pub fn inject(&self, target: &mut dyn InjectionTarget) -> DiResult<usize> {
        self.injector.inject(target, self.objects.iter().cloned())
    }

    /// Replaces the offered objects and re-arms the [`INJECT_HOOK`] on `host`
    /// so every object produced through it gets an injection pass.
    ///
    /// Any handler previously attached under the hook is removed first.
    pub fn inject_to_children(&mut self, host: &mut dyn HookHost, objects: Vec<Instance>) {
        self.objects = objects;
        self.attach_inject_event_handler(host);
    }

    fn attach_inject_event_handler(&self, host: &mut dyn HookHost) {
        host.off(INJECT_HOOK);
        if self.objects.is_empty() {
            return;
        }
        let injector = self.injector.clone();
        let objects = self.objects.clone();
        tracing::trace!(objects = objects.len(), "arming inject hook");
        host.on(
            INJECT_HOOK,
            Box::new(move |target: &mut dyn InjectionTarget| {
                injector.inject(target, objects.iter().cloned()).map(|_| ())
            }),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ClassCatalog;
    use std::rc::Rc;

    #[test]
    fn test_rearming_replaces_previous_handler() {
        let mut hooks = EventHooks::new();
        let mut children = ChildInjector::new(Injector::new(Rc::new(ClassCatalog::new())));

        children.inject_to_children(&mut hooks, vec![Instance::new(1u8)]);
        children.inject_to_children(&mut hooks, vec![Instance::new(2u8)]);
        assert_eq!(hooks.count(INJECT_HOOK), 1);

        children.inject_to_children(&mut hooks, Vec::new());
        assert_eq!(hooks.count(INJECT_HOOK), 0);
    }
}
