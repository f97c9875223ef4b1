//! Observers for component initialization.
//!
//! Hooks fired by [`ServiceLocator::load_components`](crate::ServiceLocator::load_components)
//! around each blocking-init step, for tracing and monitoring startup.

use std::rc::Rc;
use std::time::Duration;

/// Observer for component initialization events.
///
/// Calls are made synchronously between init steps. Keep implementations
/// lightweight: a slow observer delays the next component.
///
/// # Examples
///
/// ```
/// use ferrous_wire::{ClassCatalog, Container, LocatorObserver, ServiceLocator};
/// use std::cell::RefCell;
/// use std::rc::Rc;
/// use std::time::Duration;
///
/// #[derive(Default)]
/// struct StartupLog {
///     lines: RefCell<Vec<String>>,
/// }
///
/// impl LocatorObserver for StartupLog {
///     fn init_started(&self, id: &str) {
///         self.lines.borrow_mut().push(format!("start {}", id));
///     }
///
///     fn init_finished(&self, id: &str, _elapsed: Duration, error: Option<&str>) {
///         self.lines.borrow_mut().push(format!("done {} ok={}", id, error.is_none()));
///     }
/// }
///
/// let locator = ServiceLocator::new(Rc::new(Container::new(Rc::new(ClassCatalog::new()))));
/// locator.add_observer(Rc::new(StartupLog::default()));
/// ```
pub trait LocatorObserver {
    /// Called before the init step of `id` starts.
    fn init_started(&self, id: &str);

    /// Called once when the init step of `id` exceeds the locator's init timeout.
    /// The step keeps running.
    fn init_slow(&self, id: &str, waited: Duration) {
        let _ = (id, waited);
    }

    /// Called when the init step of `id` settles; `error` carries the failure
    /// message of a step that was downgraded to success.
    fn init_finished(&self, id: &str, elapsed: Duration, error: Option<&str>);
}

/// Registered observers.
#[derive(Default, Clone)]
pub(crate) struct Observers {
    observers: Vec<Rc<dyn LocatorObserver>>,
}

impl Observers {
    pub(crate) fn add(&mut self, observer: Rc<dyn LocatorObserver>) {
        self.observers.push(observer);
    }

    #[inline]
    pub(crate) fn has_observers(&self) -> bool {
        !self.observers.is_empty()
    }

    #[inline]
    pub(crate) fn init_started(&self, id: &str) {
        for observer in &self.observers {
            observer.init_started(id);
        }
    }

    #[inline]
    pub(crate) fn init_slow(&self, id: &str, waited: Duration) {
        for observer in &self.observers {
            observer.init_slow(id, waited);
        }
    }

    #[inline]
    pub(crate) fn init_finished(&self, id: &str, elapsed: Duration, error: Option<&str>) {
        for observer in &self.observers {
            observer.init_finished(id, elapsed, error);
        }
    }
}

/// Built-in observer forwarding events to `tracing`.
///
/// ```
/// use ferrous_wire::{ClassCatalog, Container, LoggingObserver, ServiceLocator};
/// use std::rc::Rc;
///
/// let locator = ServiceLocator::new(Rc::new(Container::new(Rc::new(ClassCatalog::new()))));
/// locator.add_observer(Rc::new(LoggingObserver::with_prefix("[boot]")));
/// ```
pub struct LoggingObserver {
    prefix: String,
}

impl LoggingObserver {
    pub fn new() -> Self {
        Self { prefix: "[ferrous-wire]".to_string() }
    }

    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self { prefix: prefix.into() }
    }
}

impl Default for LoggingObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl LocatorObserver for LoggingObserver {
    fn init_started(&self, id: &str) {
        tracing::info!("{} Initializing: {}", self.prefix, id);
    }

    fn init_slow(&self, id: &str, waited: Duration) {
        tracing::warn!("{} Still initializing: {} after {:?}", self.prefix, id, waited);
    }

    fn init_finished(&self, id: &str, elapsed: Duration, error: Option<&str>) {
        match error {
            None => tracing::info!("{} Initialized: {} in {:?}", self.prefix, id, elapsed),
            Some(error) => tracing::warn!("{} Init of {} failed after {:?}: {}", self.prefix, id, elapsed, error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[derive(Default)]
    struct Recorder {
        events: RefCell<Vec<String>>,
    }

    impl LocatorObserver for Recorder {
        fn init_started(&self, id: &str) {
            self.events.borrow_mut().push(format!("started:{}", id));
        }

        fn init_finished(&self, id: &str, _elapsed: Duration, error: Option<&str>) {
            self.events.borrow_mut().push(format!("finished:{}:{}", id, error.unwrap_or("ok")));
        }
    }

    #[test]
    fn test_observers_fan_out_and_default_slow_hook() {
        let recorder = Rc::new(Recorder::default());
        let mut observers = Observers::default();
        assert!(!observers.has_observers());
        observers.add(recorder.clone());
        observers.add(recorder.clone());

        observers.init_started("db");
        observers.init_slow("db", Duration::from_secs(3));
        observers.init_finished("db", Duration::from_secs(4), Some("boom"));

        assert_eq!(
            *recorder.events.borrow(),
            vec!["started:db", "started:db", "finished:db:boom", "finished:db:boom"]
        );
    }
}
