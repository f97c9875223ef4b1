//! Sequential blocking initialization of locator components.

use std::time::Duration;

use async_trait::async_trait;
use futures::future::LocalBoxFuture;
use tokio::time::{sleep, Instant};

use crate::error::{BoxError, DiResult};
use crate::instance::Instance;

use super::{ComponentState, ServiceLocator};

/// Blocking-init capability: components that must finish an asynchronous
/// setup step before they are considered ready.
///
/// Declare it on a class with [`Class::blocking_init`](crate::Class::blocking_init).
///
/// # Examples
///
/// ```
/// use async_trait::async_trait;
/// use ferrous_wire::{BlockingInit, BoxError, Class, ClassCatalog};
/// use std::sync::atomic::{AtomicBool, Ordering};
///
/// struct Db {
///     connected: AtomicBool,
/// }
///
/// #[async_trait(?Send)]
/// impl BlockingInit for Db {
///     async fn init(&self) -> Result<(), BoxError> {
///         self.connected.store(true, Ordering::SeqCst);
///         Ok(())
///     }
/// }
///
/// let catalog = ClassCatalog::new();
/// catalog.register(
///     Class::<Db>::new("app::Db")
///         .blocking_init()
///         .constructor(|_| Ok(Db { connected: AtomicBool::new(false) })),
/// );
/// assert!(catalog.get("app::Db").unwrap().has_blocking_init());
/// ```
#[async_trait(?Send)]
pub trait BlockingInit: Send + Sync + 'static {
    async fn init(&self) -> Result<(), BoxError>;
}

struct InitStep {
    id: String,
    run: LocalBoxFuture<'static, Result<(), BoxError>>,
}

impl ServiceLocator {
    /// Initializes every component whose class declares [`BlockingInit`].
    ///
    /// Components are visited in registration order. Each one needing init is
    /// instantiated, then the init steps run strictly one after another. A step
    /// still pending after [`LocatorOptions::init_timeout`](super::LocatorOptions)
    /// is reported and awaited further. A failing step is logged, recorded as
    /// [`ComponentState::FailedButTreatedInitialized`] and does not stop the
    /// sequence. Resolves to `true` once every step has settled.
    ///
    /// Instantiation errors are returned before any step runs.
    pub async fn load_components(&self) -> DiResult<bool> {
        let steps = self.schedule_init_steps()?;
        if steps.is_empty() {
            tracing::debug!("no components require initialization");
            return Ok(true);
        }

        tracing::debug!(count = steps.len(), "initializing components");
        for step in steps {
            self.run_step(step).await;
        }
        Ok(true)
    }

    fn schedule_init_steps(&self) -> DiResult<Vec<InitStep>> {
        let mut steps = Vec::new();
        for id in self.ids() {
            let Some(descriptor) = self.descriptor_for(&id)? else {
                continue;
            };
            let Some(init) = descriptor.init.clone() else {
                continue;
            };
            let instance: Instance = self.get_required(&id)?;
            steps.push(InitStep { run: init(instance), id });
        }
        Ok(steps)
    }

    async fn run_step(&self, step: InitStep) {
        let InitStep { id, mut run } = step;
        let timeout = self.options.init_timeout;
        let started = Instant::now();

        self.set_state(&id, ComponentState::Initializing);
        if let Some(observers) = self.observer_snapshot() {
            observers.init_started(&id);
        }

        let slow = sleep(timeout);
        tokio::pin!(slow);
        let result = tokio::select! {
            result = &mut run => result,
            _ = &mut slow => {
                self.report_slow(&id, timeout);
                run.await
            }
        };

        let elapsed = started.elapsed();
        match result {
            Ok(()) => {
                tracing::debug!(id = %id, ?elapsed, "component initialized");
                self.set_state(&id, ComponentState::Initialized);
                if let Some(observers) = self.observer_snapshot() {
                    observers.init_finished(&id, elapsed, None);
                }
            }
            Err(err) => {
                let message = err.to_string();
                tracing::warn!(id = %id, error = %message, "component initialization failed, continuing");
                self.set_state(&id, ComponentState::FailedButTreatedInitialized);
                if let Some(observers) = self.observer_snapshot() {
                    observers.init_finished(&id, elapsed, Some(&message));
                }
            }
        }
    }

    fn report_slow(&self, id: &str, waited: Duration) {
        tracing::warn!(id, ?waited, "component is taking long to initialize");
        if let Some(observers) = self.observer_snapshot() {
            observers.init_slow(id, waited);
        }
    }
}
