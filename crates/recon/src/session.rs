//! Operator-facing session: `run`, `reconfigure`, `reset`.
//!
//! One run at a time per session. `run` blocks while another run holds the
//! session; `try_run` reports `RunInProgress` instead. A tolerance change
//! made while a run is in flight is queued and only picked up by the next
//! run, since each run works from the snapshot it took when it started.

use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};

use crate::config::ReconConfig;
use crate::engine;
use crate::error::ReconError;
use crate::model::{ReconInput, ReconSnapshot, Record};
use crate::store::ResultStore;
use crate::tolerance::{ToleranceConfig, ToleranceSettings};

pub struct ReconSession<'s> {
    store: &'s ResultStore,
    options: ReconConfig,
    settings: Mutex<ToleranceSettings>,
    inputs: Mutex<Option<Arc<ReconInput>>>,
    run_lock: Mutex<()>,
}

impl ReconSession<'static> {
    /// Session publishing into the process-wide store.
    pub fn global(options: ReconConfig) -> Self {
        Self::new(ResultStore::global(), options)
    }
}

impl<'s> ReconSession<'s> {
    /// `options.tolerance` is the initial tolerance and the value `reset`
    /// returns to.
    pub fn new(store: &'s ResultStore, options: ReconConfig) -> Self {
        let settings = ToleranceSettings::new(options.tolerance);
        Self {
            store,
            options,
            settings: Mutex::new(settings),
            inputs: Mutex::new(None),
            run_lock: Mutex::new(()),
        }
    }

    pub fn tolerance(&self) -> ToleranceConfig {
        self.settings.lock().get()
    }

    /// Store a new tolerance without running. Never waits on a run.
    pub fn set_tolerance(&self, tolerance: ToleranceConfig) -> Result<(), ReconError> {
        self.settings.lock().set(tolerance)
    }

    /// True when the stored result no longer reflects the current tolerance.
    pub fn is_dirty(&self) -> bool {
        self.settings.lock().is_dirty()
    }

    /// Reconcile a fresh pair of record sets under `tolerance`.
    pub fn run(
        &self,
        records_a: Vec<Record>,
        records_b: Vec<Record>,
        tolerance: ToleranceConfig,
    ) -> Result<Arc<ReconSnapshot>, ReconError> {
        let guard = self.run_lock.lock();
        self.run_locked(&guard, Arc::new(ReconInput::new(records_a, records_b)), Some(tolerance))
    }

    /// Like `run`, but fails with `RunInProgress` instead of waiting.
    pub fn try_run(
        &self,
        records_a: Vec<Record>,
        records_b: Vec<Record>,
        tolerance: ToleranceConfig,
    ) -> Result<Arc<ReconSnapshot>, ReconError> {
        let guard = self.run_lock.try_lock().ok_or(ReconError::RunInProgress)?;
        self.run_locked(&guard, Arc::new(ReconInput::new(records_a, records_b)), Some(tolerance))
    }

    /// Re-run the last inputs under the current tolerance.
    pub fn rerun(&self) -> Result<Arc<ReconSnapshot>, ReconError> {
        let guard = self.run_lock.lock();
        let input = self.inputs.lock().clone().ok_or(ReconError::EmptyInput)?;
        self.run_locked(&guard, input, None)
    }

    /// Validate and store `tolerance`, then re-run the last inputs.
    ///
    /// Returns `Ok(None)` when nothing has been run yet; the tolerance is
    /// still kept for the first run.
    pub fn reconfigure(
        &self,
        tolerance: ToleranceConfig,
    ) -> Result<Option<Arc<ReconSnapshot>>, ReconError> {
        self.set_tolerance(tolerance)?;

        let guard = self.run_lock.lock();
        let Some(input) = self.inputs.lock().clone() else {
            log::debug!("reconfigure: no inputs yet, tolerance queued");
            return Ok(None);
        };
        self.run_locked(&guard, input, None).map(Some)
    }

    /// Clear results and inputs, and restore the initial tolerance.
    pub fn reset(&self) {
        let _guard = self.run_lock.lock();
        self.store.reset();
        *self.inputs.lock() = None;
        *self.settings.lock() = ToleranceSettings::new(self.options.tolerance);
        log::info!("session reset");
    }

    /// `tolerance` of `None` means "use the current settings".
    fn run_locked(
        &self,
        _guard: &MutexGuard<'_, ()>,
        input: Arc<ReconInput>,
        tolerance: Option<ToleranceConfig>,
    ) -> Result<Arc<ReconSnapshot>, ReconError> {
        let (snapshot_tolerance, start_revision) = {
            let settings = self.settings.lock();
            (tolerance.unwrap_or_else(|| settings.get()), settings.revision())
        };

        let mut config = self.options.clone();
        config.tolerance = snapshot_tolerance;
        let snapshot = match engine::run(&config, &input) {
            Ok(s) => s,
            Err(e) => {
                log::warn!("reconciliation run rejected: {e}");
                return Err(e);
            }
        };

        {
            let mut settings = self.settings.lock();
            if tolerance.is_some() && settings.revision() == start_revision {
                settings.adopt(snapshot_tolerance);
            } else {
                settings.mark_applied(&snapshot_tolerance);
            }
        }
        *self.inputs.lock() = Some(input);
        Ok(self.store.replace(snapshot))
    }
}
