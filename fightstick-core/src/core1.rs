//! Core 1 dispatcher: drains gamepad snapshots and drives the peripheral modules.

use core::future::Future;

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_time::Instant;

use crate::animation::AnimationEngine;
use crate::driver::LedDriverFactory;
use crate::leds::LedModule;
use crate::options::ConfigError;
use crate::pled::{PledOutput, PwmPledModule};
use crate::queue::SnapshotQueue;
use crate::storage::Storage;
use crate::types::{GamepadSnapshot, InputMode};

/// A Core 1 output module.
///
/// `process` must only queue work; anything slow belongs in `run`.
pub trait PeripheralModule {
    /// Whether the module has hardware configured at all.
    fn available(&self) -> bool;

    fn setup(&mut self) -> impl Future<Output = Result<(), ConfigError>>;

    /// Inspect one gamepad snapshot drained from Core 0.
    fn process(&mut self, snapshot: &mut GamepadSnapshot);

    /// Do the periodic work due at `now`.
    fn run(&mut self, now: Instant) -> impl Future<Output = ()>;
}

impl<M, S, E, F> PeripheralModule for LedModule<'_, M, S, E, F>
where
    M: RawMutex,
    S: Storage,
    E: AnimationEngine,
    F: LedDriverFactory,
{
    fn available(&self) -> bool {
        LedModule::available(self)
    }

    async fn setup(&mut self) -> Result<(), ConfigError> {
        LedModule::setup(self).await
    }

    fn process(&mut self, snapshot: &mut GamepadSnapshot) {
        LedModule::process(self, snapshot);
    }

    async fn run(&mut self, now: Instant) {
        LedModule::run(self, now).await;
    }
}

impl<M, S, O> PeripheralModule for PwmPledModule<'_, M, S, O>
where
    M: RawMutex,
    S: Storage,
    O: PledOutput,
{
    fn available(&self) -> bool {
        PwmPledModule::available(self)
    }

    async fn setup(&mut self) -> Result<(), ConfigError> {
        PwmPledModule::setup(self);
        Ok(())
    }

    fn process(&mut self, snapshot: &mut GamepadSnapshot) {
        PwmPledModule::process(self, snapshot);
    }

    async fn run(&mut self, now: Instant) {
        PwmPledModule::run(self, now);
    }
}

/// Two modules driven in order, skipping whichever is unavailable.
impl<A: PeripheralModule, B: PeripheralModule> PeripheralModule for (A, B) {
    fn available(&self) -> bool {
        self.0.available() || self.1.available()
    }

    async fn setup(&mut self) -> Result<(), ConfigError> {
        if self.0.available() {
            self.0.setup().await?;
        }
        if self.1.available() {
            self.1.setup().await?;
        }
        Ok(())
    }

    fn process(&mut self, snapshot: &mut GamepadSnapshot) {
        if self.0.available() {
            self.0.process(snapshot);
        }
        if self.1.available() {
            self.1.process(snapshot);
        }
    }

    async fn run(&mut self, now: Instant) {
        if self.0.available() {
            self.0.run(now).await;
        }
        if self.1.available() {
            self.1.run(now).await;
        }
    }
}

/// Dispatcher state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Core1State {
    /// `setup` has not been called.
    Idle,
    /// Modules are set up and driven every step.
    Running,
    /// No module available, or the device booted into config mode.
    Parked,
}

/// Runs the peripheral modules from the Core 1 executor.
pub struct Core1<'a, M: RawMutex, P> {
    snapshots: &'a SnapshotQueue<M>,
    module: P,
    state: Core1State,
}

impl<'a, M: RawMutex, P: PeripheralModule> Core1<'a, M, P> {
    pub fn new(snapshots: &'a SnapshotQueue<M>, module: P) -> Self {
        Self {
            snapshots,
            module,
            state: Core1State::Idle,
        }
    }

    /// Set up the modules for `mode`. Config mode parks the dispatcher.
    pub async fn setup(&mut self, mode: InputMode) -> Result<(), ConfigError> {
        if mode == InputMode::Config || !self.module.available() {
            info!("core1 parked");
            self.state = Core1State::Parked;
            return Ok(());
        }
        match self.module.setup().await {
            Ok(()) => {
                self.state = Core1State::Running;
                Ok(())
            }
            Err(e) => {
                error!("peripheral setup failed: {:?}", e);
                self.state = Core1State::Parked;
                Err(e)
            }
        }
    }

    /// One dispatcher iteration: drain at most one snapshot, then run the modules.
    pub async fn step(&mut self, now: Instant) {
        if self.state != Core1State::Running {
            return;
        }
        if let Some(mut snapshot) = self.snapshots.try_pop() {
            self.module.process(&mut snapshot);
        }
        self.module.run(now).await;
    }

    pub fn state(&self) -> Core1State {
        self.state
    }
}
