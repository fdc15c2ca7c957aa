//! aerial_behaviors - Host runtime for the aerial behavior engine
//!
//! Wraps the pure logic from [`aerial_behaviors_core`] with the pieces that
//! need an operating system: locking, a waiting frame tree, configuration
//! files, logging and a periodic tick driver.
//!
//! # Modules
//!
//! - [`sync`]: `SharedState` trait and the mutex-backed implementation
//! - [`frames`]: Thread-safe frame tree with waiting lookups
//! - [`config`]: TOML runtime configuration loaded into a parameter store
//! - [`logging`]: `env_logger` setup
//! - [`runner`]: tokio tick driver and orchestrator handle
//! - [`sim`]: Point-mass simulated vehicle acting as a command sink

pub mod config;
pub mod frames;
pub mod logging;
pub mod runner;
pub mod sim;
pub mod sync;

pub use config::{ConfigError, RuntimeConfig};
pub use frames::SharedFrameTree;
pub use runner::{BehaviorRunner, RunnerEvent};
pub use sim::{SimConfig, SimulatedVehicle};
pub use sync::{MutexState, SharedState};
