//! Behavior lifecycle
//!
//! A behavior is a long-running, preemptable motion action. Each concrete
//! behavior implements [`Behavior`]; one shared driver, [`BehaviorServer`],
//! sequences the lifecycle and owns the status.
//!
//! # Lifecycle
//!
//! ```text
//! IDLE --activate--> ACTIVE --pause--> PAUSED
//!   ^                 |  ^               |
//!   |                 |  +----resume-----+
//!   +---deactivate----+------------------+
//!   +---tick: terminal status (ACTIVE only)
//! ```
//!
//! # Contents
//!
//! - [`Behavior`] trait and status enums
//! - [`BehaviorServer`] lifecycle driver
//! - [`FollowReferenceBehavior`] and [`TakeoffBehavior`]

mod follow_reference;
mod server;
mod takeoff;

use core::fmt;

use crate::error::BehaviorError;
use crate::geometry::StampedTwist;
use crate::state::PlatformState;

pub use follow_reference::FollowReferenceBehavior;
pub use server::{BehaviorServer, TickReport};
pub use takeoff::{TakeoffBehavior, TakeoffFeedback, TakeoffGoal, TakeoffResult};

/// Lifecycle status held by [`BehaviorServer`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BehaviorStatus {
    /// No goal accepted
    #[default]
    Idle,
    /// Goal accepted, ticking
    Active,
    /// Goal retained, not ticking
    Paused,
}

impl fmt::Display for BehaviorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "IDLE",
            Self::Active => "ACTIVE",
            Self::Paused => "PAUSED",
        };
        f.write_str(name)
    }
}

/// Outcome of a single run tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionStatus {
    /// Keep ticking
    Running,
    /// Goal reached
    Success,
    /// Run failed (e.g., command could not be sent)
    Failure,
    /// Run cancelled by the caller
    Aborted,
}

impl ExecutionStatus {
    /// True for every status that ends the run
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Running)
    }
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Running => "RUNNING",
            Self::Success => "SUCCESS",
            Self::Failure => "FAILURE",
            Self::Aborted => "ABORTED",
        };
        f.write_str(name)
    }
}

/// Behavior trait
///
/// All motion behaviors (follow-reference, takeoff) implement this trait.
/// Hooks are only ever called by [`BehaviorServer`], which guarantees the
/// status preconditions noted on each method.
///
/// # Lifecycle
///
/// 1. `on_activate(goal)` - Accept or reject a new goal (from IDLE)
/// 2. `on_run()` - Called once per tick while ACTIVE
/// 3. `on_execution_end(status)` - Called once when the run ends
///
/// `on_modify`, `on_pause`, `on_resume` and `on_deactivate` are called on
/// the matching orchestrator request. A hook returning `Err` rejects the
/// transition; the status is left unchanged.
pub trait Behavior {
    /// Goal accepted by `on_activate` / `on_modify`
    type Goal;
    /// Feedback snapshot published every tick
    type Feedback: Clone;
    /// Result delivered when the run ends
    type Result: Clone;

    /// Behavior name for logging
    fn name(&self) -> &'static str;

    /// Validate and commit a new goal (status IDLE)
    fn on_activate(&mut self, goal: Self::Goal) -> Result<(), BehaviorError>;

    /// Replace the committed goal (status ACTIVE or PAUSED)
    ///
    /// On error the previous goal must remain in effect.
    fn on_modify(&mut self, goal: Self::Goal) -> Result<(), BehaviorError>;

    /// Stop moving, keep the goal (status ACTIVE)
    fn on_pause(&mut self) -> Result<(), BehaviorError>;

    /// Continue with the retained goal (status PAUSED)
    fn on_resume(&mut self) -> Result<(), BehaviorError>;

    /// Stop moving and discard the goal (status ACTIVE or PAUSED)
    fn on_deactivate(&mut self) -> Result<(), BehaviorError>;

    /// One run tick (status ACTIVE)
    fn on_run(&mut self) -> ExecutionStatus;

    /// Run finished with `status`
    fn on_execution_end(&mut self, _status: ExecutionStatus) {}

    /// New velocity reading
    fn on_state_update(&mut self, twist: StampedTwist);

    /// New platform status report
    fn on_platform_update(&mut self, state: PlatformState);

    /// Current feedback snapshot
    fn feedback(&self) -> Self::Feedback;

    /// Current result
    fn result(&self) -> Self::Result;
}
