//! Behavior Server
//!
//! Drives one [`Behavior`] through its lifecycle.
//!
//! ## Responsibilities
//!
//! - Guard every lifecycle request against the current status
//! - Tick the behavior while ACTIVE and detect terminal outcomes
//! - Forward state feeds to the behavior in any status
//!
//! ## Safety
//!
//! - A rejected hook never changes the status
//! - A terminal tick returns the server to IDLE before the report is handed out

use super::{Behavior, BehaviorStatus, ExecutionStatus};
use crate::error::BehaviorError;
use crate::geometry::StampedTwist;
use crate::state::PlatformState;

/// Output of one tick
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport<F, R> {
    pub status: ExecutionStatus,
    pub feedback: F,
    pub result: R,
}

impl<F, R> TickReport<F, R> {
    /// True if this tick ended the run
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

/// Behavior Server
///
/// Owns the lifecycle status of a single behavior instance.
pub struct BehaviorServer<B> {
    behavior: B,
    status: BehaviorStatus,
    /// Ticks run since the last activation
    tick_count: u64,
}

impl<B: Behavior> BehaviorServer<B> {
    /// Create a server in IDLE
    pub fn new(behavior: B) -> Self {
        Self {
            behavior,
            status: BehaviorStatus::Idle,
            tick_count: 0,
        }
    }

    /// Current status
    pub fn status(&self) -> BehaviorStatus {
        self.status
    }

    /// Ticks run since the last activation
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Wrapped behavior
    pub fn behavior(&self) -> &B {
        &self.behavior
    }

    /// Wrapped behavior (mutable)
    pub fn behavior_mut(&mut self) -> &mut B {
        &mut self.behavior
    }

    /// Accept a new goal (IDLE → ACTIVE)
    pub fn activate(&mut self, goal: B::Goal) -> Result<(), BehaviorError> {
        self.require("activate", &[BehaviorStatus::Idle])?;

        match self.behavior.on_activate(goal) {
            Ok(()) => {
                self.status = BehaviorStatus::Active;
                self.tick_count = 0;
                log::info!("{}: goal accepted", self.behavior.name());
                Ok(())
            }
            Err(e) => {
                log::error!("{}: goal rejected: {}", self.behavior.name(), e);
                Err(e)
            }
        }
    }

    /// Replace the current goal (ACTIVE or PAUSED, status unchanged)
    pub fn modify(&mut self, goal: B::Goal) -> Result<(), BehaviorError> {
        self.require("modify", &[BehaviorStatus::Active, BehaviorStatus::Paused])?;

        match self.behavior.on_modify(goal) {
            Ok(()) => {
                log::info!("{}: goal modified", self.behavior.name());
                Ok(())
            }
            Err(e) => {
                log::error!("{}: modification rejected: {}", self.behavior.name(), e);
                Err(e)
            }
        }
    }

    /// ACTIVE → PAUSED
    pub fn pause(&mut self) -> Result<(), BehaviorError> {
        self.require("pause", &[BehaviorStatus::Active])?;
        self.behavior.on_pause()?;
        self.status = BehaviorStatus::Paused;
        log::info!("{}: paused", self.behavior.name());
        Ok(())
    }

    /// PAUSED → ACTIVE
    pub fn resume(&mut self) -> Result<(), BehaviorError> {
        self.require("resume", &[BehaviorStatus::Paused])?;
        self.behavior.on_resume()?;
        self.status = BehaviorStatus::Active;
        log::info!("{}: resumed", self.behavior.name());
        Ok(())
    }

    /// ACTIVE/PAUSED → IDLE
    ///
    /// Ends the run with [`ExecutionStatus::Aborted`].
    pub fn deactivate(&mut self) -> Result<(), BehaviorError> {
        self.require("deactivate", &[BehaviorStatus::Active, BehaviorStatus::Paused])?;
        self.behavior.on_deactivate()?;
        self.status = BehaviorStatus::Idle;
        self.behavior.on_execution_end(ExecutionStatus::Aborted);
        log::info!("{}: deactivated", self.behavior.name());
        Ok(())
    }

    /// Run one tick
    ///
    /// # Returns
    ///
    /// `None` unless ACTIVE. A terminal status moves the server to IDLE.
    pub fn tick(&mut self) -> Option<TickReport<B::Feedback, B::Result>> {
        if self.status != BehaviorStatus::Active {
            return None;
        }

        let status = self.behavior.on_run();
        self.tick_count += 1;
        log::debug!(
            "{}: tick {} -> {}",
            self.behavior.name(),
            self.tick_count,
            status
        );

        if status.is_terminal() {
            self.status = BehaviorStatus::Idle;
            self.behavior.on_execution_end(status);
            log::info!("{}: run ended with {}", self.behavior.name(), status);
        }

        Some(TickReport {
            status,
            feedback: self.behavior.feedback(),
            result: self.behavior.result(),
        })
    }

    /// Forward a velocity reading
    pub fn on_state_update(&mut self, twist: StampedTwist) {
        self.behavior.on_state_update(twist);
    }

    /// Forward a platform status report
    pub fn on_platform_update(&mut self, state: PlatformState) {
        self.behavior.on_platform_update(state);
    }

    fn require(
        &self,
        operation: &'static str,
        allowed: &[BehaviorStatus],
    ) -> Result<(), BehaviorError> {
        if allowed.contains(&self.status) {
            Ok(())
        } else {
            log::warn!(
                "{}: cannot {} while {}",
                self.behavior.name(),
                operation,
                self.status
            );
            Err(BehaviorError::InvalidTransition {
                operation,
                status: self.status,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;

    // Mock behavior for testing
    #[derive(Default)]
    struct MockBehavior {
        goal: Option<u32>,
        reject_goal: Option<u32>,
        run_results: Vec<ExecutionStatus>,
        ended_with: Option<ExecutionStatus>,
        runs: u32,
        twists: u32,
        platform: PlatformState,
    }

    impl MockBehavior {
        fn with_runs(mut self, runs: &[ExecutionStatus]) -> Self {
            // Popped from the back
            self.run_results = runs.iter().rev().copied().collect();
            self
        }
    }

    impl Behavior for MockBehavior {
        type Goal = u32;
        type Feedback = u32;
        type Result = bool;

        fn name(&self) -> &'static str {
            "mock"
        }

        fn on_activate(&mut self, goal: u32) -> Result<(), BehaviorError> {
            self.on_modify(goal)
        }

        fn on_modify(&mut self, goal: u32) -> Result<(), BehaviorError> {
            if self.reject_goal == Some(goal) {
                return Err(BehaviorError::InvalidGoal("rejected"));
            }
            self.goal = Some(goal);
            Ok(())
        }

        fn on_pause(&mut self) -> Result<(), BehaviorError> {
            Ok(())
        }

        fn on_resume(&mut self) -> Result<(), BehaviorError> {
            Ok(())
        }

        fn on_deactivate(&mut self) -> Result<(), BehaviorError> {
            self.goal = None;
            Ok(())
        }

        fn on_run(&mut self) -> ExecutionStatus {
            self.runs += 1;
            self.run_results.pop().unwrap_or(ExecutionStatus::Running)
        }

        fn on_execution_end(&mut self, status: ExecutionStatus) {
            self.ended_with = Some(status);
        }

        fn on_state_update(&mut self, _twist: StampedTwist) {
            self.twists += 1;
        }

        fn on_platform_update(&mut self, state: PlatformState) {
            self.platform = state;
        }

        fn feedback(&self) -> u32 {
            self.runs
        }

        fn result(&self) -> bool {
            self.ended_with != Some(ExecutionStatus::Failure)
        }
    }

    #[test]
    fn test_server_starts_idle_and_does_not_tick() {
        let mut server = BehaviorServer::new(MockBehavior::default());
        assert_eq!(server.status(), BehaviorStatus::Idle);
        assert!(server.tick().is_none());
        assert_eq!(server.behavior().runs, 0);
    }

    #[test]
    fn test_activate_then_tick_running() {
        let mut server = BehaviorServer::new(MockBehavior::default());
        server.activate(7).unwrap();
        assert_eq!(server.status(), BehaviorStatus::Active);

        let report = server.tick().unwrap();
        assert_eq!(report.status, ExecutionStatus::Running);
        assert_eq!(report.feedback, 1);
        assert!(!report.is_terminal());
        assert_eq!(server.tick_count(), 1);
    }

    #[test]
    fn test_rejected_activation_stays_idle() {
        let behavior = MockBehavior {
            reject_goal: Some(3),
            ..Default::default()
        };
        let mut server = BehaviorServer::new(behavior);
        assert_eq!(
            server.activate(3),
            Err(BehaviorError::InvalidGoal("rejected"))
        );
        assert_eq!(server.status(), BehaviorStatus::Idle);
    }

    #[test]
    fn test_activate_twice_rejected() {
        let mut server = BehaviorServer::new(MockBehavior::default());
        server.activate(1).unwrap();
        assert_eq!(
            server.activate(2),
            Err(BehaviorError::InvalidTransition {
                operation: "activate",
                status: BehaviorStatus::Active,
            })
        );
        assert_eq!(server.behavior().goal, Some(1));
    }

    #[test]
    fn test_modify_requires_goal() {
        let mut server = BehaviorServer::new(MockBehavior::default());
        assert!(matches!(
            server.modify(5),
            Err(BehaviorError::InvalidTransition { operation: "modify", .. })
        ));

        server.activate(1).unwrap();
        server.pause().unwrap();
        server.modify(5).unwrap();
        assert_eq!(server.status(), BehaviorStatus::Paused);
        assert_eq!(server.behavior().goal, Some(5));
    }

    #[test]
    fn test_pause_resume_cycle() {
        let mut server = BehaviorServer::new(MockBehavior::default());
        assert!(server.resume().is_err());
        assert!(server.pause().is_err());

        server.activate(1).unwrap();
        server.pause().unwrap();
        assert_eq!(server.status(), BehaviorStatus::Paused);
        // No ticks while paused
        assert!(server.tick().is_none());
        assert!(server.pause().is_err());

        server.resume().unwrap();
        assert_eq!(server.status(), BehaviorStatus::Active);
        assert!(server.tick().is_some());
    }

    #[test]
    fn test_deactivate_ends_with_aborted() {
        let mut server = BehaviorServer::new(MockBehavior::default());
        assert!(server.deactivate().is_err());

        server.activate(1).unwrap();
        server.pause().unwrap();
        server.deactivate().unwrap();

        assert_eq!(server.status(), BehaviorStatus::Idle);
        assert_eq!(server.behavior().goal, None);
        assert_eq!(server.behavior().ended_with, Some(ExecutionStatus::Aborted));
    }

    #[test]
    fn test_failure_tick_returns_to_idle() {
        let behavior = MockBehavior::default().with_runs(&[
            ExecutionStatus::Running,
            ExecutionStatus::Failure,
        ]);
        let mut server = BehaviorServer::new(behavior);
        server.activate(1).unwrap();

        assert_eq!(server.tick().unwrap().status, ExecutionStatus::Running);
        let report = server.tick().unwrap();
        assert_eq!(report.status, ExecutionStatus::Failure);
        assert!(!report.result);
        assert_eq!(server.status(), BehaviorStatus::Idle);
        assert_eq!(server.behavior().ended_with, Some(ExecutionStatus::Failure));
        assert!(server.tick().is_none());
    }

    #[test]
    fn test_reactivation_resets_tick_count() {
        let behavior = MockBehavior::default().with_runs(&[ExecutionStatus::Success]);
        let mut server = BehaviorServer::new(behavior);
        server.activate(1).unwrap();
        server.tick();
        assert_eq!(server.status(), BehaviorStatus::Idle);

        server.activate(2).unwrap();
        assert_eq!(server.tick_count(), 0);
    }

    #[test]
    fn test_feeds_forwarded_in_any_status() {
        let mut server = BehaviorServer::new(MockBehavior::default());
        server.on_state_update(StampedTwist::default());
        server.on_platform_update(PlatformState::Flying);
        assert_eq!(server.behavior().twists, 1);
        assert_eq!(server.behavior().platform, PlatformState::Flying);
    }
}
