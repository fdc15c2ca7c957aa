//! Behavior Runner
//!
//! Drives one [`BehaviorServer`] from a fixed-frequency tokio timer and
//! exposes the orchestrator surface.
//!
//! ## Responsibilities
//!
//! - Serialize ticks, state feeds and lifecycle requests through one lock
//! - Publish the feedback snapshot of every tick on a `watch` channel
//! - Report each finished run exactly once on an `mpsc` channel, in the
//!   order the lifecycle reached it
//!
//! Ticks run on tokio's blocking pool because frame lookups may wait up to
//! the configured timeout.

use std::sync::Arc;
use std::time::Duration;

use aerial_behaviors_core::behavior::{
    Behavior, BehaviorServer, BehaviorStatus, ExecutionStatus, TickReport,
};
use aerial_behaviors_core::error::BehaviorError;
use aerial_behaviors_core::geometry::StampedTwist;
use aerial_behaviors_core::state::PlatformState;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::sync::{MutexState, SharedState};

/// Event emitted when a run ends
#[derive(Debug, Clone, PartialEq)]
pub enum RunnerEvent<R> {
    /// Terminal status with the final result
    Finished { status: ExecutionStatus, result: R },
}

/// Handle driving one behavior instance, cheap to clone
pub struct BehaviorRunner<B: Behavior> {
    server: MutexState<BehaviorServer<B>>,
    feedback_tx: Arc<watch::Sender<Option<B::Feedback>>>,
    events_tx: mpsc::UnboundedSender<RunnerEvent<B::Result>>,
}

impl<B: Behavior> Clone for BehaviorRunner<B> {
    fn clone(&self) -> Self {
        Self {
            server: self.server.clone(),
            feedback_tx: Arc::clone(&self.feedback_tx),
            events_tx: self.events_tx.clone(),
        }
    }
}

impl<B: Behavior> BehaviorRunner<B> {
    /// Create a runner and the receiver for its terminal events
    pub fn new(behavior: B) -> (Self, mpsc::UnboundedReceiver<RunnerEvent<B::Result>>) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (feedback_tx, _) = watch::channel(None);
        let runner = Self {
            server: MutexState::new(BehaviorServer::new(behavior)),
            feedback_tx: Arc::new(feedback_tx),
            events_tx,
        };
        (runner, events_rx)
    }

    /// Subscribe to feedback snapshots (`None` until the first tick)
    pub fn feedback(&self) -> watch::Receiver<Option<B::Feedback>> {
        self.feedback_tx.subscribe()
    }

    /// Current lifecycle status
    pub fn status(&self) -> BehaviorStatus {
        self.server.with(|server| server.status())
    }

    /// Run `f` with the behavior locked
    pub fn with_behavior<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&B) -> R,
    {
        self.server.with(|server| f(server.behavior()))
    }

    /// Accept a new goal
    pub fn activate(&self, goal: B::Goal) -> Result<(), BehaviorError> {
        self.server.with_mut(|server| server.activate(goal))
    }

    /// Replace the current goal
    pub fn modify(&self, goal: B::Goal) -> Result<(), BehaviorError> {
        self.server.with_mut(|server| server.modify(goal))
    }

    /// Pause the current goal
    pub fn pause(&self) -> Result<(), BehaviorError> {
        self.server.with_mut(|server| server.pause())
    }

    /// Resume the paused goal
    pub fn resume(&self) -> Result<(), BehaviorError> {
        self.server.with_mut(|server| server.resume())
    }

    /// Cancel the current goal
    ///
    /// Emits [`RunnerEvent::Finished`] with [`ExecutionStatus::Aborted`].
    pub fn deactivate(&self) -> Result<(), BehaviorError> {
        self.server.with_mut(|server| {
            server.deactivate()?;
            // Emitted under the lock so a concurrent tick cannot report first
            self.emit(RunnerEvent::Finished {
                status: ExecutionStatus::Aborted,
                result: server.behavior().result(),
            });
            Ok(())
        })
    }

    /// Forward a velocity reading
    pub fn on_state_update(&self, twist: StampedTwist) {
        self.server.with_mut(|server| server.on_state_update(twist));
    }

    /// Forward a platform status report
    pub fn on_platform_update(&self, state: PlatformState) {
        self.server.with_mut(|server| server.on_platform_update(state));
    }

    /// Run one tick now and publish its outputs
    ///
    /// May block for up to the behavior's frame lookup timeout.
    pub fn tick_once(&self) -> Option<TickReport<B::Feedback, B::Result>> {
        self.server.with_mut(|server| {
            let report = server.tick()?;
            self.feedback_tx
                .send_replace(Some(report.feedback.clone()));
            if report.is_terminal() {
                self.emit(RunnerEvent::Finished {
                    status: report.status,
                    result: report.result.clone(),
                });
            }
            Some(report)
        })
    }

    fn emit(&self, event: RunnerEvent<B::Result>) {
        if self.events_tx.send(event).is_err() {
            log::debug!("Runner event dropped, no listener");
        }
    }
}

impl<B> BehaviorRunner<B>
where
    B: Behavior + Send + 'static,
    B::Goal: Send,
    B::Feedback: Send + Sync + 'static,
    B::Result: Send + 'static,
{
    /// Tick on a fixed period until the event receiver is dropped
    ///
    /// Abort the returned handle to stop earlier.
    pub fn spawn(&self, period: Duration) -> JoinHandle<()> {
        let runner = self.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            log::info!("Behavior runner started ({:?} period)", period);

            while !runner.events_tx.is_closed() {
                interval.tick().await;
                let tick_runner = runner.clone();
                if let Err(e) = tokio::task::spawn_blocking(move || {
                    tick_runner.tick_once();
                })
                .await
                {
                    log::error!("Tick task failed: {}", e);
                    break;
                }
            }

            log::info!("Behavior runner stopped");
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aerial_behaviors_core::command::MockCommandSink;
    use aerial_behaviors_core::frames::FrameTree;
    use aerial_behaviors_core::geometry::StampedPoint;
    use aerial_behaviors_core::goal::{FollowReferenceGoal, MaxSpeed};
    use aerial_behaviors_core::parameters::{FollowReferenceParams, FrameNames};
    use aerial_behaviors_core::yaw::{YawMode, YawSpec};
    use aerial_behaviors_core::FollowReferenceBehavior;
    use nalgebra::{Isometry3, Vector3};

    type Runner = BehaviorRunner<FollowReferenceBehavior<FrameTree, MockCommandSink>>;

    fn runner() -> (Runner, mpsc::UnboundedReceiver<RunnerEvent<aerial_behaviors_core::FollowReferenceResult>>) {
        let mut tree = FrameTree::new();
        tree.set_transform("earth", "map", Isometry3::identity())
            .unwrap();
        tree.set_transform("earth", "drone0/base_link", Isometry3::identity())
            .unwrap();
        let params = FollowReferenceParams {
            default_max_speed: MaxSpeed::uniform(1.0),
            tf_timeout: Duration::ZERO,
            frames: FrameNames::default(),
        };
        let (runner, events) = BehaviorRunner::new(FollowReferenceBehavior::new(
            &params,
            tree,
            MockCommandSink::new(),
        ));
        runner.on_platform_update(PlatformState::Flying);
        runner.on_state_update(StampedTwist::new("earth", Vector3::zeros()));
        (runner, events)
    }

    fn goal() -> FollowReferenceGoal {
        FollowReferenceGoal::new(
            StampedPoint::new("map", 2.0, 0.0, 1.0),
            YawSpec::new(YawMode::KeepYaw),
        )
    }

    #[test]
    fn test_tick_publishes_feedback() {
        let (runner, _events) = runner();
        let feedback = runner.feedback();
        assert!(feedback.borrow().is_none());

        runner.activate(goal()).unwrap();
        runner.tick_once().unwrap();

        let snapshot = (*feedback.borrow()).unwrap();
        assert!((snapshot.actual_distance_to_goal - 5.0_f64.sqrt()).abs() < 1e-9);
    }

    #[test]
    fn test_failure_emits_single_event() {
        let (runner, mut events) = runner();
        runner.activate(goal()).unwrap();
        runner.server.with_mut(|server| {
            server.behavior_mut().sink_mut().set_position_failure(true)
        });

        runner.tick_once().unwrap();
        assert!(runner.tick_once().is_none());

        assert_eq!(
            events.try_recv().unwrap(),
            RunnerEvent::Finished {
                status: ExecutionStatus::Failure,
                result: aerial_behaviors_core::FollowReferenceResult {
                    follow_reference_success: false,
                },
            }
        );
        assert!(events.try_recv().is_err());
        assert_eq!(runner.status(), BehaviorStatus::Idle);
    }

    #[test]
    fn test_deactivate_emits_aborted() {
        let (runner, mut events) = runner();
        runner.activate(goal()).unwrap();
        runner.tick_once();
        runner.deactivate().unwrap();

        assert!(matches!(
            events.try_recv(),
            Ok(RunnerEvent::Finished {
                status: ExecutionStatus::Aborted,
                ..
            })
        ));
        assert!(runner.deactivate().is_err());
        assert!(events.try_recv().is_err());
    }

    #[test]
    fn test_racing_deactivate_and_failure_report_once() {
        for _ in 0..50 {
            let (runner, mut events) = runner();
            runner.activate(goal()).unwrap();
            runner.server.with_mut(|server| {
                server.behavior_mut().sink_mut().set_position_failure(true)
            });

            let ticker = runner.clone();
            let tick = std::thread::spawn(move || ticker.tick_once());
            let deactivated = runner.deactivate();
            let report = tick.join().unwrap();

            // Whichever side won, the event matches the final lifecycle
            let event = events.try_recv().unwrap();
            assert!(events.try_recv().is_err());
            let RunnerEvent::Finished { status, .. } = event;
            match deactivated {
                Ok(()) => {
                    assert_eq!(status, ExecutionStatus::Aborted);
                    assert!(report.is_none());
                }
                Err(_) => {
                    assert_eq!(status, ExecutionStatus::Failure);
                    assert_eq!(report.unwrap().status, ExecutionStatus::Failure);
                }
            }
            assert_eq!(runner.status(), BehaviorStatus::Idle);
        }
    }

    #[tokio::test]
    async fn test_spawned_runner_ticks_until_receiver_dropped() {
        let (runner, events) = runner();
        runner.activate(goal()).unwrap();

        let handle = runner.spawn(Duration::from_millis(5));
        tokio::time::sleep(Duration::from_millis(60)).await;
        let sent = runner.with_behavior(|b| b.sink().position_commands.len());
        assert!(sent >= 2, "only {sent} commands sent");

        drop(events);
        tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .expect("runner did not stop")
            .unwrap();
    }
}
