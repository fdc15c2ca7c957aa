//! Takeoff behavior
//!
//! Climbs vertically from the current position to the requested height,
//! holding the heading it had at activation. Unlike follow-reference, the run
//! ends by itself once the height error drops below `TKOF_THRESHOLD`.

use alloc::string::String;
use nalgebra::Point3;

use super::{Behavior, ExecutionStatus};
use crate::command::{MotionCommandSink, PositionCommand};
use crate::error::BehaviorError;
use crate::frames::FrameTransformResolver;
use crate::frames::TransformLookup;
use crate::geometry::StampedTwist;
use crate::goal::MaxSpeed;
use crate::parameters::TakeoffParams;
use crate::state::{PlatformState, VehicleState};

/// Takeoff goal
///
/// Zero fields take the configured defaults.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TakeoffGoal {
    /// Height above the world frame origin (m)
    pub height: f64,
    /// Climb speed (m/s)
    pub speed: f64,
}

/// Takeoff feedback snapshot
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TakeoffFeedback {
    pub actual_takeoff_height: f64,
    pub actual_takeoff_speed: f64,
}

/// Takeoff result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TakeoffResult {
    pub takeoff_success: bool,
}

/// Committed takeoff target in the world frame
#[derive(Debug, Clone, Copy, PartialEq)]
struct TakeoffTarget {
    position: Point3<f64>,
    yaw: f64,
    speed: f64,
}

/// Takeoff behavior
pub struct TakeoffBehavior<L, S> {
    resolver: FrameTransformResolver<L>,
    sink: S,
    params: TakeoffParams,
    body_frame: String,
    state: VehicleState,
    target: Option<TakeoffTarget>,
    feedback: TakeoffFeedback,
    result: TakeoffResult,
}

impl<L: TransformLookup, S: MotionCommandSink> TakeoffBehavior<L, S> {
    /// Create the behavior from loaded parameters
    pub fn new(params: TakeoffParams, lookup: L, sink: S) -> Self {
        Self {
            resolver: FrameTransformResolver::new(lookup, params.tf_timeout),
            sink,
            body_frame: params.frames.body_frame(),
            params,
            state: VehicleState::new(),
            target: None,
            feedback: TakeoffFeedback::default(),
            result: TakeoffResult::default(),
        }
    }

    /// Target position, if a goal is held
    pub fn target_position(&self) -> Option<Point3<f64>> {
        self.target.map(|target| target.position)
    }

    /// Command sink
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Command sink (mutable)
    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Fill in defaults and reject impossible values
    fn normalize(&self, goal: TakeoffGoal) -> Result<TakeoffGoal, BehaviorError> {
        let height = if goal.height != 0.0 {
            goal.height
        } else {
            self.params.default_height
        };
        let speed = if goal.speed != 0.0 {
            goal.speed
        } else {
            self.params.default_speed
        };

        if !(height.is_finite() && height > 0.0) {
            log::error!("Takeoff height must be positive, got {}", height);
            return Err(BehaviorError::InvalidGoal("takeoff height must be positive"));
        }
        if !(speed.is_finite() && speed > 0.0) {
            log::error!("Takeoff speed must be positive, got {}", speed);
            return Err(BehaviorError::InvalidGoal("takeoff speed must be positive"));
        }
        Ok(TakeoffGoal { height, speed })
    }

    /// Refresh pose and feedback in the world frame; stale values kept on failure
    fn refresh(&mut self) {
        let world = &self.params.frames.world;
        match self
            .state
            .resolve(&self.resolver, world, world, &self.body_frame)
        {
            Ok(resolved) => {
                self.state.apply(resolved);
                self.feedback = TakeoffFeedback {
                    actual_takeoff_height: self.state.actual_pose().position().z,
                    actual_takeoff_speed: self.state.resolved_twist().speed(),
                };
            }
            Err(e) => log::warn!("Could not get transform: {}", e),
        }
    }

    fn send_hover(&mut self) {
        if !self.sink.send_hover() {
            log::warn!("Takeoff: error sending hover command");
        }
    }
}

impl<L: TransformLookup, S: MotionCommandSink> Behavior for TakeoffBehavior<L, S> {
    type Goal = TakeoffGoal;
    type Feedback = TakeoffFeedback;
    type Result = TakeoffResult;

    fn name(&self) -> &'static str {
        "takeoff"
    }

    fn on_activate(&mut self, goal: TakeoffGoal) -> Result<(), BehaviorError> {
        let goal = self.normalize(goal)?;

        let platform = self.state.platform_state();
        if !matches!(platform, PlatformState::Landed | PlatformState::TakingOff) {
            log::error!("Behavior reject, platform state {} does not allow takeoff", platform);
            return Err(BehaviorError::PlatformNotReady(platform));
        }
        if !self.state.has_localization() {
            log::error!("Behavior reject, there is no localization");
            return Err(BehaviorError::NoLocalization);
        }

        // Takeoff needs a real starting point, stale values are not accepted here
        let world = &self.params.frames.world;
        let (pose, twist) = self
            .state
            .resolve(&self.resolver, world, world, &self.body_frame)?;
        let start = pose.position();
        let target = TakeoffTarget {
            position: Point3::new(start.x, start.y, goal.height),
            yaw: pose.yaw(),
            speed: goal.speed,
        };

        self.state.apply((pose, twist));
        self.target = Some(target);
        self.result = TakeoffResult::default();
        log::info!(
            "Takeoff to {:.2} m at {:.2} m/s",
            goal.height,
            goal.speed
        );
        Ok(())
    }

    fn on_modify(&mut self, goal: TakeoffGoal) -> Result<(), BehaviorError> {
        let goal = self.normalize(goal)?;
        let Some(target) = self.target.as_mut() else {
            return Err(BehaviorError::InvalidGoal("no takeoff in progress"));
        };
        target.position.z = goal.height;
        target.speed = goal.speed;
        Ok(())
    }

    fn on_pause(&mut self) -> Result<(), BehaviorError> {
        log::info!("Takeoff Paused");
        self.send_hover();
        Ok(())
    }

    fn on_resume(&mut self) -> Result<(), BehaviorError> {
        log::info!("Takeoff Resumed");
        Ok(())
    }

    fn on_deactivate(&mut self) -> Result<(), BehaviorError> {
        log::info!("Takeoff Stopped");
        self.target = None;
        self.send_hover();
        Ok(())
    }

    fn on_run(&mut self) -> ExecutionStatus {
        self.refresh();

        let Some(target) = self.target else {
            log::error!("Takeoff: run without a goal");
            self.result.takeoff_success = false;
            return ExecutionStatus::Failure;
        };

        if (self.feedback.actual_takeoff_height - target.position.z).abs() < self.params.threshold {
            self.result.takeoff_success = true;
            return ExecutionStatus::Success;
        }

        let command = PositionCommand {
            frame_id: self.params.frames.world.clone(),
            position: target.position,
            yaw: target.yaw,
            speed_frame: self.params.frames.world.clone(),
            max_speed: MaxSpeed::uniform(target.speed),
        };
        if !self.sink.send_position_with_yaw(&command) {
            log::error!("Takeoff: {}", BehaviorError::CommandSendFailed);
            self.result.takeoff_success = false;
            return ExecutionStatus::Failure;
        }

        ExecutionStatus::Running
    }

    fn on_execution_end(&mut self, status: ExecutionStatus) {
        if status == ExecutionStatus::Success {
            self.send_hover();
        }
        self.target = None;
    }

    fn on_state_update(&mut self, twist: StampedTwist) {
        self.state.update_twist(twist);
    }

    fn on_platform_update(&mut self, state: PlatformState) {
        self.state.update_platform(state);
    }

    fn feedback(&self) -> TakeoffFeedback {
        self.feedback
    }

    fn result(&self) -> TakeoffResult {
        self.result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::behavior::{BehaviorServer, BehaviorStatus};
    use crate::command::MockCommandSink;
    use crate::frames::FrameTree;
    use crate::parameters::FrameNames;
    use approx::assert_abs_diff_eq;
    use core::time::Duration;
    use nalgebra::{Isometry3, Translation3, UnitQuaternion, Vector3};

    type Server = BehaviorServer<TakeoffBehavior<FrameTree, MockCommandSink>>;

    fn params() -> TakeoffParams {
        TakeoffParams {
            default_height: 2.0,
            default_speed: 0.5,
            threshold: 0.1,
            tf_timeout: Duration::from_millis(10),
            frames: FrameNames::default(),
        }
    }

    fn set_body(server: &mut Server, x: f64, y: f64, z: f64) {
        server
            .behavior_mut()
            .resolver
            .lookup_mut()
            .set_transform(
                "earth",
                "drone0/base_link",
                Isometry3::from_parts(
                    Translation3::new(x, y, z),
                    UnitQuaternion::from_euler_angles(0.0, 0.0, 0.5),
                ),
            )
            .unwrap();
    }

    fn landed_server() -> Server {
        let mut server = BehaviorServer::new(TakeoffBehavior::new(
            params(),
            FrameTree::new(),
            MockCommandSink::new(),
        ));
        set_body(&mut server, 1.0, -2.0, 0.0);
        server.on_platform_update(PlatformState::Landed);
        server.on_state_update(StampedTwist::new("earth", Vector3::zeros()));
        server
    }

    #[test]
    fn test_takeoff_uses_defaults_and_current_xy() {
        let mut server = landed_server();
        server.activate(TakeoffGoal::default()).unwrap();

        let target = server.behavior().target_position().unwrap();
        assert_abs_diff_eq!(target.x, 1.0);
        assert_abs_diff_eq!(target.y, -2.0);
        assert_abs_diff_eq!(target.z, 2.0);

        let report = server.tick().unwrap();
        assert_eq!(report.status, ExecutionStatus::Running);
        let command = server.behavior().sink().last_position().unwrap();
        assert_eq!(command.frame_id, "earth");
        assert_abs_diff_eq!(command.yaw, 0.5, epsilon = 1e-9);
        assert_eq!(command.max_speed, MaxSpeed::uniform(0.5));
    }

    #[test]
    fn test_takeoff_succeeds_within_threshold() {
        let mut server = landed_server();
        server
            .activate(TakeoffGoal {
                height: 1.5,
                speed: 1.0,
            })
            .unwrap();
        server.tick();

        set_body(&mut server, 1.0, -2.0, 1.45);
        let report = server.tick().unwrap();
        assert_eq!(report.status, ExecutionStatus::Success);
        assert!(report.result.takeoff_success);
        assert_abs_diff_eq!(report.feedback.actual_takeoff_height, 1.45, epsilon = 1e-9);
        assert_eq!(server.status(), BehaviorStatus::Idle);
        assert_eq!(server.behavior().sink().hover_count, 1);
        assert!(server.behavior().target_position().is_none());
    }

    #[test]
    fn test_takeoff_rejected_while_flying_or_disarmed() {
        let mut server = landed_server();
        server.on_platform_update(PlatformState::Flying);
        assert_eq!(
            server.activate(TakeoffGoal::default()),
            Err(BehaviorError::PlatformNotReady(PlatformState::Flying))
        );

        server.on_platform_update(PlatformState::Disarmed);
        assert_eq!(
            server.activate(TakeoffGoal::default()),
            Err(BehaviorError::PlatformNotReady(PlatformState::Disarmed))
        );
    }

    #[test]
    fn test_takeoff_rejects_negative_height() {
        let mut server = landed_server();
        assert_eq!(
            server.activate(TakeoffGoal {
                height: -1.0,
                speed: 0.0,
            }),
            Err(BehaviorError::InvalidGoal("takeoff height must be positive"))
        );
    }

    #[test]
    fn test_takeoff_requires_body_transform() {
        let mut server = BehaviorServer::new(TakeoffBehavior::new(
            params(),
            FrameTree::new(),
            MockCommandSink::new(),
        ));
        server.on_platform_update(PlatformState::Landed);
        server.on_state_update(StampedTwist::new("earth", Vector3::zeros()));

        assert!(matches!(
            server.activate(TakeoffGoal::default()),
            Err(BehaviorError::FrameResolutionFailed(_))
        ));
    }

    #[test]
    fn test_modify_changes_height_only() {
        let mut server = landed_server();
        server.activate(TakeoffGoal::default()).unwrap();
        server
            .modify(TakeoffGoal {
                height: 3.0,
                speed: 0.0,
            })
            .unwrap();
        let target = server.behavior().target_position().unwrap();
        assert_abs_diff_eq!(target.x, 1.0);
        assert_abs_diff_eq!(target.z, 3.0);
    }

    #[test]
    fn test_command_failure_fails_takeoff() {
        let mut server = landed_server();
        server.activate(TakeoffGoal::default()).unwrap();
        server.behavior_mut().sink_mut().set_position_failure(true);

        let report = server.tick().unwrap();
        assert_eq!(report.status, ExecutionStatus::Failure);
        assert!(!report.result.takeoff_success);
        // No hover on failure
        assert_eq!(server.behavior().sink().hover_count, 0);
    }
}
