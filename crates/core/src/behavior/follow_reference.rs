//! Follow-reference behavior
//!
//! Flies towards a target point that the orchestrator may move at any time.
//! Every tick sends one position command with yaw; the run only ends on
//! deactivation or when a command cannot be delivered.
//!
//! The derived vehicle pose is resolved into the goal frame and the velocity
//! into the world frame. Resolution failures while running are logged and
//! the last feedback is kept.

use alloc::string::String;

use super::{Behavior, ExecutionStatus};
use crate::command::{MotionCommandSink, PositionCommand};
use crate::error::BehaviorError;
use crate::frames::{FrameError, FrameTransformResolver, TransformLookup};
use crate::geometry::{StampedPose, StampedTwist};
use crate::goal::{FollowReferenceFeedback, FollowReferenceGoal, FollowReferenceResult};
use crate::parameters::{FollowReferenceParams, FrameNames};
use crate::state::{PlatformState, VehicleState};
use crate::validator::GoalValidator;

/// Follow-reference behavior
pub struct FollowReferenceBehavior<L, S> {
    resolver: FrameTransformResolver<L>,
    sink: S,
    validator: GoalValidator,
    frames: FrameNames,
    body_frame: String,
    state: VehicleState,
    /// `None` exactly while no goal is held
    goal: Option<FollowReferenceGoal>,
    feedback: FollowReferenceFeedback,
    result: FollowReferenceResult,
}

impl<L: TransformLookup, S: MotionCommandSink> FollowReferenceBehavior<L, S> {
    /// Create the behavior from loaded parameters
    pub fn new(params: &FollowReferenceParams, lookup: L, sink: S) -> Self {
        Self {
            resolver: FrameTransformResolver::new(lookup, params.tf_timeout),
            sink,
            validator: GoalValidator::new(params.default_max_speed, params.frames.world.clone()),
            frames: params.frames.clone(),
            body_frame: params.frames.body_frame(),
            state: VehicleState::new(),
            goal: None,
            feedback: FollowReferenceFeedback::default(),
            result: FollowReferenceResult::default(),
        }
    }

    /// Committed goal
    pub fn goal(&self) -> Option<&FollowReferenceGoal> {
        self.goal.as_ref()
    }

    /// Vehicle state as last refreshed
    pub fn state(&self) -> &VehicleState {
        &self.state
    }

    /// Command sink
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Command sink (mutable)
    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Frame resolver
    pub fn resolver(&self) -> &FrameTransformResolver<L> {
        &self.resolver
    }

    /// Frame resolver (mutable)
    pub fn resolver_mut(&mut self) -> &mut FrameTransformResolver<L> {
        &mut self.resolver
    }

    /// Resolve the vehicle state against `goal` without committing anything
    fn resolve_against(
        &self,
        goal: &FollowReferenceGoal,
    ) -> Result<(StampedPose, StampedTwist, FollowReferenceFeedback), FrameError> {
        let (pose, twist) = self.state.resolve(
            &self.resolver,
            &self.frames.world,
            &goal.target.frame_id,
            &self.body_frame,
        )?;
        let feedback = FollowReferenceFeedback {
            actual_speed: twist.speed(),
            actual_distance_to_goal: (pose.position() - goal.target.point).norm(),
        };
        Ok((pose, twist, feedback))
    }

    /// Refresh pose and feedback for the committed goal, keeping stale values on failure
    fn refresh(&mut self) {
        let Some(goal) = self.goal.as_ref() else {
            return;
        };
        match self.resolve_against(goal) {
            Ok((pose, twist, feedback)) => {
                self.state.apply((pose, twist));
                self.feedback = feedback;
            }
            Err(e) => log::warn!("Could not get transform: {}", e),
        }
    }

    /// Validate, resolve and compute yaw for a candidate, committing only on success
    fn accept(
        &mut self,
        candidate: FollowReferenceGoal,
        check_preconditions: bool,
    ) -> Result<(), BehaviorError> {
        let mut goal = self.validator.validate_and_normalize(candidate, &self.resolver)?;

        let resolved = match self.resolve_against(&goal) {
            Ok(resolved) => Some(resolved),
            Err(e) => {
                log::warn!("Could not get transform: {}", e);
                None
            }
        };

        if check_preconditions {
            self.validator.check_preconditions(&self.state)?;
        }

        let (actual, current_yaw) = match &resolved {
            Some((pose, _, _)) => (pose.position(), pose.yaw()),
            None => (self.state.actual_pose().position(), self.state.current_yaw()),
        };
        goal.yaw.resolve(&goal.target.point, &actual, current_yaw)?;

        if let Some((pose, twist, feedback)) = resolved {
            self.state.apply((pose, twist));
            self.feedback = feedback;
        }
        self.goal = Some(goal);
        Ok(())
    }

    fn send_hover(&mut self) {
        if !self.sink.send_hover() {
            log::warn!("FollowReference: error sending hover command");
        }
    }
}

impl<L: TransformLookup, S: MotionCommandSink> Behavior for FollowReferenceBehavior<L, S> {
    type Goal = FollowReferenceGoal;
    type Feedback = FollowReferenceFeedback;
    type Result = FollowReferenceResult;

    fn name(&self) -> &'static str {
        "follow_reference"
    }

    fn on_activate(&mut self, goal: FollowReferenceGoal) -> Result<(), BehaviorError> {
        self.accept(goal, true)?;
        self.result = FollowReferenceResult::default();
        Ok(())
    }

    fn on_modify(&mut self, goal: FollowReferenceGoal) -> Result<(), BehaviorError> {
        self.accept(goal, false)
    }

    fn on_pause(&mut self) -> Result<(), BehaviorError> {
        log::info!("FollowReference Paused");
        self.send_hover();
        Ok(())
    }

    fn on_resume(&mut self) -> Result<(), BehaviorError> {
        log::info!("FollowReference Resumed");
        Ok(())
    }

    fn on_deactivate(&mut self) -> Result<(), BehaviorError> {
        log::info!("FollowReference Stopped");
        self.goal = None;
        self.send_hover();
        Ok(())
    }

    fn on_run(&mut self) -> ExecutionStatus {
        self.refresh();

        let Some(goal) = self.goal.as_ref() else {
            log::error!("FollowReference: run without a goal");
            self.result.follow_reference_success = false;
            return ExecutionStatus::Failure;
        };

        let command = PositionCommand {
            frame_id: goal.target.frame_id.clone(),
            position: goal.target.point,
            yaw: goal.yaw.angle,
            speed_frame: self.frames.world.clone(),
            max_speed: goal.max_speed,
        };

        if !self.sink.send_position_with_yaw(&command) {
            log::error!("FollowReference: {}", BehaviorError::CommandSendFailed);
            self.result.follow_reference_success = false;
            return ExecutionStatus::Failure;
        }

        self.result.follow_reference_success = true;
        ExecutionStatus::Running
    }

    fn on_state_update(&mut self, twist: StampedTwist) {
        self.state.update_twist(twist);
        if self.goal.is_none() {
            return;
        }

        self.refresh();
        let actual = self.state.actual_pose().position();
        let current_yaw = self.state.current_yaw();
        if let Some(goal) = self.goal.as_mut() {
            if let Err(e) = goal.yaw.resolve(&goal.target.point, &actual, current_yaw) {
                log::warn!("Keeping previous yaw: {}", e);
            }
        }
    }

    fn on_platform_update(&mut self, state: PlatformState) {
        self.state.update_platform(state);
    }

    fn feedback(&self) -> FollowReferenceFeedback {
        self.feedback
    }

    fn result(&self) -> FollowReferenceResult {
        self.result
    }
}
