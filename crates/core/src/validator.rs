//! Goal validation
//!
//! Checks a candidate follow-reference goal and fills in defaulted fields.
//! Two separate entry points:
//!
//! - [`GoalValidator::validate_and_normalize`] runs on activation and modification
//! - [`GoalValidator::check_preconditions`] runs on activation only; a
//!   modification trusts that the preconditions already held

use alloc::string::String;

use crate::error::BehaviorError;
use crate::frames::{FrameTransformResolver, TransformLookup};
use crate::goal::{FollowReferenceGoal, MaxSpeed};
use crate::state::{PlatformState, VehicleState};

/// Follow-reference goal validator
#[derive(Debug, Clone)]
pub struct GoalValidator {
    /// Per-axis limits used when the client sends 0.0
    default_max_speed: MaxSpeed,
    /// Frame the target must be resolvable into
    working_frame: String,
}

impl GoalValidator {
    /// Create a validator
    pub fn new(default_max_speed: MaxSpeed, working_frame: impl Into<String>) -> Self {
        Self {
            default_max_speed,
            working_frame: working_frame.into(),
        }
    }

    /// Configured default speed limits
    pub fn default_max_speed(&self) -> &MaxSpeed {
        &self.default_max_speed
    }

    /// Reject malformed goals and normalize speed limits
    ///
    /// # Errors
    ///
    /// - `InvalidGoal` if the target frame id is empty
    /// - `FrameResolutionFailed` if the target cannot be placed into the
    ///   working frame within the resolver timeout
    pub fn validate_and_normalize<L: TransformLookup>(
        &self,
        candidate: FollowReferenceGoal,
        resolver: &FrameTransformResolver<L>,
    ) -> Result<FollowReferenceGoal, BehaviorError> {
        if candidate.target.frame_id.is_empty() {
            log::error!("Target pose frame_id is empty");
            return Err(BehaviorError::InvalidGoal("target frame id is empty"));
        }

        if let Err(e) = resolver.convert_point(&candidate.target, &self.working_frame) {
            log::error!(
                "Can not get target position in the desired frame '{}': {}",
                self.working_frame,
                e
            );
            return Err(e.into());
        }

        let max_speed = candidate.max_speed.or_defaults(&self.default_max_speed);
        Ok(FollowReferenceGoal {
            max_speed,
            ..candidate
        })
    }

    /// Acceptance-time checks on the vehicle state
    ///
    /// # Errors
    ///
    /// - `PlatformNotFlying` if the platform is not flying
    /// - `NoLocalization` if no velocity reading has arrived yet
    pub fn check_preconditions(&self, state: &VehicleState) -> Result<(), BehaviorError> {
        if state.platform_state() != PlatformState::Flying {
            log::error!("Behavior reject, platform is not flying");
            return Err(BehaviorError::PlatformNotFlying(state.platform_state()));
        }

        if !state.has_localization() {
            log::error!("Behavior reject, there is no localization");
            return Err(BehaviorError::NoLocalization);
        }

        Ok(())
    }
}
