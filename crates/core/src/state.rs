//! Vehicle state
//!
//! Holds what the behavior knows about the vehicle. Two independent feeds
//! write it (velocity readings and platform status); the derived pose is
//! refreshed on demand by resolving frames and is stale in between.

use core::fmt;

use crate::frames::{FrameError, FrameTransformResolver, TransformLookup};
use crate::geometry::{StampedPose, StampedTwist};

/// Flight status reported by the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(i8)]
pub enum PlatformState {
    /// Emergency stop engaged
    Emergency = -1,
    /// Motors disarmed
    #[default]
    Disarmed = 0,
    /// Armed, on the ground
    Landed = 1,
    /// Climbing to takeoff height
    TakingOff = 2,
    /// Airborne and accepting motion references
    Flying = 3,
    /// Descending to land
    Landing = 4,
}

impl fmt::Display for PlatformState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Emergency => "EMERGENCY",
            Self::Disarmed => "DISARMED",
            Self::Landed => "LANDED",
            Self::TakingOff => "TAKING_OFF",
            Self::Flying => "FLYING",
            Self::Landing => "LANDING",
        };
        f.write_str(name)
    }
}

/// State record shared between the feeds and the run loop
#[derive(Debug, Clone, Default)]
pub struct VehicleState {
    /// Latest velocity reading, as delivered
    actual_twist: StampedTwist,
    /// Derived body pose (stale between refreshes)
    actual_pose: StampedPose,
    /// Latest reading resolved into the world frame
    resolved_twist: StampedTwist,
    platform_state: PlatformState,
    /// Monotonic: set on first velocity reading, never cleared
    localization: bool,
}

impl VehicleState {
    /// Create an empty state (no localization, platform disarmed)
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a velocity reading and mark localization available
    pub fn update_twist(&mut self, twist: StampedTwist) {
        self.actual_twist = twist;
        self.localization = true;
    }

    /// Store a platform status report
    pub fn update_platform(&mut self, state: PlatformState) {
        self.platform_state = state;
    }

    /// Resolve the latest reading into `pose_frame` / `twist_frame`
    ///
    /// Does not modify `self`; see [`VehicleState::apply`].
    pub fn resolve<L: TransformLookup>(
        &self,
        resolver: &FrameTransformResolver<L>,
        twist_frame: &str,
        pose_frame: &str,
        body_frame: &str,
    ) -> Result<(StampedPose, StampedTwist), FrameError> {
        resolver.resolve_state(&self.actual_twist, twist_frame, pose_frame, body_frame)
    }

    /// Commit a resolved pose and velocity
    pub fn apply(&mut self, resolved: (StampedPose, StampedTwist)) {
        let (pose, twist) = resolved;
        self.actual_pose = pose;
        self.resolved_twist = twist;
    }

    /// Last derived body pose
    pub fn actual_pose(&self) -> &StampedPose {
        &self.actual_pose
    }

    /// Last resolved velocity
    pub fn resolved_twist(&self) -> &StampedTwist {
        &self.resolved_twist
    }

    /// Yaw of the last derived pose
    pub fn current_yaw(&self) -> f64 {
        self.actual_pose.yaw()
    }

    /// Last reported platform state
    pub fn platform_state(&self) -> PlatformState {
        self.platform_state
    }

    /// True once any velocity reading has arrived
    pub fn has_localization(&self) -> bool {
        self.localization
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frames::FrameTree;
    use core::time::Duration;
    use nalgebra::{Isometry3, Translation3, UnitQuaternion, Vector3};

    #[test]
    fn test_platform_state_wire_values() {
        assert_eq!(PlatformState::Emergency as i8, -1);
        assert_eq!(PlatformState::default() as i8, 0);
        assert_eq!(PlatformState::Flying as i8, 3);
        assert_eq!(PlatformState::Landing as i8, 4);
    }

    #[test]
    fn test_localization_is_monotonic() {
        let mut state = VehicleState::new();
        assert!(!state.has_localization());

        state.update_twist(StampedTwist::new("earth", Vector3::new(1.0, 0.0, 0.0)));
        assert!(state.has_localization());

        // Platform reports and further readings never clear it
        state.update_platform(PlatformState::Landing);
        state.update_twist(StampedTwist::default());
        assert!(state.has_localization());
    }

    #[test]
    fn test_resolve_then_apply() {
        let mut tree = FrameTree::new();
        tree.set_transform(
            "earth",
            "base_link",
            Isometry3::from_parts(Translation3::new(0.0, 0.0, 4.0), UnitQuaternion::identity()),
        )
        .unwrap();
        let resolver = FrameTransformResolver::new(tree, Duration::ZERO);

        let mut state = VehicleState::new();
        state.update_twist(StampedTwist::new("earth", Vector3::new(0.0, 0.0, 1.0)));

        let resolved = state
            .resolve(&resolver, "earth", "earth", "base_link")
            .unwrap();
        // Nothing changes until apply
        assert!(state.actual_pose().frame_id.is_empty());

        state.apply(resolved);
        assert_eq!(state.actual_pose().frame_id, "earth");
        assert!((state.actual_pose().position().z - 4.0).abs() < 1e-9);
        assert!((state.resolved_twist().speed() - 1.0).abs() < 1e-9);
    }
}
