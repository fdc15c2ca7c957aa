//! Follow-reference goal, feedback and result records

use crate::geometry::StampedPoint;
use crate::yaw::YawSpec;

/// Per-axis speed limits (m/s)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MaxSpeed {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl MaxSpeed {
    /// Create per-axis limits
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Same limit on every axis
    pub fn uniform(speed: f64) -> Self {
        Self::new(speed, speed, speed)
    }

    /// Replace each axis equal to exactly `0.0` with the matching default
    ///
    /// Zero means "unset" on the wire, so a client cannot request a zero
    /// limit on an axis.
    pub fn or_defaults(self, defaults: &MaxSpeed) -> MaxSpeed {
        let pick = |value: f64, default: f64| if value != 0.0 { value } else { default };
        MaxSpeed {
            x: pick(self.x, defaults.x),
            y: pick(self.y, defaults.y),
            z: pick(self.z, defaults.z),
        }
    }
}

/// Follow-reference goal
#[derive(Debug, Clone, PartialEq)]
pub struct FollowReferenceGoal {
    /// Target position; frame must be non-empty
    pub target: StampedPoint,
    pub yaw: YawSpec,
    /// Per-axis limits; zero axes take configured defaults
    pub max_speed: MaxSpeed,
}

impl FollowReferenceGoal {
    /// Create a goal with unset (default) speed limits
    pub fn new(target: StampedPoint, yaw: YawSpec) -> Self {
        Self {
            target,
            yaw,
            max_speed: MaxSpeed::default(),
        }
    }

    /// Set per-axis speed limits
    pub fn with_max_speed(mut self, max_speed: MaxSpeed) -> Self {
        self.max_speed = max_speed;
        self
    }
}

/// Follow-reference feedback snapshot
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FollowReferenceFeedback {
    /// Norm of the resolved velocity (m/s)
    pub actual_speed: f64,
    /// Distance between vehicle and target (m)
    pub actual_distance_to_goal: f64,
}

/// Follow-reference result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FollowReferenceResult {
    pub follow_reference_success: bool,
}
