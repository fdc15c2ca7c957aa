//! Yaw modes and yaw computation
//!
//! Pure functions selecting the commanded heading from the goal's yaw mode
//! and the current geometry. Recomputed at activation, modification and on
//! every velocity reading, since path-facing and keep-yaw follow the vehicle.

use core::f64::consts::PI;
use core::fmt;

use libm::hypot;
use nalgebra::Point3;

use crate::error::BehaviorError;
use crate::geometry::vector_2d_angle;

/// Minimum planar distance (m) for a path-facing heading to be defined
///
/// Closer targets (directly above/below) fall back to the current yaw.
/// A distance of exactly this value still uses the bearing.
pub const PATH_FACING_MIN_DISTANCE: f64 = 0.1;

/// Strategy selecting how the commanded yaw is derived
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum YawMode {
    /// Hold the vehicle's current heading
    KeepYaw = 0,
    /// Face along the path towards the target
    PathFacing = 1,
    /// Use the angle supplied with the goal
    FixedYaw = 2,
    /// Heading streamed from an external source (not supported)
    YawFromTopic = 3,
    /// Face back towards the origin of the goal frame
    YawToFrame = 4,
}

impl TryFrom<u8> for YawMode {
    type Error = BehaviorError;

    fn try_from(raw: u8) -> Result<Self, Self::Error> {
        match raw {
            0 => Ok(Self::KeepYaw),
            1 => Ok(Self::PathFacing),
            2 => Ok(Self::FixedYaw),
            3 => Ok(Self::YawFromTopic),
            4 => Ok(Self::YawToFrame),
            other => Err(BehaviorError::UnsupportedYawMode(other)),
        }
    }
}

impl fmt::Display for YawMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::KeepYaw => "KEEP_YAW",
            Self::PathFacing => "PATH_FACING",
            Self::FixedYaw => "FIXED_YAW",
            Self::YawFromTopic => "YAW_FROM_TOPIC",
            Self::YawToFrame => "YAW_TO_FRAME",
        };
        f.write_str(name)
    }
}

/// Yaw part of a goal: mode plus output angle (radians)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct YawSpec {
    pub mode: YawMode,
    /// Requested angle for `FixedYaw`; overwritten by [`YawSpec::resolve`] otherwise
    pub angle: f64,
}

impl YawSpec {
    /// Create a yaw spec with angle 0
    pub fn new(mode: YawMode) -> Self {
        Self { mode, angle: 0.0 }
    }

    /// Create a fixed-yaw spec
    pub fn fixed(angle: f64) -> Self {
        Self {
            mode: YawMode::FixedYaw,
            angle,
        }
    }

    /// Recompute `angle` in place
    ///
    /// On error `angle` is left untouched.
    pub fn resolve(
        &mut self,
        target: &Point3<f64>,
        actual: &Point3<f64>,
        current_yaw: f64,
    ) -> Result<(), BehaviorError> {
        self.angle = compute_yaw(self.mode, target, actual, current_yaw, self.angle)?;
        Ok(())
    }
}

/// Compute the commanded yaw
///
/// # Arguments
///
/// * `mode` - Yaw strategy
/// * `target` - Target position
/// * `actual` - Current vehicle position (same frame as `target`)
/// * `current_yaw` - Current vehicle yaw (radians)
/// * `requested` - Caller-supplied angle, used by `FixedYaw`
///
/// # Returns
///
/// Yaw in radians, or `UnsupportedYawMode` for `YawFromTopic`
pub fn compute_yaw(
    mode: YawMode,
    target: &Point3<f64>,
    actual: &Point3<f64>,
    current_yaw: f64,
    requested: f64,
) -> Result<f64, BehaviorError> {
    match mode {
        YawMode::PathFacing => {
            let dx = target.x - actual.x;
            let dy = target.y - actual.y;
            if hypot(dx, dy) < PATH_FACING_MIN_DISTANCE {
                log::warn!(
                    "Goal is too close to the current position in the plane, keeping current yaw"
                );
                Ok(current_yaw)
            } else {
                Ok(vector_2d_angle(dx, dy))
            }
        }
        YawMode::YawToFrame => {
            let bearing = vector_2d_angle(actual.x, actual.y);
            Ok(if bearing > 0.0 {
                bearing - PI
            } else {
                bearing + PI
            })
        }
        YawMode::FixedYaw => Ok(requested),
        YawMode::KeepYaw => Ok(current_yaw),
        YawMode::YawFromTopic => {
            log::error!("Yaw mode {} not supported", mode);
            Err(BehaviorError::UnsupportedYawMode(mode as u8))
        }
    }
}
