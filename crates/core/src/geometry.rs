//! Stamped geometry types
//!
//! Points, poses and velocity readings tagged with the name of the frame they
//! are expressed in, plus the planar angle helpers used by yaw computation.
//!
//! # Coordinate System
//!
//! - Frames are right-handed, z up (ENU style world frame, FLU body frame)
//! - Yaw is the rotation about +z in radians, 0 = facing +x
//! - Angles returned by helpers lie in (-pi, pi]

use alloc::string::String;
use libm::atan2;
use nalgebra::{Isometry3, Point3, UnitQuaternion, Vector3};

/// A 3D point tagged with its frame
#[derive(Debug, Clone, PartialEq)]
pub struct StampedPoint {
    /// Frame the point is expressed in (empty = unset)
    pub frame_id: String,
    /// Position in meters
    pub point: Point3<f64>,
}

impl StampedPoint {
    /// Create a new stamped point
    pub fn new(frame_id: impl Into<String>, x: f64, y: f64, z: f64) -> Self {
        Self {
            frame_id: frame_id.into(),
            point: Point3::new(x, y, z),
        }
    }
}

impl Default for StampedPoint {
    fn default() -> Self {
        Self {
            frame_id: String::new(),
            point: Point3::origin(),
        }
    }
}

/// A rigid pose tagged with its frame
#[derive(Debug, Clone, PartialEq)]
pub struct StampedPose {
    /// Frame the pose is expressed in
    pub frame_id: String,
    /// Position and orientation
    pub pose: Isometry3<f64>,
}

impl StampedPose {
    /// Create a stamped pose from position and yaw
    pub fn from_position_yaw(frame_id: impl Into<String>, position: Point3<f64>, yaw: f64) -> Self {
        Self {
            frame_id: frame_id.into(),
            pose: Isometry3::from_parts(
                position.coords.into(),
                UnitQuaternion::from_euler_angles(0.0, 0.0, yaw),
            ),
        }
    }

    /// Position component
    pub fn position(&self) -> Point3<f64> {
        Point3::from(self.pose.translation.vector)
    }

    /// Yaw extracted from the orientation
    pub fn yaw(&self) -> f64 {
        yaw_from_quaternion(&self.pose.rotation)
    }
}

impl Default for StampedPose {
    fn default() -> Self {
        Self {
            frame_id: String::new(),
            pose: Isometry3::identity(),
        }
    }
}

/// A velocity reading tagged with its frame
#[derive(Debug, Clone, PartialEq)]
pub struct StampedTwist {
    /// Frame the velocity is expressed in
    pub frame_id: String,
    /// Linear velocity (m/s)
    pub linear: Vector3<f64>,
    /// Angular velocity (rad/s)
    pub angular: Vector3<f64>,
}

impl StampedTwist {
    /// Create a twist with linear velocity only
    pub fn new(frame_id: impl Into<String>, linear: Vector3<f64>) -> Self {
        Self {
            frame_id: frame_id.into(),
            linear,
            angular: Vector3::zeros(),
        }
    }

    /// Linear speed (norm of the linear velocity)
    pub fn speed(&self) -> f64 {
        self.linear.norm()
    }
}

impl Default for StampedTwist {
    fn default() -> Self {
        Self::new(String::new(), Vector3::zeros())
    }
}

/// Extract yaw (rotation about z, ZYX convention) from an orientation
pub fn yaw_from_quaternion(q: &UnitQuaternion<f64>) -> f64 {
    let (_roll, _pitch, yaw) = q.euler_angles();
    yaw
}

/// Angle of a planar vector measured from +x
pub fn vector_2d_angle(x: f64, y: f64) -> f64 {
    atan2(y, x)
}
