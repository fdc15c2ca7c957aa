//! Timeout-bounded frame resolver

use alloc::string::ToString;
use core::time::Duration;
use nalgebra::Isometry3;

use super::{FrameError, TransformLookup};
use crate::geometry::{StampedPoint, StampedPose, StampedTwist};

/// Frame resolver used by behaviors
///
/// Bundles a [`TransformLookup`] with the lookup timeout configured for the
/// behavior, and provides the conversions the run loop needs.
#[derive(Debug, Clone)]
pub struct FrameTransformResolver<L> {
    lookup: L,
    timeout: Duration,
}

impl<L: TransformLookup> FrameTransformResolver<L> {
    /// Create a resolver with the given lookup timeout
    pub fn new(lookup: L, timeout: Duration) -> Self {
        Self { lookup, timeout }
    }

    /// Configured lookup timeout
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Underlying transform source
    pub fn lookup(&self) -> &L {
        &self.lookup
    }

    /// Underlying transform source (mutable)
    pub fn lookup_mut(&mut self) -> &mut L {
        &mut self.lookup
    }

    /// Transform mapping coordinates in `source` into `target`
    pub fn transform(&self, target: &str, source: &str) -> Result<Isometry3<f64>, FrameError> {
        if target.is_empty() || source.is_empty() {
            return Err(FrameError::EmptyFrameId);
        }
        self.lookup.lookup_transform(target, source, self.timeout)
    }

    /// Express a point in another frame
    pub fn convert_point(
        &self,
        point: &StampedPoint,
        to_frame: &str,
    ) -> Result<StampedPoint, FrameError> {
        let transform = self.transform(to_frame, &point.frame_id)?;
        Ok(StampedPoint {
            frame_id: to_frame.to_string(),
            point: transform * point.point,
        })
    }

    /// Resolve the vehicle state from a velocity reading
    ///
    /// Returns the pose of `body_frame` expressed in `pose_frame` and the
    /// reading rotated into `twist_frame`. Velocities are free vectors, so
    /// only the rotation part of the transform applies to them.
    pub fn resolve_state(
        &self,
        twist: &StampedTwist,
        twist_frame: &str,
        pose_frame: &str,
        body_frame: &str,
    ) -> Result<(StampedPose, StampedTwist), FrameError> {
        let body_in_pose_frame = self.transform(pose_frame, body_frame)?;
        let rotation = self.transform(twist_frame, &twist.frame_id)?.rotation;

        let pose = StampedPose {
            frame_id: pose_frame.to_string(),
            pose: body_in_pose_frame,
        };
        let twist = StampedTwist {
            frame_id: twist_frame.to_string(),
            linear: rotation * twist.linear,
            angular: rotation * twist.angular,
        };
        Ok((pose, twist))
    }
}
