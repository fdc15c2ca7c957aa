//! Coordinate frame resolution
//!
//! Converts points, poses and velocity readings between named frames.
//!
//! # Contents
//!
//! - [`TransformLookup`]: source of rigid transforms between frames, bounded by a timeout
//! - [`FrameTree`]: in-memory transform graph (no waiting, used on host and in tests)
//! - [`FrameTransformResolver`]: lookup + timeout bundled with the conversions behaviors need
//!
//! Lookup failures are never fatal here. Callers decide whether a failure
//! rejects a goal (acceptance time) or just leaves feedback stale (mid-flight).

mod resolver;
mod tree;

use alloc::string::String;
use core::time::Duration;
use nalgebra::Isometry3;

pub use resolver::FrameTransformResolver;
pub use tree::FrameTree;

/// Errors from frame lookups
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    /// A frame name was empty
    #[error("frame id is empty")]
    EmptyFrameId,
    /// The frame has never been published
    #[error("unknown frame '{0}'")]
    UnknownFrame(String),
    /// Both frames exist but belong to different trees
    #[error("frames '{target_frame}' and '{source_frame}' are not connected")]
    Disconnected {
        /// Frame the result is expressed in
        target_frame: String,
        /// Frame the input is expressed in
        source_frame: String,
    },
    /// Linking the child under the parent would close a loop
    #[error("linking '{child}' under '{parent}' would create a cycle")]
    Cycle {
        /// Requested parent frame
        parent: String,
        /// Requested child frame
        child: String,
    },
    /// The transform did not become available in time
    #[error("timed out after {timeout:?} waiting for '{target_frame}' <- '{source_frame}'")]
    Timeout {
        /// Frame the result is expressed in
        target_frame: String,
        /// Frame the input is expressed in
        source_frame: String,
        /// Time waited
        timeout: Duration,
    },
}

/// Source of rigid transforms between named frames
///
/// Implementations:
/// - [`FrameTree`] answers immediately and ignores the timeout
/// - `SharedFrameTree` (runtime crate) waits up to `timeout` for a missing transform
pub trait TransformLookup {
    /// Transform mapping coordinates expressed in `source` into `target`
    ///
    /// Must return within roughly `timeout`; never blocks indefinitely.
    fn lookup_transform(
        &self,
        target: &str,
        source: &str,
        timeout: Duration,
    ) -> Result<Isometry3<f64>, FrameError>;
}

impl<T: TransformLookup + ?Sized> TransformLookup for &T {
    fn lookup_transform(
        &self,
        target: &str,
        source: &str,
        timeout: Duration,
    ) -> Result<Isometry3<f64>, FrameError> {
        (**self).lookup_transform(target, source, timeout)
    }
}
