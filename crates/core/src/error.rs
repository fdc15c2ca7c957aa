//! Behavior error taxonomy
//!
//! Every error is scoped to a single behavior instance. Acceptance-time
//! errors come back from `activate`/`modify` as rejected transitions and
//! leave the behavior unchanged; `CommandSendFailed` is the only error that
//! ends a run.

use crate::behavior::BehaviorStatus;
use crate::frames::FrameError;
use crate::state::PlatformState;

/// Errors that can occur while driving a behavior
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BehaviorError {
    /// Goal is malformed (e.g., empty target frame)
    #[error("invalid goal: {0}")]
    InvalidGoal(&'static str),
    /// Target (or vehicle) could not be placed in the required frame
    #[error("frame resolution failed: {0}")]
    FrameResolutionFailed(#[from] FrameError),
    /// Behavior requires the platform to be flying
    #[error("platform is not flying (state: {0})")]
    PlatformNotFlying(PlatformState),
    /// Platform state does not allow this behavior to start
    #[error("platform not ready (state: {0})")]
    PlatformNotReady(PlatformState),
    /// No localization reading has been received yet
    #[error("no localization available")]
    NoLocalization,
    /// Yaw mode cannot be handled by this behavior
    #[error("yaw mode {0} not supported")]
    UnsupportedYawMode(u8),
    /// Motion command sink refused a command
    #[error("motion command send failed")]
    CommandSendFailed,
    /// Lifecycle operation not allowed in the current status
    #[error("cannot {operation} while {status}")]
    InvalidTransition {
        /// Requested operation
        operation: &'static str,
        /// Status at the time of the request
        status: BehaviorStatus,
    },
}
