//! Motion command output
//!
//! The low-level command encoder is outside this crate; behaviors only see
//! the [`MotionCommandSink`] trait. A boolean return is the only signal used.

use alloc::string::String;
use alloc::vec::Vec;
use nalgebra::Point3;

use crate::goal::MaxSpeed;

/// Position reference with yaw and per-axis speed limits
#[derive(Debug, Clone, PartialEq)]
pub struct PositionCommand {
    /// Frame the position is expressed in
    pub frame_id: String,
    /// Target position (m)
    pub position: Point3<f64>,
    /// Target yaw (rad)
    pub yaw: f64,
    /// Frame the speed limits are expressed in
    pub speed_frame: String,
    pub max_speed: MaxSpeed,
}

/// Consumer of motion commands
pub trait MotionCommandSink {
    /// Send a position reference with yaw
    ///
    /// Returns `false` if the command could not be delivered.
    fn send_position_with_yaw(&mut self, command: &PositionCommand) -> bool;

    /// Hold the current position
    ///
    /// Returns `false` if the command could not be delivered.
    fn send_hover(&mut self) -> bool;
}

impl<S: MotionCommandSink + ?Sized> MotionCommandSink for alloc::boxed::Box<S> {
    fn send_position_with_yaw(&mut self, command: &PositionCommand) -> bool {
        (**self).send_position_with_yaw(command)
    }

    fn send_hover(&mut self) -> bool {
        (**self).send_hover()
    }
}

// ============================================================================
// Mock Implementation (always available for testing)
// ============================================================================

/// Recording sink for tests
///
/// Records every command it receives. Failures can be injected per command
/// kind; a failed command is still recorded.
#[derive(Debug, Clone, Default)]
pub struct MockCommandSink {
    /// Position commands in send order
    pub position_commands: Vec<PositionCommand>,
    /// Number of hover commands received
    pub hover_count: usize,
    fail_position: bool,
    fail_hover: bool,
}

impl MockCommandSink {
    /// Create a sink that accepts everything
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent position commands fail (or succeed again)
    pub fn set_position_failure(&mut self, fail: bool) {
        self.fail_position = fail;
    }

    /// Make subsequent hover commands fail (or succeed again)
    pub fn set_hover_failure(&mut self, fail: bool) {
        self.fail_hover = fail;
    }

    /// Most recent position command
    pub fn last_position(&self) -> Option<&PositionCommand> {
        self.position_commands.last()
    }

    /// Total number of commands received
    pub fn command_count(&self) -> usize {
        self.position_commands.len() + self.hover_count
    }
}

impl MotionCommandSink for MockCommandSink {
    fn send_position_with_yaw(&mut self, command: &PositionCommand) -> bool {
        self.position_commands.push(command.clone());
        !self.fail_position
    }

    fn send_hover(&mut self) -> bool {
        self.hover_count += 1;
        !self.fail_hover
    }
}
