//! aerial_behaviors_core - Pure no_std goal lifecycle logic for aerial motion behaviors
//!
//! This crate contains the platform-agnostic pieces of the behavior engine
//! that can be tested on host without any runtime, transport or threading.
//!
//! # Design Principles
//!
//! - **Pure no_std**: Only `alloc` is required (frame names, goal records)
//! - **Trait abstractions**: Frame lookups and motion command output are
//!   injected via traits ([`frames::TransformLookup`], [`command::MotionCommandSink`])
//! - **Single owner**: Nothing here locks; the runtime crate serializes access
//!
//! # Modules
//!
//! - [`geometry`]: Stamped point/pose/twist types and yaw helpers
//! - [`frames`]: Frame graph, lookup trait and the timeout-bounded resolver
//! - [`yaw`]: Yaw modes and yaw angle computation
//! - [`goal`]: Follow-reference goal, feedback and result records
//! - [`validator`]: Goal validation, speed normalization and preconditions
//! - [`state`]: Platform state and the vehicle state record
//! - [`command`]: Motion command sink trait and a recording mock
//! - [`behavior`]: Behavior trait, lifecycle server and concrete behaviors
//! - [`parameters`]: Parameter store and per-behavior parameter blocks
//! - [`error`]: Behavior error taxonomy

#![no_std]

extern crate alloc;

pub mod behavior;
pub mod command;
pub mod error;
pub mod frames;
pub mod geometry;
pub mod goal;
pub mod parameters;
pub mod state;
pub mod validator;
pub mod yaw;

pub use behavior::{
    Behavior, BehaviorServer, BehaviorStatus, ExecutionStatus, FollowReferenceBehavior,
    TakeoffBehavior, TakeoffFeedback, TakeoffGoal, TakeoffResult, TickReport,
};
pub use command::{MotionCommandSink, PositionCommand};
pub use error::BehaviorError;
pub use frames::{FrameError, FrameTransformResolver, FrameTree, TransformLookup};
pub use geometry::{StampedPoint, StampedPose, StampedTwist};
pub use goal::{FollowReferenceFeedback, FollowReferenceGoal, FollowReferenceResult, MaxSpeed};
pub use parameters::{FollowReferenceParams, ParameterError, ParameterStore, TakeoffParams};
pub use state::{PlatformState, VehicleState};
pub use yaw::{YawMode, YawSpec};
