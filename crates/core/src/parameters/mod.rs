//! Parameter management types and utilities
//!
//! This module provides the parameter store and the per-behavior parameter
//! blocks loaded from it. File loading is in the runtime crate.

pub mod behavior;
pub mod error;
pub mod storage;

pub use behavior::{FollowReferenceParams, FrameNames, TakeoffParams};
pub use error::ParameterError;
pub use storage::{ParamFlags, ParamValue, ParameterStore};
