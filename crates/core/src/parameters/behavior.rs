//! Behavior Parameter Definitions
//!
//! # Parameters
//!
//! - `FRAME_WORLD` - World frame name (default "earth")
//! - `FRAME_NS` - Vehicle namespace, body frame is `<ns>/base_link` (default "drone0")
//! - `FREF_MAX_SPD_X`, `FREF_MAX_SPD_Y`, `FREF_MAX_SPD_Z` - Follow-reference
//!   default per-axis speed limits in m/s (**required**)
//! - `TF_TIMEOUT` - Frame lookup timeout in seconds, at most 60 (**required**)
//! - `TKOF_HEIGHT`, `TKOF_SPEED`, `TKOF_THRESHOLD` - Takeoff default height (m),
//!   default climb speed (m/s) and arrival threshold (m) (**required**)
//!
//! Required parameters have no defaults; loading a behavior without them
//! fails with [`ParameterError::Missing`].

use alloc::format;
use alloc::string::{String, ToString};
use core::time::Duration;

use super::error::ParameterError;
use super::storage::{ParamFlags, ParamValue, ParameterStore};
use crate::goal::MaxSpeed;

/// Default world frame
const DEFAULT_WORLD_FRAME: &str = "earth";

/// Default vehicle namespace
const DEFAULT_NAMESPACE: &str = "drone0";

/// Upper bound for `TF_TIMEOUT` (s)
pub const MAX_TF_TIMEOUT_SECS: f64 = 60.0;

/// Frame names shared by all behaviors
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameNames {
    /// World frame; speed limits and velocity feedback are expressed in it
    pub world: String,
    /// Vehicle namespace
    pub namespace: String,
}

impl Default for FrameNames {
    fn default() -> Self {
        Self {
            world: DEFAULT_WORLD_FRAME.to_string(),
            namespace: DEFAULT_NAMESPACE.to_string(),
        }
    }
}

impl FrameNames {
    /// Parameter names holding frame names
    ///
    /// Behaviors bake these in at construction, so stores register them
    /// read-only.
    pub const PARAMETERS: [&'static str; 2] = ["FRAME_WORLD", "FRAME_NS"];

    /// Register frame parameters with default values (read-only)
    pub fn register_defaults(store: &mut ParameterStore) -> Result<(), ParameterError> {
        store.register(
            "FRAME_WORLD",
            ParamValue::String(DEFAULT_WORLD_FRAME.to_string()),
            ParamFlags::READ_ONLY,
        )?;
        store.register(
            "FRAME_NS",
            ParamValue::String(DEFAULT_NAMESPACE.to_string()),
            ParamFlags::READ_ONLY,
        )?;
        Ok(())
    }

    /// Load frame names, falling back to defaults for absent entries
    pub fn from_store(store: &ParameterStore) -> Result<Self, ParameterError> {
        let defaults = Self::default();
        let world = optional_string(store, "FRAME_WORLD")?.unwrap_or(defaults.world);
        let namespace = optional_string(store, "FRAME_NS")?.unwrap_or(defaults.namespace);

        if world.is_empty() {
            return Err(ParameterError::InvalidConfig(
                "FRAME_WORLD must not be empty".to_string(),
            ));
        }

        Ok(Self { world, namespace })
    }

    /// Body frame of the vehicle (`<ns>/base_link`)
    pub fn body_frame(&self) -> String {
        if self.namespace.is_empty() {
            "base_link".to_string()
        } else {
            format!("{}/base_link", self.namespace)
        }
    }
}

/// Follow-reference behavior parameters
#[derive(Debug, Clone, PartialEq)]
pub struct FollowReferenceParams {
    /// Speed limits used for axes the client leaves at 0.0
    pub default_max_speed: MaxSpeed,
    pub tf_timeout: Duration,
    pub frames: FrameNames,
}

impl FollowReferenceParams {
    /// Load follow-reference parameters from parameter store
    ///
    /// # Errors
    ///
    /// `Missing` or `TypeMismatch` if a required parameter is absent or
    /// malformed, `InvalidConfig` for a timeout outside `0..=MAX_TF_TIMEOUT_SECS`.
    pub fn from_store(store: &ParameterStore) -> Result<Self, ParameterError> {
        let default_max_speed = MaxSpeed::new(
            store.get_float("FREF_MAX_SPD_X")?,
            store.get_float("FREF_MAX_SPD_Y")?,
            store.get_float("FREF_MAX_SPD_Z")?,
        );

        Ok(Self {
            default_max_speed,
            tf_timeout: tf_timeout(store)?,
            frames: FrameNames::from_store(store)?,
        })
    }
}

/// Takeoff behavior parameters
#[derive(Debug, Clone, PartialEq)]
pub struct TakeoffParams {
    /// Height used when the goal leaves it at 0.0 (m)
    pub default_height: f64,
    /// Climb speed used when the goal leaves it at 0.0 (m/s)
    pub default_speed: f64,
    /// Height error accepted as arrival (m)
    pub threshold: f64,
    pub tf_timeout: Duration,
    pub frames: FrameNames,
}

impl TakeoffParams {
    /// Load takeoff parameters from parameter store
    ///
    /// # Errors
    ///
    /// `Missing` or `TypeMismatch` for absent or malformed parameters,
    /// `InvalidConfig` for a non-positive threshold or out-of-range timeout.
    pub fn from_store(store: &ParameterStore) -> Result<Self, ParameterError> {
        let threshold = store.get_float("TKOF_THRESHOLD")?;
        if threshold.is_nan() || threshold <= 0.0 {
            return Err(ParameterError::InvalidConfig(format!(
                "TKOF_THRESHOLD must be positive, got {threshold}"
            )));
        }

        Ok(Self {
            default_height: store.get_float("TKOF_HEIGHT")?,
            default_speed: store.get_float("TKOF_SPEED")?,
            threshold,
            tf_timeout: tf_timeout(store)?,
            frames: FrameNames::from_store(store)?,
        })
    }
}

fn tf_timeout(store: &ParameterStore) -> Result<Duration, ParameterError> {
    let seconds = store.get_float("TF_TIMEOUT")?;
    if !(0.0..=MAX_TF_TIMEOUT_SECS).contains(&seconds) {
        return Err(ParameterError::InvalidConfig(format!(
            "TF_TIMEOUT must be within 0..={MAX_TF_TIMEOUT_SECS} s, got {seconds}"
        )));
    }
    Duration::try_from_secs_f64(seconds).map_err(|_| {
        ParameterError::InvalidConfig(format!("TF_TIMEOUT is not a valid duration: {seconds}"))
    })
}

fn optional_string(store: &ParameterStore, name: &str) -> Result<Option<String>, ParameterError> {
    match store.get_string(name) {
        Ok(value) => Ok(Some(value.to_string())),
        Err(ParameterError::Missing(_)) => Ok(None),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn follow_reference_store() -> ParameterStore {
        let mut store = ParameterStore::new();
        store.insert("FREF_MAX_SPD_X", ParamValue::Float(1.0)).unwrap();
        store.insert("FREF_MAX_SPD_Y", ParamValue::Float(1.5)).unwrap();
        store.insert("FREF_MAX_SPD_Z", ParamValue::Int(2)).unwrap();
        store.insert("TF_TIMEOUT", ParamValue::Float(0.25)).unwrap();
        store
    }

    #[test]
    fn test_frame_names_defaults() {
        let mut store = ParameterStore::new();
        FrameNames::register_defaults(&mut store).unwrap();
        let frames = FrameNames::from_store(&store).unwrap();
        assert_eq!(frames, FrameNames::default());
        assert_eq!(frames.body_frame(), "drone0/base_link");
    }

    #[test]
    fn test_frame_names_custom_namespace() {
        let mut store = ParameterStore::new();
        store
            .insert("FRAME_NS", ParamValue::String("uav7".to_string()))
            .unwrap();
        let frames = FrameNames::from_store(&store).unwrap();
        assert_eq!(frames.world, "earth");
        assert_eq!(frames.body_frame(), "uav7/base_link");
    }

    #[test]
    fn test_follow_reference_params_from_store() {
        let params = FollowReferenceParams::from_store(&follow_reference_store()).unwrap();
        assert_eq!(params.default_max_speed, MaxSpeed::new(1.0, 1.5, 2.0));
        assert_eq!(params.tf_timeout, Duration::from_millis(250));
        assert_eq!(params.frames, FrameNames::default());
    }

    #[test]
    fn test_follow_reference_params_missing_speed() {
        let mut store = ParameterStore::new();
        store.insert("FREF_MAX_SPD_X", ParamValue::Float(1.0)).unwrap();
        store.insert("TF_TIMEOUT", ParamValue::Float(0.25)).unwrap();
        assert_eq!(
            FollowReferenceParams::from_store(&store),
            Err(ParameterError::Missing("FREF_MAX_SPD_Y".to_string()))
        );
    }

    #[test]
    fn test_follow_reference_params_malformed_timeout() {
        let mut store = follow_reference_store();
        store
            .insert("TF_TIMEOUT", ParamValue::String("soon".to_string()))
            .unwrap();
        assert!(matches!(
            FollowReferenceParams::from_store(&store),
            Err(ParameterError::TypeMismatch { .. })
        ));

        store.insert("TF_TIMEOUT", ParamValue::Float(-1.0)).unwrap();
        assert!(matches!(
            FollowReferenceParams::from_store(&store),
            Err(ParameterError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_tf_timeout_bounds() {
        let mut store = follow_reference_store();
        for seconds in [1e19, f64::INFINITY, f64::NAN, MAX_TF_TIMEOUT_SECS + 1.0] {
            store.insert("TF_TIMEOUT", ParamValue::Float(seconds)).unwrap();
            assert!(matches!(
                FollowReferenceParams::from_store(&store),
                Err(ParameterError::InvalidConfig(_))
            ));
        }

        store
            .insert("TF_TIMEOUT", ParamValue::Float(MAX_TF_TIMEOUT_SECS))
            .unwrap();
        let params = FollowReferenceParams::from_store(&store).unwrap();
        assert_eq!(params.tf_timeout, Duration::from_secs(60));
    }

    #[test]
    fn test_takeoff_params_from_store() {
        let mut store = ParameterStore::new();
        store.insert("TKOF_HEIGHT", ParamValue::Float(1.0)).unwrap();
        store.insert("TKOF_SPEED", ParamValue::Float(0.5)).unwrap();
        store.insert("TKOF_THRESHOLD", ParamValue::Float(0.1)).unwrap();
        store.insert("TF_TIMEOUT", ParamValue::Int(1)).unwrap();

        let params = TakeoffParams::from_store(&store).unwrap();
        assert!((params.default_height - 1.0).abs() < 1e-9);
        assert!((params.threshold - 0.1).abs() < 1e-9);
        assert_eq!(params.tf_timeout, Duration::from_secs(1));

        store.insert("TKOF_THRESHOLD", ParamValue::Float(0.0)).unwrap();
        assert!(matches!(
            TakeoffParams::from_store(&store),
            Err(ParameterError::InvalidConfig(_))
        ));
    }
}
