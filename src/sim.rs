//! Lightweight simulated multirotor.
//!
//! Point-mass model with no external dependencies, suitable for CI testing
//! and the demo binary. Consumes motion commands as a [`MotionCommandSink`],
//! integrates a proportional position controller with per-axis speed limits,
//! and publishes the body transform into a [`SharedFrameTree`].

use std::f64::consts::{PI, TAU};
use std::time::Duration;

use aerial_behaviors_core::command::{MotionCommandSink, PositionCommand};
use aerial_behaviors_core::geometry::{yaw_from_quaternion, StampedTwist};
use aerial_behaviors_core::goal::MaxSpeed;
use aerial_behaviors_core::state::PlatformState;
use nalgebra::{Isometry3, Point3, Translation3, UnitQuaternion, Vector3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::task::JoinHandle;

use crate::frames::SharedFrameTree;
use crate::sync::{MutexState, SharedState};

/// Configuration for the simulated vehicle.
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// World frame name.
    pub world_frame: String,
    /// Body frame name.
    pub body_frame: String,
    /// Proportional gain from position error to velocity (1/s).
    pub position_gain: f64,
    /// Maximum yaw rate in rad/s.
    pub max_yaw_rate: f64,
    /// Speed limits applied to hover setpoints (m/s).
    pub hover_max_speed: MaxSpeed,
    /// Height above which a landed vehicle is reported as flying (m).
    pub airborne_height: f64,
    /// Uniform velocity reading noise amplitude in m/s.
    pub velocity_noise: f64,
    /// RNG seed for deterministic mode. None = random.
    pub seed: Option<u64>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            world_frame: "earth".to_string(),
            body_frame: "drone0/base_link".to_string(),
            position_gain: 1.5,
            max_yaw_rate: 1.0,
            hover_max_speed: MaxSpeed::uniform(1.0),
            airborne_height: 0.2,
            velocity_noise: 0.0,
            seed: None,
        }
    }
}

/// Position/yaw target in the world frame.
#[derive(Debug, Clone, Copy)]
struct Setpoint {
    position: Point3<f64>,
    yaw: f64,
    max_speed: MaxSpeed,
}

/// Internal vehicle state for integration.
#[derive(Debug)]
struct SimState {
    position: Point3<f64>,
    yaw: f64,
    velocity: Vector3<f64>,
    setpoint: Option<Setpoint>,
    platform: PlatformState,
    /// Command link available; when false every command is refused.
    link_up: bool,
    position_commands: usize,
    hover_commands: usize,
    rng: StdRng,
}

/// Simulated vehicle handle, cheap to clone.
///
/// Every clone drives the same vehicle, so one copy can be handed to a
/// behavior as its command sink while another steps the physics.
#[derive(Clone)]
pub struct SimulatedVehicle {
    config: SimConfig,
    frames: SharedFrameTree,
    state: MutexState<SimState>,
}

impl SimulatedVehicle {
    /// Create a vehicle at `position` with heading `yaw` and publish its pose.
    pub fn new(
        config: SimConfig,
        frames: SharedFrameTree,
        position: Point3<f64>,
        yaw: f64,
        platform: PlatformState,
    ) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let vehicle = Self {
            config,
            frames,
            state: MutexState::new(SimState {
                position,
                yaw,
                velocity: Vector3::zeros(),
                setpoint: None,
                platform,
                link_up: true,
                position_commands: 0,
                hover_commands: 0,
                rng,
            }),
        };
        vehicle.publish_pose(&position, yaw);
        vehicle
    }

    /// Current position in the world frame.
    pub fn position(&self) -> Point3<f64> {
        self.state.with(|s| s.position)
    }

    /// Current heading in the world frame.
    pub fn yaw(&self) -> f64 {
        self.state.with(|s| s.yaw)
    }

    /// Reported platform state.
    pub fn platform_state(&self) -> PlatformState {
        self.state.with(|s| s.platform)
    }

    /// Override the platform state (arming, emergency, ...).
    pub fn set_platform_state(&self, platform: PlatformState) {
        self.state.with_mut(|s| s.platform = platform);
    }

    /// Bring the command link down (every command fails) or back up.
    pub fn set_link_up(&self, up: bool) {
        self.state.with_mut(|s| s.link_up = up);
    }

    /// Number of accepted position commands.
    pub fn position_command_count(&self) -> usize {
        self.state.with(|s| s.position_commands)
    }

    /// Number of accepted hover commands.
    pub fn hover_command_count(&self) -> usize {
        self.state.with(|s| s.hover_commands)
    }

    /// Advance the simulation by `dt` seconds.
    ///
    /// Returns the velocity reading (world frame) and the platform state.
    pub fn step(&self, dt: f64) -> (StampedTwist, PlatformState) {
        let config = &self.config;
        let (position, yaw, velocity, platform) = self.state.with_mut(|s| {
            s.velocity = match s.setpoint {
                Some(setpoint) => {
                    let error = setpoint.position - s.position;
                    let limits = setpoint.max_speed;
                    Vector3::new(
                        clamp_axis(error.x * config.position_gain, limits.x),
                        clamp_axis(error.y * config.position_gain, limits.y),
                        clamp_axis(error.z * config.position_gain, limits.z),
                    )
                }
                None => Vector3::zeros(),
            };
            s.position += s.velocity * dt;

            if let Some(setpoint) = s.setpoint {
                let yaw_error = wrap_angle(setpoint.yaw - s.yaw);
                let max_step = config.max_yaw_rate * dt;
                s.yaw = wrap_angle(s.yaw + yaw_error.clamp(-max_step, max_step));
            }

            if s.platform == PlatformState::Landed && s.position.z > config.airborne_height {
                log::info!("Simulated vehicle airborne");
                s.platform = PlatformState::Flying;
            }

            let mut reading = s.velocity;
            if config.velocity_noise > 0.0 {
                let noise = config.velocity_noise;
                for axis in reading.iter_mut() {
                    *axis += s.rng.gen_range(-noise..=noise);
                }
            }
            (s.position, s.yaw, reading, s.platform)
        });

        self.publish_pose(&position, yaw);
        (
            StampedTwist::new(self.config.world_frame.clone(), velocity),
            platform,
        )
    }

    /// Step the simulation on a fixed period, reporting each reading.
    ///
    /// The task runs until aborted.
    pub fn spawn_physics<F>(&self, period: Duration, mut on_reading: F) -> JoinHandle<()>
    where
        F: FnMut(StampedTwist, PlatformState) + Send + 'static,
    {
        let vehicle = self.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                let (twist, platform) = vehicle.step(period.as_secs_f64());
                on_reading(twist, platform);
            }
        })
    }

    fn publish_pose(&self, position: &Point3<f64>, yaw: f64) {
        let pose = Isometry3::from_parts(
            Translation3::from(position.coords),
            UnitQuaternion::from_euler_angles(0.0, 0.0, yaw),
        );
        if let Err(e) =
            self.frames
                .set_transform(&self.config.world_frame, &self.config.body_frame, pose)
        {
            log::error!("Failed to publish simulated pose: {}", e);
        }
    }

    /// Express a command target in the world frame.
    fn to_world(&self, command: &PositionCommand) -> Option<(Point3<f64>, f64)> {
        match self
            .frames
            .transform(&self.config.world_frame, &command.frame_id)
        {
            Ok(transform) => {
                let position = transform * command.position;
                let heading = transform.rotation * UnitQuaternion::from_euler_angles(0.0, 0.0, command.yaw);
                Some((position, yaw_from_quaternion(&heading)))
            }
            Err(e) => {
                log::warn!("Simulated vehicle rejected command in '{}': {}", command.frame_id, e);
                None
            }
        }
    }
}

impl MotionCommandSink for SimulatedVehicle {
    fn send_position_with_yaw(&mut self, command: &PositionCommand) -> bool {
        if !self.state.with(|s| s.link_up) {
            return false;
        }
        let Some((position, yaw)) = self.to_world(command) else {
            return false;
        };
        self.state.with_mut(|s| {
            s.setpoint = Some(Setpoint {
                position,
                yaw,
                max_speed: command.max_speed,
            });
            s.position_commands += 1;
        });
        true
    }

    fn send_hover(&mut self) -> bool {
        let hover_max_speed = self.config.hover_max_speed;
        self.state.with_mut(|s| {
            if !s.link_up {
                return false;
            }
            s.setpoint = Some(Setpoint {
                position: s.position,
                yaw: s.yaw,
                max_speed: hover_max_speed,
            });
            s.hover_commands += 1;
            true
        })
    }
}

fn clamp_axis(value: f64, limit: f64) -> f64 {
    let limit = limit.abs();
    value.clamp(-limit, limit)
}

/// Wrap an angle to [-pi, pi).
fn wrap_angle(angle: f64) -> f64 {
    (angle + PI).rem_euclid(TAU) - PI
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn vehicle(platform: PlatformState) -> (SimulatedVehicle, SharedFrameTree) {
        let frames = SharedFrameTree::new();
        let config = SimConfig {
            seed: Some(7),
            ..SimConfig::default()
        };
        let vehicle = SimulatedVehicle::new(config, frames.clone(), Point3::origin(), 0.0, platform);
        (vehicle, frames)
    }

    fn command(x: f64, y: f64, z: f64, yaw: f64) -> PositionCommand {
        PositionCommand {
            frame_id: "earth".to_string(),
            position: Point3::new(x, y, z),
            yaw,
            speed_frame: "earth".to_string(),
            max_speed: MaxSpeed::uniform(2.0),
        }
    }

    #[test]
    fn test_initial_pose_published() {
        let (_vehicle, frames) = vehicle(PlatformState::Flying);
        assert!(frames.transform("earth", "drone0/base_link").is_ok());
    }

    #[test]
    fn test_converges_to_setpoint() {
        let (mut vehicle, frames) = vehicle(PlatformState::Flying);
        assert!(vehicle.send_position_with_yaw(&command(3.0, -2.0, 1.0, 0.5)));

        for _ in 0..400 {
            vehicle.step(0.05);
        }

        let position = vehicle.position();
        assert_abs_diff_eq!(position.x, 3.0, epsilon = 1e-3);
        assert_abs_diff_eq!(position.y, -2.0, epsilon = 1e-3);
        assert_abs_diff_eq!(position.z, 1.0, epsilon = 1e-3);
        assert_abs_diff_eq!(vehicle.yaw(), 0.5, epsilon = 1e-3);

        let pose = frames.transform("earth", "drone0/base_link").unwrap();
        assert_abs_diff_eq!(pose.translation.x, 3.0, epsilon = 1e-3);
    }

    #[test]
    fn test_speed_limit_respected() {
        let (mut vehicle, _) = vehicle(PlatformState::Flying);
        let mut slow = command(100.0, 0.0, 0.0, 0.0);
        slow.max_speed = MaxSpeed::new(0.5, 0.5, 0.5);
        vehicle.send_position_with_yaw(&slow);

        let (twist, _) = vehicle.step(0.1);
        assert_abs_diff_eq!(twist.linear.x, 0.5);
        assert_eq!(twist.frame_id, "earth");
    }

    #[test]
    fn test_link_down_refuses_commands() {
        let (mut vehicle, _) = vehicle(PlatformState::Flying);
        vehicle.set_link_up(false);
        assert!(!vehicle.send_position_with_yaw(&command(1.0, 0.0, 0.0, 0.0)));
        assert!(!vehicle.send_hover());
        assert_eq!(vehicle.position_command_count(), 0);
    }

    #[test]
    fn test_unknown_command_frame_refused() {
        let (mut vehicle, _) = vehicle(PlatformState::Flying);
        let mut cmd = command(1.0, 0.0, 0.0, 0.0);
        cmd.frame_id = "odom".to_string();
        assert!(!vehicle.send_position_with_yaw(&cmd));
    }

    #[test]
    fn test_hover_holds_position() {
        let (mut vehicle, _) = vehicle(PlatformState::Flying);
        vehicle.send_position_with_yaw(&command(10.0, 0.0, 0.0, 0.0));
        vehicle.step(0.1);
        assert!(vehicle.send_hover());
        let held = vehicle.position();
        let (twist, _) = vehicle.step(0.1);
        assert_abs_diff_eq!(twist.speed(), 0.0);
        assert_abs_diff_eq!(vehicle.position().x, held.x);
        assert_eq!(vehicle.hover_command_count(), 1);
    }

    #[test]
    fn test_landed_becomes_flying_after_climb() {
        let (mut vehicle, _) = vehicle(PlatformState::Landed);
        vehicle.send_position_with_yaw(&command(0.0, 0.0, 2.0, 0.0));
        let mut platform = PlatformState::Landed;
        for _ in 0..50 {
            platform = vehicle.step(0.05).1;
        }
        assert_eq!(platform, PlatformState::Flying);
    }

    #[test]
    fn test_wrap_angle() {
        assert_abs_diff_eq!(wrap_angle(3.0 * PI / 2.0), -PI / 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(wrap_angle(-3.0 * PI / 2.0), PI / 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(wrap_angle(0.25), 0.25, epsilon = 1e-12);
    }
}
