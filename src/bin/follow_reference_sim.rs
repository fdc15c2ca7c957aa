//! Follow-reference demo against the simulated vehicle.
//!
//! Takes off, then chases a reference point moving on a circle, modifying
//! the goal every half second. Stops after the requested duration or on
//! Ctrl-C.
//!
//! Usage:
//!   cargo run --bin follow_reference_sim -- [OPTIONS]
//!
//! Options:
//!   -c, --config <PATH>   Runtime configuration (default: built-in)
//!   --radius <M>          Circle radius in meters (default: 3.0)
//!   --height <M>          Flight height in meters (default: 1.5)
//!   --yaw-mode <N>        Yaw mode wire value (default: 1, path facing)
//!   --duration <S>        Follow duration in seconds (default: 20)

use std::env;
use std::path::PathBuf;
use std::process;
use std::time::Duration;

use aerial_behaviors::logging;
use aerial_behaviors::{BehaviorRunner, RunnerEvent, RuntimeConfig, SharedFrameTree, SimConfig, SimulatedVehicle};
use aerial_behaviors_core::behavior::{TakeoffBehavior, TakeoffGoal};
use aerial_behaviors_core::{
    FollowReferenceBehavior, FollowReferenceGoal, PlatformState, StampedPoint, YawMode, YawSpec,
};
use anyhow::{bail, Context, Result};
use log::LevelFilter;
use nalgebra::{Isometry3, Point3};

const DEFAULT_CONFIG: &str = include_str!("../../config/follow_reference.toml");

/// Period of the simulated physics
const PHYSICS_PERIOD: Duration = Duration::from_millis(10);

/// Period between goal modifications
const REFERENCE_PERIOD: Duration = Duration::from_millis(500);

/// Angular speed of the reference on its circle (rad/s)
const REFERENCE_RATE: f64 = 0.2;

struct Args {
    config: Option<PathBuf>,
    radius: f64,
    height: f64,
    yaw_mode: u8,
    duration: f64,
}

fn parse_args() -> Args {
    let mut args = Args {
        config: None,
        radius: 3.0,
        height: 1.5,
        yaw_mode: 1,
        duration: 20.0,
    };

    let raw: Vec<String> = env::args().collect();
    let mut i = 1;
    while i < raw.len() {
        match raw[i].as_str() {
            "-c" | "--config" => {
                i += 1;
                args.config = Some(PathBuf::from(arg_value(&raw, i, "config")));
            }
            "--radius" => {
                i += 1;
                args.radius = parse_arg(&raw, i, "radius");
            }
            "--height" => {
                i += 1;
                args.height = parse_arg(&raw, i, "height");
            }
            "--yaw-mode" => {
                i += 1;
                args.yaw_mode = parse_arg(&raw, i, "yaw-mode");
            }
            "--duration" => {
                i += 1;
                args.duration = parse_arg(&raw, i, "duration");
            }
            "-h" | "--help" => {
                print_usage();
                process::exit(0);
            }
            other => {
                eprintln!("Unknown option: {other}");
                print_usage();
                process::exit(1);
            }
        }
        i += 1;
    }

    args
}

fn arg_value<'a>(raw: &'a [String], i: usize, name: &str) -> &'a str {
    raw.get(i).map(String::as_str).unwrap_or_else(|| {
        eprintln!("Error: --{name} requires a value");
        process::exit(1);
    })
}

fn parse_arg<T: std::str::FromStr>(raw: &[String], i: usize, name: &str) -> T {
    arg_value(raw, i, name).parse().unwrap_or_else(|_| {
        eprintln!("Error: invalid value for --{name}");
        process::exit(1);
    })
}

fn print_usage() {
    eprintln!(
        "Usage: follow_reference_sim [OPTIONS]\n\
         \n\
         Options:\n\
         \x20 -c, --config <PATH>   Runtime configuration (default: built-in)\n\
         \x20 --radius <M>          Circle radius in meters (default: 3.0)\n\
         \x20 --height <M>          Flight height in meters (default: 1.5)\n\
         \x20 --yaw-mode <N>        Yaw mode wire value (default: 1, path facing)\n\
         \x20 --duration <S>        Follow duration in seconds (default: 20)\n\
         \x20 -h, --help            Show this help"
    );
}

fn reference_point(radius: f64, height: f64, elapsed: f64) -> StampedPoint {
    let angle = elapsed * REFERENCE_RATE;
    StampedPoint::new("map", radius * angle.cos(), radius * angle.sin(), height)
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::init(LevelFilter::Info);
    let args = parse_args();

    let config = match &args.config {
        Some(path) => RuntimeConfig::load(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => RuntimeConfig::from_toml_str(DEFAULT_CONFIG).context("parsing built-in config")?,
    };
    let follow_params = config
        .follow_reference_params()
        .context("follow-reference parameters")?;
    let takeoff_params = config.takeoff_params().context("takeoff parameters")?;
    let yaw_mode = YawMode::try_from(args.yaw_mode).context("--yaw-mode")?;

    println!("=== Follow Reference Simulation ===");
    println!(
        "Radius: {} m, height: {} m, yaw mode: {}, duration: {} s",
        args.radius, args.height, yaw_mode, args.duration
    );

    let frames = SharedFrameTree::new();
    frames
        .set_transform(&follow_params.frames.world, "map", Isometry3::identity())
        .context("publishing map frame")?;

    let sim_config = SimConfig {
        world_frame: follow_params.frames.world.clone(),
        body_frame: follow_params.frames.body_frame(),
        ..SimConfig::default()
    };
    let vehicle = SimulatedVehicle::new(
        sim_config,
        frames.clone(),
        Point3::origin(),
        0.0,
        PlatformState::Landed,
    );

    let (takeoff, mut takeoff_events) = BehaviorRunner::new(TakeoffBehavior::new(
        takeoff_params,
        frames.clone(),
        vehicle.clone(),
    ));
    let (follow, mut follow_events) = BehaviorRunner::new(FollowReferenceBehavior::new(
        &follow_params,
        frames.clone(),
        vehicle.clone(),
    ));

    let physics = {
        let takeoff = takeoff.clone();
        let follow = follow.clone();
        vehicle.spawn_physics(PHYSICS_PERIOD, move |twist, platform| {
            takeoff.on_platform_update(platform);
            takeoff.on_state_update(twist.clone());
            follow.on_platform_update(platform);
            follow.on_state_update(twist);
        })
    };
    // Let the first readings arrive
    tokio::time::sleep(PHYSICS_PERIOD * 5).await;

    // Takeoff
    takeoff
        .activate(TakeoffGoal {
            height: args.height,
            speed: 0.0,
        })
        .context("takeoff rejected")?;
    let takeoff_task = takeoff.spawn(config.tick_period());
    match takeoff_events.recv().await {
        Some(RunnerEvent::Finished { status, result }) if result.takeoff_success => {
            println!("Takeoff finished: {status}");
        }
        other => bail!("takeoff did not succeed: {other:?}"),
    }
    takeoff_task.abort();

    // Follow the moving reference
    let goal = FollowReferenceGoal::new(
        reference_point(args.radius, args.height, 0.0),
        YawSpec::new(yaw_mode),
    );
    follow.activate(goal).context("follow reference rejected")?;
    let follow_task = follow.spawn(config.tick_period());
    let feedback = follow.feedback();

    let mut reference_timer = tokio::time::interval(REFERENCE_PERIOD);
    let start = tokio::time::Instant::now();
    let deadline = start + Duration::from_secs_f64(args.duration.max(0.0));

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                println!("Interrupted");
                break;
            }
            _ = tokio::time::sleep_until(deadline) => break,
            event = follow_events.recv() => {
                println!("Follow reference ended early: {event:?}");
                break;
            }
            _ = reference_timer.tick() => {
                let elapsed = start.elapsed().as_secs_f64();
                let goal = FollowReferenceGoal::new(
                    reference_point(args.radius, args.height, elapsed),
                    YawSpec::new(yaw_mode),
                );
                if let Err(e) = follow.modify(goal) {
                    log::warn!("Reference update rejected: {}", e);
                }
                if let Some(snapshot) = *feedback.borrow() {
                    println!(
                        "t={:5.1}s speed={:.2} m/s distance={:.2} m",
                        elapsed, snapshot.actual_speed, snapshot.actual_distance_to_goal
                    );
                }
            }
        }
    }

    if follow.deactivate().is_ok() {
        println!("Follow reference stopped, hovering");
    }
    follow_task.abort();
    physics.abort();

    let position = vehicle.position();
    println!(
        "Final position: ({:.2}, {:.2}, {:.2})",
        position.x, position.y, position.z
    );
    Ok(())
}
