//! Headless run of the simulation.
//!
//! ```text
//! springle [params.json|-] [frames] [output.png] [seed]
//! ```
//!
//! Runs `frames` frames at 60 Hz (default 600) with a scripted drag in the
//! middle, writes the last frame as a PNG and logs statistics as JSON.
//! Set `RUST_LOG=debug` to follow group spawns and drags.

use std::f32::consts::TAU;

use log::info;
use springle::prelude::*;
use springle::ConfigError;

const WIDTH: u32 = 1280;
const HEIGHT: u32 = 720;
const DT: f32 = 1.0 / 60.0;

fn main() -> Result<(), ConfigError> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let mut params = match args.next().filter(|a| a != "-") {
        Some(path) => {
            info!("loading parameters from {}", path);
            SimulationParams::from_json_file(path)?
        }
        None => SimulationParams::default(),
    };
    let frames: u32 = args.next().and_then(|s| s.parse().ok()).unwrap_or(600);
    let output = args.next().unwrap_or_else(|| "springle.png".to_string());
    let seed: Option<u64> = args.next().and_then(|s| s.parse().ok());

    let mut config = SystemConfig::new(WIDTH, HEIGHT);
    if let Some(seed) = seed {
        config = config.with_seed(seed);
    }
    let mut sim = SimulationController::with_params(config, &params);
    let mut canvas = CpuCanvas::new(WIDTH, HEIGHT, Rgb::new(12, 10, 24));

    let center = Vec2::new(WIDTH as f32 / 2.0, HEIGHT as f32 / 2.0);
    let drag_start = frames / 3;
    let drag_end = drag_start + 30;

    for frame in 0..frames {
        // Quarter turn around the center, then let go
        if (drag_start..drag_end).contains(&frame) {
            let t = (frame - drag_start) as f32 / 30.0;
            let angle = t * TAU / 4.0;
            params.pointer_pressed = true;
            params.pointer_position = center + Vec2::new(angle.cos(), -angle.sin()) * 200.0;
        } else {
            params.pointer_pressed = false;
        }

        sim.update(DT, &params);
        sim.draw(&mut canvas, params.gradient_sharpness);
    }
    sim.release_textures(&mut canvas);

    canvas.save_png(&output)?;
    info!("wrote {}", output);

    let stats = serde_json::to_string_pretty(&sim.stats())?;
    info!("stats: {}", stats);
    println!("{}", stats);
    Ok(())
}
