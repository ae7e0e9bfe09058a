use attractor_studio::app::Studio;
use attractor_studio::config::{Config, RenderStrategy};
use attractor_studio::dynamics::{AttractorParams, SystemKind};
use attractor_studio::features::{AudioFeatures, ParamDeltas};
use clap::Parser;
use std::thread::sleep;
use std::time::Duration;

const W: usize = 120;
const H: usize = 80;

fn config(args: &[&str]) -> Config {
    let mut argv = vec!["attractor-studio"];
    argv.extend_from_slice(args);
    Config::try_parse_from(argv).expect("valid arguments")
}

fn count_non_background(frame: &[u8], bg: (u8, u8, u8)) -> usize {
    frame
        .chunks_exact(4)
        .filter(|px| (px[0], px[1], px[2]) != bg)
        .count()
}

// ── Density pipeline ────────────────────────────────────────────────────────

#[test]
fn dejong_density_frame_lights_up_immediately() {
    let cfg = config(&["--exponent", "4.5"]);
    let mut studio = Studio::new(&cfg, W, H);
    let frame = studio.tick(0.0, &AudioFeatures::default());
    assert_eq!(frame.len(), W * H * 4);
    let lit = count_non_background(frame, cfg.background);
    assert!(lit > 500, "only {lit} pixels lit");
}

#[test]
fn mandelbrot_starts_flat_and_fills_in_once_the_worker_lands() {
    let cfg = config(&["--system", "mandelbrot", "--max-iter", "80"]);
    let mut studio = Studio::new(&cfg, W, H);

    // First tick dispatches the job; nothing is cached yet.
    let first = studio.tick(0.0, &AudioFeatures::default());
    assert_eq!(count_non_background(first, cfg.background), 0);

    let mut lit = 0;
    for i in 0..5_000 {
        let frame = studio.tick(i as f64 * 0.016, &AudioFeatures::default());
        lit = count_non_background(frame, cfg.background);
        if lit > 0 {
            break;
        }
        sleep(Duration::from_millis(1));
    }
    assert!(lit > 100, "worker result never painted ({lit} pixels)");
}

#[test]
fn julia_flag_routes_through_the_same_worker_path() {
    let cfg = config(&[
        "--system", "julia", "--julia", "--julia-r=-0.123", "--julia-i=0.745",
        "--max-iter", "80",
    ]);
    assert_eq!(cfg.system, attractor_studio::config::SystemChoice::Mandelbrot);
    let mut studio = Studio::new(&cfg, W, H);
    assert_eq!(studio.kind(), SystemKind::Mandelbrot);

    let mut lit = 0;
    for i in 0..5_000 {
        let frame = studio.tick(i as f64 * 0.016, &AudioFeatures::default());
        lit = count_non_background(frame, cfg.background);
        if lit > 0 {
            break;
        }
        sleep(Duration::from_millis(1));
    }
    assert!(lit > 0, "julia view never painted");
}

// ── Overlay pipelines ───────────────────────────────────────────────────────

#[test]
fn particle_trails_accumulate_over_ticks() {
    let cfg = config(&["--system", "lorenz", "--render", "particles", "--particles", "200"]);
    let mut studio = Studio::new(&cfg, W, H);
    // Particles spawn clustered near the origin and need a few hundred
    // integration steps to spread over the attractor.
    let mut lit = 0;
    for i in 0..300 {
        let frame = studio.tick(i as f64 * 0.016, &AudioFeatures::default());
        lit = count_non_background(frame, cfg.background);
    }
    assert!(lit > 50, "trails never appeared ({lit} pixels)");
}

#[test]
fn vapor_mode_rides_escape_orbits() {
    let cfg = config(&["--system", "buddhabrot", "--render", "vapor", "--particles", "64"]);
    let mut studio = Studio::new(&cfg, W, H);
    assert_eq!(studio.strategy(), RenderStrategy::Vapor);
    let mut lit = 0;
    for i in 0..30 {
        let frame = studio.tick(i as f64 * 0.016, &AudioFeatures::default());
        lit = count_non_background(frame, cfg.background);
    }
    assert!(lit > 0, "riders never painted");
}

// ── Live control surface ────────────────────────────────────────────────────

#[test]
fn resize_reallocates_the_frame() {
    let cfg = config(&[]);
    let mut studio = Studio::new(&cfg, W, H);
    studio.tick(0.0, &AudioFeatures::default());
    studio.resize(64, 48);
    assert_eq!(studio.size(), (64, 48));
    let frame = studio.tick(0.1, &AudioFeatures::default());
    assert_eq!(frame.len(), 64 * 48 * 4);
}

#[test]
fn switching_systems_swaps_the_preset() {
    let cfg = config(&[]);
    let mut studio = Studio::new(&cfg, W, H);
    assert_eq!(studio.kind(), SystemKind::DeJong);
    studio.set_system(SystemKind::Aizawa);
    assert_eq!(studio.kind(), SystemKind::Aizawa);
    assert_eq!(*studio.params(), AttractorParams::preset(SystemKind::Aizawa));
    studio.tick(0.0, &AudioFeatures::default());
}

#[test]
fn exponent_nudges_clamp_and_rescale_the_budget() {
    let cfg = config(&["--exponent", "5.0"]);
    let mut studio = Studio::new(&cfg, W, H);
    assert_eq!(studio.budget(), 100_000);
    studio.nudge_exponent(1.0);
    assert_eq!(studio.budget(), 1_000_000);
    for _ in 0..40 {
        studio.nudge_exponent(1.0);
    }
    assert_eq!(studio.budget(), 100_000_000);
    for _ in 0..40 {
        studio.nudge_exponent(-1.0);
    }
    assert_eq!(studio.budget(), 10);
}

#[test]
fn animator_deltas_feed_back_into_the_active_system() {
    let cfg = config(&[]);
    let mut studio = Studio::new(&cfg, W, H);
    let before = *studio.params();
    studio.set_animator(Box::new(|_t, _audio| {
        Some(ParamDeltas { slots: [0.01, 0.0, 0.0, 0.0, 0.0, 0.0] })
    }));
    studio.tick(0.0, &AudioFeatures::default());
    assert_ne!(*studio.params(), before);

    // Direct deltas work headlessly as well.
    let mid = *studio.params();
    studio.apply_deltas(&ParamDeltas { slots: [0.01, 0.0, 0.0, 0.0, 0.0, 0.0] });
    assert_ne!(*studio.params(), mid);
}
