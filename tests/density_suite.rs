use attractor_studio::density::{DensityBuffer, compute_density, fill_pixel_fractal, in_cardioid_or_bulb};
use attractor_studio::dynamics::{
    AttractorParams, EscapeSampling, Lcg31, PixelFractal, System, SystemKind,
};
use attractor_studio::orbit::trace_orbit;

fn system(params: AttractorParams) -> System {
    System::new(params, 42)
}

fn sampling(seed: u32, anti: bool) -> EscapeSampling {
    EscapeSampling {
        max_iter: 50,
        samples: 20_000,
        anti,
        center_x: -0.5,
        center_y: 0.0,
        zoom: 1.0,
        sample_seed: seed,
    }
}

fn mandelbrot_view() -> PixelFractal {
    PixelFractal {
        max_iter: 200,
        center_x: -0.5,
        center_y: 0.0,
        zoom: 1.0,
        julia: false,
        julia_r: 0.0,
        julia_i: 0.0,
    }
}

// ── Trajectory histograms ───────────────────────────────────────────────────

#[test]
fn dejong_histogram_sum_equals_budget() {
    // At scale min(w,h)/4.2 the whole [-2,2] range lands in-frame, so no
    // samples are dropped and the sum is exactly the budget.
    let sys = system(AttractorParams::preset(SystemKind::DeJong));
    let buf = compute_density(&sys, 200, 200, 100_000, 0.0);
    assert_eq!(buf.sum(), 100_000);
    assert!(buf.max() > 1, "density never concentrated");
}

#[test]
fn histogram_sum_is_monotone_in_budget() {
    let sys = system(AttractorParams::preset(SystemKind::Clifford));
    let small = compute_density(&sys, 100, 100, 10_000, 0.0);
    let large = compute_density(&sys, 100, 100, 20_000, 0.0);
    assert!(large.sum() >= small.sum());
    assert_eq!(small.sum(), 10_000);
    assert_eq!(large.sum(), 20_000);
}

#[test]
fn lorenz_histogram_lands_mostly_in_frame() {
    let sys = system(AttractorParams::preset(SystemKind::Lorenz));
    let buf = compute_density(&sys, 160, 160, 50_000, 0.0);
    // The projection is tuned to keep the attractor in frame; allow a small
    // out-of-bounds fraction but require the bulk of the mass.
    assert!(buf.sum() > 40_000, "sum = {}", buf.sum());
}

#[test]
fn diverging_lorenz_drops_samples_instead_of_panicking() {
    let sys = system(AttractorParams::Lorenz { sigma: 1e12, rho: 1e12, beta: -1e12 });
    let buf = compute_density(&sys, 64, 64, 5_000, 0.0);
    assert!(buf.sum() <= 5_000);
}

#[test]
fn curl_noise_splits_budget_across_particles() {
    let sys = system(AttractorParams::preset(SystemKind::CurlNoise));
    // 50_000 / 5000 particles = 10 steps each; particles start in-frame and
    // barely move per step, so nearly everything lands in bounds.
    let buf = compute_density(&sys, 128, 128, 50_000, 0.3);
    assert!(buf.sum() > 0);
    assert!(buf.sum() <= 50_000);
}

// ── Buffer hygiene ──────────────────────────────────────────────────────────

#[test]
fn bump_rejects_nonfinite_and_out_of_bounds() {
    let mut buf = DensityBuffer::new(10, 10);
    assert!(!buf.bump(f64::NAN, 5.0));
    assert!(!buf.bump(5.0, f64::INFINITY));
    assert!(!buf.bump(-0.5, 5.0));
    assert!(!buf.bump(10.0, 5.0));
    assert!(buf.bump(9.9, 0.0));
    assert_eq!(buf.sum(), 1);
    assert_eq!(buf.get(9, 0), 1);
}

// ── Sampled escape-time systems ─────────────────────────────────────────────

#[test]
fn cardioid_and_bulb_containment() {
    assert!(in_cardioid_or_bulb(0.0, 0.0));
    assert!(in_cardioid_or_bulb(-0.1, 0.1));
    assert!(in_cardioid_or_bulb(-1.0, 0.0)); // period-2 bulb
    assert!(!in_cardioid_or_bulb(1.0, 1.0));
    assert!(!in_cardioid_or_bulb(-0.75, 0.5));
}

#[test]
fn buddhabrot_is_deterministic_per_seed() {
    let a = compute_density(&system(AttractorParams::Buddhabrot(sampling(12345, false))), 120, 120, 0, 0.0);
    let b = compute_density(&system(AttractorParams::Buddhabrot(sampling(12345, false))), 120, 120, 0, 0.0);
    let c = compute_density(&system(AttractorParams::Buddhabrot(sampling(999, false))), 120, 120, 0, 0.0);
    assert_eq!(a.cells(), b.cells());
    assert_ne!(a.cells(), c.cells());
    assert!(a.sum() > 0);
}

#[test]
fn anti_buddhabrot_accumulates_nonescaping_orbits() {
    let normal = compute_density(&system(AttractorParams::Buddhabrot(sampling(12345, false))), 100, 100, 0, 0.0);
    let anti = compute_density(&system(AttractorParams::Buddhabrot(sampling(12345, true))), 100, 100, 0, 0.0);
    assert!(anti.sum() > 0);
    assert_ne!(normal.cells(), anti.cells());
}

#[test]
fn burning_ship_renders_density() {
    let mut p = sampling(12345, false);
    p.center_y = -0.4;
    let buf = compute_density(&system(AttractorParams::BurningShip(p)), 100, 100, 0, 0.0);
    assert!(buf.sum() > 0);
}

// ── Direct per-pixel fractal ────────────────────────────────────────────────

#[test]
fn mandelbrot_center_is_interior_and_edges_escape() {
    let mut buf = DensityBuffer::new(200, 200);
    fill_pixel_fractal(&mandelbrot_view(), &mut buf);

    // Image center is c = -0.5, well inside the main cardioid.
    assert_eq!(buf.get(100, 100), 0);

    // The corner maps far outside radius 2 and escapes almost immediately.
    let corner = buf.get(0, 0);
    assert!((1..=1000).contains(&corner), "corner value {corner}");

    // Every escaped value is quantized into 1..=1000.
    assert!(buf.cells().iter().all(|&v| v <= 1000));
    assert!(buf.cells().iter().any(|&v| v > 0));
}

#[test]
fn julia_mode_uses_fixed_constant() {
    let p = PixelFractal {
        max_iter: 150,
        center_x: 0.0,
        center_y: 0.0,
        zoom: 1.0,
        julia: true,
        julia_r: -0.123,
        julia_i: 0.745,
    };
    let mut buf = DensityBuffer::new(120, 120);
    fill_pixel_fractal(&p, &mut buf);
    assert!(buf.cells().iter().any(|&v| v == 0), "no interior at all");
    assert!(buf.cells().iter().any(|&v| v > 0), "nothing escaped");
    assert!(buf.cells().iter().all(|&v| v <= 1000));
}

// ── Orbit tracer ────────────────────────────────────────────────────────────

#[test]
fn traced_orbits_end_escaped_and_long_enough() {
    let params = AttractorParams::Buddhabrot(sampling(12345, false));
    let mut rng = Lcg31::new(12345);
    for _ in 0..10 {
        let orbit = trace_orbit(&params, &mut rng);
        assert!(!orbit.is_empty(), "tracer found no orbit");
        assert!(orbit.len() > 5);
        let (zr, zi) = *orbit.last().unwrap();
        assert!(zr * zr + zi * zi > 4.0, "last point did not escape");
    }
}

#[test]
fn tracer_returns_empty_when_nothing_qualifies() {
    // max_iter too small for any orbit to clear the length gate; the
    // attempt budget must still terminate.
    let params = AttractorParams::Buddhabrot(EscapeSampling {
        max_iter: 3,
        samples: 0,
        anti: false,
        center_x: 0.0,
        center_y: 0.0,
        zoom: 1.0,
        sample_seed: 1,
    });
    let mut rng = Lcg31::new(1);
    assert!(trace_orbit(&params, &mut rng).is_empty());
}

#[test]
fn julia_tracer_produces_escaping_orbits() {
    let params = AttractorParams::Mandelbrot(PixelFractal {
        max_iter: 100,
        center_x: 0.0,
        center_y: 0.0,
        zoom: 1.0,
        julia: true,
        julia_r: -0.123,
        julia_i: 0.745,
    });
    let mut rng = Lcg31::new(77);
    let orbit = trace_orbit(&params, &mut rng);
    assert!(!orbit.is_empty());
    let (zr, zi) = *orbit.last().unwrap();
    assert!(zr * zr + zi * zi > 4.0);
}
