//! End-to-end tests of the analytics pipeline: loading, COP trajectory,
//! heatmap synthesis and confidence ellipse.

use approx::assert_relative_eq;
use pressure_sway::{
    compute_cop, compute_cop_trajectory, confidence_ellipse, synthesize_field, CopPoint, Frame,
    FrameSeries, SensorGeometry, Session, SwayConfig, SwayError,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f64::consts::PI;

// =============================================================================
// GENERATORS
// =============================================================================

fn square_geometry() -> SensorGeometry {
    SensorGeometry::new(vec![[0.0, 0.0], [10.0, 0.0], [0.0, 10.0], [10.0, 10.0]]).unwrap()
}

/// Draw `n` points from a bivariate normal centered at `mean`, via
/// Box-Muller and the Cholesky factor of `[[sxx, sxy], [sxy, syy]]`.
fn sample_bivariate_normal(
    n: usize,
    mean: [f64; 2],
    sxx: f64,
    sxy: f64,
    syy: f64,
    seed: u64,
) -> Vec<[f64; 2]> {
    let mut rng = StdRng::seed_from_u64(seed);
    let l11 = sxx.sqrt();
    let l21 = sxy / l11;
    let l22 = (syy - l21 * l21).sqrt();

    (0..n)
        .map(|_| {
            let u1: f64 = 1.0 - rng.gen::<f64>();
            let u2: f64 = rng.gen::<f64>();
            let r = (-2.0 * u1.ln()).sqrt();
            let z1 = r * (2.0 * PI * u2).cos();
            let z2 = r * (2.0 * PI * u2).sin();
            [mean[0] + l11 * z1, mean[1] + l21 * z1 + l22 * z2]
        })
        .collect()
}

/// Random frames where only a random subset of sensors carries load.
fn random_sparse_frames(n: usize, sensors: usize, seed: u64) -> Vec<Vec<f64>> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|_| {
            (0..sensors)
                .map(|_| {
                    if rng.gen_bool(0.4) {
                        rng.gen_range(0.0..1500.0)
                    } else {
                        0.0
                    }
                })
                .collect()
        })
        .collect()
}

// =============================================================================
// HULL HELPERS
// =============================================================================

/// Counter-clockwise convex hull (monotone chain). Collinear input yields
/// its two endpoints, a single point yields itself.
fn convex_hull(mut points: Vec<[f64; 2]>) -> Vec<[f64; 2]> {
    points.sort_by(|a, b| a[0].total_cmp(&b[0]).then(a[1].total_cmp(&b[1])));
    points.dedup();
    if points.len() < 3 {
        return points;
    }

    let mut lower: Vec<[f64; 2]> = Vec::new();
    for &p in &points {
        while lower.len() >= 2 && cross(lower[lower.len() - 2], lower[lower.len() - 1], p) <= 0.0 {
            lower.pop();
        }
        lower.push(p);
    }
    let mut upper: Vec<[f64; 2]> = Vec::new();
    for &p in points.iter().rev() {
        while upper.len() >= 2 && cross(upper[upper.len() - 2], upper[upper.len() - 1], p) <= 0.0 {
            upper.pop();
        }
        upper.push(p);
    }
    lower.pop();
    upper.pop();
    lower.extend(upper);
    lower
}

fn cross(o: [f64; 2], a: [f64; 2], b: [f64; 2]) -> f64 {
    (a[0] - o[0]) * (b[1] - o[1]) - (a[1] - o[1]) * (b[0] - o[0])
}

fn distance(a: [f64; 2], b: [f64; 2]) -> f64 {
    (b[0] - a[0]).hypot(b[1] - a[1])
}

/// Whether `p` lies in the hull, within `eps` of its boundary.
fn in_convex_hull(hull: &[[f64; 2]], p: [f64; 2], eps: f64) -> bool {
    match hull {
        [] => false,
        [a] => distance(*a, p) <= eps,
        [a, b] => {
            let len = distance(*a, *b);
            let along = (p[0] - a[0]) * (b[0] - a[0]) + (p[1] - a[1]) * (b[1] - a[1]);
            cross(*a, *b, p).abs() <= eps * len
                && along >= -eps * len
                && along <= len * len + eps * len
        }
        _ => (0..hull.len()).all(|i| {
            let (a, b) = (hull[i], hull[(i + 1) % hull.len()]);
            cross(a, b, p) >= -eps * distance(a, b)
        }),
    }
}

// =============================================================================
// TRAJECTORY
// =============================================================================

#[test]
fn test_cop_reference_examples() {
    let geometry = square_geometry();
    let cop = |readings: Vec<f64>| {
        compute_cop(&Frame::try_new(readings, &geometry).unwrap(), &geometry).unwrap()
    };

    assert_eq!(cop(vec![10.0, 0.0, 0.0, 0.0]), CopPoint::Defined([0.0, 0.0]));
    assert_eq!(cop(vec![0.0, 0.0, 0.0, 0.0]), CopPoint::Undefined);
    let [x, y] = cop(vec![10.0; 4]).coords().unwrap();
    assert_relative_eq!(x, 5.0);
    assert_relative_eq!(y, 5.0);
}

#[test]
fn test_hull_check_is_stricter_than_bounds() {
    let triangle = convex_hull(vec![[0.0, 0.0], [10.0, 0.0], [0.0, 10.0]]);
    assert_eq!(triangle.len(), 3);
    assert!(in_convex_hull(&triangle, [2.0, 2.0], 1e-9));
    assert!(in_convex_hull(&triangle, [5.0, 5.0], 1e-9));
    // Inside the bounding box, outside the triangle
    assert!(!in_convex_hull(&triangle, [9.0, 9.0], 1e-9));

    let segment = convex_hull(vec![[0.0, 0.0], [5.0, 5.0], [10.0, 10.0]]);
    assert_eq!(segment, vec![[0.0, 0.0], [10.0, 10.0]]);
    assert!(in_convex_hull(&segment, [3.0, 3.0], 1e-9));
    assert!(!in_convex_hull(&segment, [3.0, 4.0], 1e-9));
    assert!(!in_convex_hull(&segment, [11.0, 11.0], 1e-9));
}

#[test]
fn test_cop_within_hull_of_loaded_sensors() {
    let geometry = SensorGeometry::insole16();
    let rows = random_sparse_frames(300, geometry.len(), 11);
    let series = FrameSeries::from_rows(rows, &geometry).unwrap();
    let cops = compute_cop_trajectory(&series, &geometry).unwrap();

    for (frame, cop) in series.iter().zip(&cops) {
        let loaded: Vec<[f64; 2]> = frame
            .readings()
            .iter()
            .zip(geometry.positions())
            .filter(|(z, _)| **z > 0.0)
            .map(|(_, &p)| p)
            .collect();

        if loaded.is_empty() {
            assert_eq!(*cop, CopPoint::Undefined);
            continue;
        }

        let point = cop.coords().expect("loaded frame must have a COP");
        let hull = convex_hull(loaded);
        assert!(
            in_convex_hull(&hull, point, 1e-9),
            "COP {point:?} outside hull {hull:?}"
        );
    }
}

#[test]
fn test_cop_in_triangle_of_three_loaded_sensors() {
    let geometry = square_geometry();
    let mut rng = StdRng::seed_from_u64(3);
    // Square corners (0,0), (10,0), (0,10): the far corner stays unloaded
    let triangle = convex_hull(geometry.positions()[..3].to_vec());

    for _ in 0..200 {
        let readings = vec![
            rng.gen_range(0.01..100.0),
            rng.gen_range(0.01..100.0),
            rng.gen_range(0.01..100.0),
            0.0,
        ];
        let frame = Frame::try_new(readings, &geometry).unwrap();
        let [x, y] = compute_cop(&frame, &geometry).unwrap().coords().unwrap();
        assert!(in_convex_hull(&triangle, [x, y], 1e-9));
        assert!(x + y <= 10.0 + 1e-9);
    }
}

#[test]
fn test_cop_independent_of_neighbours() {
    let geometry = SensorGeometry::insole16();
    let rows = random_sparse_frames(50, geometry.len(), 5);
    let series = FrameSeries::from_rows(rows, &geometry).unwrap();
    let cops = compute_cop_trajectory(&series, &geometry).unwrap();

    // Recomputing any frame in isolation, in any order, gives the same COP
    for (i, frame) in series.iter().enumerate().rev() {
        let alone = compute_cop(frame, &geometry).unwrap();
        match (alone, cops[i]) {
            (CopPoint::Defined(a), CopPoint::Defined(b)) => {
                assert_relative_eq!(a[0], b[0], epsilon = 1e-12);
                assert_relative_eq!(a[1], b[1], epsilon = 1e-12);
            }
            (a, b) => assert_eq!(a, b),
        }
    }
}

#[test]
fn test_frame_from_other_geometry_rejected() {
    let square = square_geometry();
    let insole = SensorGeometry::insole16();
    let frame = Frame::try_new(vec![10.0, 0.0, 0.0, 0.0], &square).unwrap();

    assert!(matches!(
        compute_cop(&frame, &insole),
        Err(SwayError::LengthMismatch {
            expected: 16,
            actual: 4,
            ..
        })
    ));
    assert!(matches!(
        synthesize_field(&frame, &insole, &SwayConfig::default()),
        Err(SwayError::LengthMismatch { .. })
    ));

    let series = FrameSeries::from_rows(vec![vec![1.0; 4]; 3], &square).unwrap();
    assert!(compute_cop_trajectory(&series, &insole).is_err());
    assert!(Session::new(insole, series, SwayConfig::default()).is_err());
}

// =============================================================================
// FIELD
// =============================================================================

#[test]
fn test_field_on_canvas_for_insole() {
    let geometry = SensorGeometry::insole16();
    let config = SwayConfig::default();
    let frame = Frame::try_new((1..=16).map(f64::from).collect(), &geometry).unwrap();

    let field = synthesize_field(&frame, &geometry, &config).unwrap();
    assert!(!field.is_empty());
    for s in field.samples() {
        assert!((0.0..120.0).contains(&s.x), "x = {}", s.x);
        assert!((0.0..300.0).contains(&s.y), "y = {}", s.y);
    }
}

#[test]
fn test_field_peak_at_sensor() {
    let geometry = SensorGeometry::new(vec![[42.5, 100.25]]).unwrap();
    let frame = Frame::try_new(vec![777.0], &geometry).unwrap();
    let field = synthesize_field(&frame, &geometry, &SwayConfig::default()).unwrap();
    let peak = field
        .samples()
        .iter()
        .find(|s| s.x == 42.5 && s.y == 100.25)
        .expect("sample at sensor position");
    assert_eq!(peak.value, 777.0);
}

// =============================================================================
// DISPERSION
// =============================================================================

#[test]
fn test_ellipse_reference_example() {
    let points = [[0.0, 0.0], [2.0, 0.0], [0.0, 2.0], [2.0, 2.0]];
    let ellipse = confidence_ellipse(&points, &SwayConfig::default());
    let shape = ellipse.shape().unwrap();

    assert_eq!(shape.center, [1.0, 1.0]);
    assert_relative_eq!(shape.semi_axes[0], shape.semi_axes[1], epsilon = 1e-12);

    // Axis-aligned circle: extremes lie on the lines through the center
    let xs: Vec<f64> = ellipse.points().iter().map(|p| p[0]).collect();
    let ys: Vec<f64> = ellipse.points().iter().map(|p| p[1]).collect();
    let max_x = xs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let min_x = xs.iter().copied().fold(f64::INFINITY, f64::min);
    let max_y = ys.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let min_y = ys.iter().copied().fold(f64::INFINITY, f64::min);
    assert_relative_eq!(max_x - 1.0, 1.0 - min_x, epsilon = 1e-9);
    assert_relative_eq!(max_y - 1.0, 1.0 - min_y, epsilon = 1e-9);
    assert_relative_eq!(max_x - min_x, max_y - min_y, epsilon = 1e-9);
}

#[test]
fn test_ellipse_empty_below_three_points() {
    let config = SwayConfig::default();
    assert!(confidence_ellipse(&[], &config).points().is_empty());
    assert!(confidence_ellipse(&[[1.0, 1.0]], &config).points().is_empty());
    assert!(confidence_ellipse(&[[1.0, 1.0], [2.0, 3.0]], &config)
        .points()
        .is_empty());
}

#[test]
fn test_ellipse_collinear_does_not_fail() {
    let points: Vec<[f64; 2]> = (0..10).map(|i| [f64::from(i), 3.0]).collect();
    let ellipse = confidence_ellipse(&points, &SwayConfig::default());
    let shape = ellipse.shape().unwrap();
    assert_eq!(ellipse.points().len(), 100);
    assert!(shape.semi_axes[1] < 1e-9);
    assert!(ellipse.points().iter().all(|p| (p[1] - 3.0).abs() < 1e-9));
}

#[test]
fn test_ellipse_converges_to_population_axes() {
    // Sigma = [[4, 1.5], [1.5, 1]]
    let (sxx, sxy, syy): (f64, f64, f64) = (4.0, 1.5, 1.0);
    let half_trace = (sxx + syy) / 2.0;
    let disc = (half_trace * half_trace - (sxx * syy - sxy * sxy)).sqrt();
    let expected = [2.45 * (half_trace + disc).sqrt(), 2.45 * (half_trace - disc).sqrt()];
    let expected_angle = sxy.atan2(half_trace + disc - syy);

    let points = sample_bivariate_normal(50_000, [60.0, 150.0], sxx, sxy, syy, 42);
    let ellipse = confidence_ellipse(&points, &SwayConfig::default());
    let shape = ellipse.shape().unwrap();

    assert_relative_eq!(shape.center[0], 60.0, epsilon = 0.05);
    assert_relative_eq!(shape.center[1], 150.0, epsilon = 0.05);
    assert_relative_eq!(shape.semi_axes[0], expected[0], max_relative = 0.03);
    assert_relative_eq!(shape.semi_axes[1], expected[1], max_relative = 0.03);

    // Axis direction is only defined up to sign
    let mut delta = (shape.angle - expected_angle).rem_euclid(PI);
    if delta > PI / 2.0 {
        delta -= PI;
    }
    assert!(delta.abs() < 0.03, "major axis off by {delta} rad");
}

#[test]
fn test_ellipse_covers_about_95_percent() {
    let points = sample_bivariate_normal(20_000, [0.0, 0.0], 2.0, -0.8, 1.0, 7);
    let ellipse = confidence_ellipse(&points, &SwayConfig::default());
    let shape = ellipse.shape().unwrap();

    let (sin, cos) = shape.angle.sin_cos();
    let inside = points
        .iter()
        .filter(|p| {
            let dx = p[0] - shape.center[0];
            let dy = p[1] - shape.center[1];
            let u = (dx * cos + dy * sin) / shape.semi_axes[0];
            let v = (-dx * sin + dy * cos) / shape.semi_axes[1];
            u * u + v * v <= 1.0
        })
        .count();
    let fraction = inside as f64 / points.len() as f64;
    assert!((0.94..0.96).contains(&fraction), "coverage {fraction}");
}

// =============================================================================
// SESSION
// =============================================================================

#[test]
fn test_session_from_csv() {
    let geometry = square_geometry();
    let frames = FrameSeries::from_csv_str(
        "10,0,0,0\n0,0,0,0\n10,10,10,10\n0,10,0,0\n0,0,10,0\n",
        &geometry,
    )
    .unwrap();
    let session = Session::new(geometry, frames, SwayConfig::default()).unwrap();

    let last = session.frame_output(4).unwrap();
    assert_eq!(last.display_number, 5);
    assert_eq!(last.cop, CopPoint::Defined([0.0, 10.0]));
    assert_eq!(
        last.trajectory,
        vec![[0.0, 0.0], [5.0, 5.0], [10.0, 0.0], [0.0, 10.0]]
    );
    assert_eq!(last.ellipse.points().len(), 100);

    // Prefix of the same session excludes later frames
    let early = session.frame_output(2).unwrap();
    assert_eq!(early.trajectory, vec![[0.0, 0.0], [5.0, 5.0]]);
    assert!(early.ellipse.is_empty());
}

#[test]
fn test_malformed_input_fails_at_load() {
    let geometry = square_geometry();
    assert!(matches!(
        Frame::try_new(vec![10.0, 10.0], &geometry),
        Err(SwayError::LengthMismatch { actual: 2, .. })
    ));
    assert!(matches!(
        Frame::try_new(vec![5.0, -5.0, 1.0, 0.0], &geometry),
        Err(SwayError::NegativeReading { sensor: 1, .. })
    ));
    assert!(matches!(
        FrameSeries::from_json_str("[]", &geometry),
        Err(SwayError::EmptySeries)
    ));
    assert!(matches!(
        FrameSeries::from_json_str("[[1, 2, 3, 4, 5]]", &geometry),
        Err(SwayError::LengthMismatch { .. })
    ));
    assert!(matches!(
        FrameSeries::from_json_str("[[1, 2, 3, -4]]", &geometry),
        Err(SwayError::NegativeReading { .. })
    ));
}

#[test]
fn test_export_serializes() {
    let geometry = square_geometry();
    let frames = FrameSeries::from_json_str("[[1, 0, 0, 0], [0, 0, 0, 0]]", &geometry).unwrap();
    let config = SwayConfig::default().with_sigma(1.0);
    let session = Session::new(geometry, frames, config).unwrap();

    let json = serde_json::to_value(session.all_outputs().unwrap()).unwrap();
    let outputs = json.as_array().unwrap();
    assert_eq!(outputs.len(), 2);
    assert_eq!(outputs[0]["cop"], serde_json::json!([0.0, 0.0]));
    assert!(outputs[1]["cop"].is_null());
    assert!(outputs[0]["field"].as_array().unwrap().len() > 0);
}
