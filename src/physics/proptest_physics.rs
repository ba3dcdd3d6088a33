//! Property-based tests for the motion primitives using proptest.
//!
//! These tests verify curve shape, conservation and prediction invariants
//! across a wide range of inputs.

use bevy::math::DVec2;
use proptest::prelude::*;

use super::polynomial::Polynomial;
use super::trajectory::Trajectory;
use super::velocity::{CurveBranch, Velocity};
use crate::collision::elastic_collision;
use crate::prediction::predict_collision;
use crate::test_utils::assertions;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// A shaped curve peaks at `v_max` at `t_vertex` and is back to zero at
    /// twice that.
    #[test]
    fn prop_velocity_shape_hits_peak_and_zero(
        v_max in 0.01f64..100.0,
        t_vertex in 0.5f64..200.0,
    ) {
        let mut v = Velocity::default();
        v.solve_shape(v_max, t_vertex).unwrap();

        let peak = v.magnitude_at(t_vertex);
        prop_assert!((peak - v_max).abs() <= 1e-9 * v_max.max(1.0), "peak {peak} != {v_max}");

        let end = v.magnitude_at(2.0 * t_vertex);
        prop_assert!(end.abs() <= 1e-9 * v_max.max(1.0), "end {end} != 0");

        prop_assert!((v.t_vertex().unwrap() - t_vertex).abs() <= 1e-9 * t_vertex);
    }

    /// Placing the clock from a magnitude reproduces that magnitude.
    #[test]
    fn prop_calculate_t_inverts_curve(
        v_max in 0.1f64..50.0,
        t_vertex in 1.0f64..100.0,
        fraction in 0.01f64..0.99,
    ) {
        let mut v = Velocity::from_vector(DVec2::new(v_max * fraction, 0.0));
        v.solve_shape(v_max, t_vertex).unwrap();
        for branch in [CurveBranch::Rising, CurveBranch::Falling] {
            let t = v.calculate_t(branch);
            let m = v.magnitude_at(t);
            prop_assert!((m - v_max * fraction).abs() <= 1e-6 * v_max, "{branch:?}: {m}");
        }
    }

    /// Elastic response conserves total momentum.
    #[test]
    fn prop_elastic_collision_conserves_momentum(
        m1 in 0.1f64..10.0,
        m2 in 0.1f64..10.0,
        v1x in -10.0f64..10.0,
        v1y in -10.0f64..10.0,
        v2x in -10.0f64..10.0,
        v2y in -10.0f64..10.0,
        angle in 0.0f64..std::f64::consts::TAU,
    ) {
        let (v1, v2) = (DVec2::new(v1x, v1y), DVec2::new(v2x, v2y));
        let normal = DVec2::new(angle.cos(), angle.sin());
        let (v1_after, v2_after) = elastic_collision(m1, v1, m2, v2, normal);

        let before = assertions::total_momentum(&[(m1, v1), (m2, v2)]);
        let after = assertions::total_momentum(&[(m1, v1_after), (m2, v2_after)]);
        prop_assert!((before - after).length() <= 1e-9 * (1.0 + before.length()));

        // Kinetic energy is conserved too
        let ke = |m: f64, v: DVec2| 0.5 * m * v.length_squared();
        let (ke_before, ke_after) = (ke(m1, v1) + ke(m2, v2), ke(m1, v1_after) + ke(m2, v2_after));
        prop_assert!((ke_before - ke_after).abs() <= 1e-9 * (1.0 + ke_before));
    }

    /// Evenly spaced collinear samples carry no higher-order terms.
    #[test]
    fn prop_collinear_trajectory_is_linear(
        sx in -500.0f64..500.0,
        sy in -500.0f64..500.0,
        vx in -10.0f64..10.0,
        vy in -10.0f64..10.0,
    ) {
        let start = DVec2::new(sx, sy);
        let step = DVec2::new(vx, vy);
        let points: Vec<DVec2> = (0..4_i32).map(|i| start + step * f64::from(i)).collect();
        let traj = Trajectory::new(&points).unwrap();
        prop_assert!(traj.acceleration.length() < 1e-9);
        prop_assert!(traj.jerk.length() < 1e-9);
    }

    /// Head-on approach at constant speed predicts the analytic contact time.
    #[test]
    fn prop_head_on_prediction_matches_analytic(
        gap in 20.0f64..500.0,
        speed in 0.1f64..5.0,
        d_min in 1.0f64..19.0,
    ) {
        let own = Trajectory::new(&[DVec2::ZERO, DVec2::ZERO]).unwrap();
        let other = Trajectory::new(&[DVec2::new(gap + speed, 0.0), DVec2::new(gap, 0.0)]).unwrap();
        let prediction = predict_collision(&own, &other, d_min).unwrap();
        let expected = (gap - d_min) / speed;
        prop_assert!((prediction.time - expected).abs() <= 1e-6 * expected.max(1.0));
    }

    /// Every reported root actually is a root.
    #[test]
    fn prop_roots_evaluate_to_zero(
        roots in prop::collection::vec(-50.0f64..50.0, 1..6),
    ) {
        let p = roots.iter().fold(Polynomial::constant(1.0), |acc, &r| {
            &acc * &Polynomial::new(vec![-r, 1.0])
        });
        let bound = p.root_bound();
        for r in p.real_roots_in(-bound, bound) {
            let scale = roots.iter().map(|x| x.abs() + 1.0).product::<f64>();
            prop_assert!(p.eval(r).abs() <= 1e-6 * scale, "p({r}) = {}", p.eval(r));
        }
    }
}
