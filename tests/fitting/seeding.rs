use approx::assert_relative_eq;
use helixfit::fit::{Filter, GateConfig};
use helixfit::track::PriorTrajectory;
use helixfit::{Guard, HelixKF, SpacePoint, TrackError, TrackState};
use pretty_env_logger::try_init;
use rstest::*;

use crate::{measured, tpc_helix};

#[fixture]
fn gate() -> GateConfig {
    GateConfig::default()
}

#[fixture]
fn prior() -> PriorTrajectory {
    PriorTrajectory {
        x0: 85.0,
        phi0: 0.08,
        tan_dip: 0.35,
        charge: 1,
        pt: 1.0,
    }
}

fn scenario_a() -> [SpacePoint; 3] {
    [
        SpacePoint::new(0.0, 0.0, 0.0, 1e-4, 1e-4),
        SpacePoint::new(1.0, 0.10, 0.05, 1e-4, 1e-4),
        SpacePoint::new(2.0, 0.22, 0.095, 1e-4, 1e-4),
    ]
}

#[rstest]
#[case(SpacePoint::new(85.0, 1.5, -3.0, 2.5e-3, 6.4e-3))]
#[case(SpacePoint::new(87.5, -0.25, 12.0, 1e-2, 1e-2))]
#[case(SpacePoint::new(90.0, 0.0, 0.0, 1e-6, 4e-6))]
fn seed_from_prior_copies_the_point(
    gate: GateConfig,
    prior: PriorTrajectory,
    #[case] point: SpacePoint,
) {
    let _ = try_init();
    let state = TrackState::seed_from_prior(&prior, &point, 5.0, &gate).unwrap();
    assert_eq!(state.x, point.x);
    assert_eq!(state.y(), point.y);
    assert_eq!(state.z(), point.z);
    assert_eq!(state.covar[(0, 0)], point.sigma_y2);
    assert_eq!(state.covar[(1, 1)], point.sigma_z2);
    assert_eq!(state.tan_dip(), prior.tan_dip);
    assert_eq!(state.curvature(), prior.curvature(5.0));
    assert_eq!(state.chi2, 0.0);
    assert_eq!(state.hits, 1);
}

#[rstest]
fn seed_from_prior_reproduces_momentum(gate: GateConfig, prior: PriorTrajectory) {
    let point = SpacePoint::with_resolution(85.0, 0.0, 0.0, 0.05, 0.05);
    let state = TrackState::seed_from_prior(&prior, &point, 5.0, &gate).unwrap();
    assert_relative_eq!(state.pt(5.0), 1.0, max_relative = 1e-12);
    assert_relative_eq!(state.q_over_pt(5.0), 1.0, max_relative = 1e-12);
    // The local direction is that of the prior
    assert_relative_eq!(state.local_sine(), prior.phi0.sin(), max_relative = 1e-12);
}

#[rstest]
fn scenario_a_three_points(gate: GateConfig) {
    let _ = try_init();
    let [p1, p2, p3] = scenario_a();
    let state = TrackState::seed_from_three_points(&p1, &p2, &p3, &gate).unwrap();
    println!("{state}");
    assert_eq!(state.x, 0.0);
    assert_eq!(state.hits, 3);
    assert!(state.covar.diagonal().iter().all(|var| *var > 0.0));
    assert!(state.curvature() > 0.0, "y bends upwards");
    // Same seed through the filter, which expects the points in fit order
    let kf = HelixKF::new(0.5);
    let (filtered, consumed) = kf.seed(&[p3, p2, p1]).unwrap();
    assert_eq!(consumed, 3);
    assert_eq!(filtered.x, state.x);
    assert_eq!(filtered.params, state.params);
}

#[rstest]
fn scenario_b_steep_prior(gate: GateConfig, mut prior: PriorTrajectory) {
    prior.tan_dip = 1.3;
    let point = SpacePoint::with_resolution(85.0, 0.0, 0.0, 0.05, 0.05);
    match TrackState::seed_from_prior(&prior, &point, 5.0, &gate) {
        Err(TrackError::SeedRejected { guard }) => assert_eq!(guard, Guard::Dip),
        other => panic!("expected a rejected seed, got {other:?}"),
    }
    let kf = HelixKF::new(5.0).with_prior(prior);
    assert!(kf.seed(&[point]).is_err());
}

#[rstest]
fn prior_at_the_curvature_floor(gate: GateConfig, mut prior: PriorTrajectory) {
    // 20 MeV/c in 5 kG, i.e. a radius of about 13 cm
    prior.pt = 0.02;
    let point = SpacePoint::with_resolution(85.0, 0.0, 0.0, 0.05, 0.05);
    let err = TrackState::seed_from_prior(&prior, &point, 5.0, &gate).unwrap_err();
    assert_eq!(err.guard(), Some(Guard::Curvature));
}

#[rstest]
// Circle of radius 10 cm through the origin
#[case([(0.0, 0.0, 0.0), (1.0, 0.050_126, 0.0), (2.0, 0.202_041, 0.0)], Guard::Curvature)]
#[case([(0.0, 0.0, 0.0), (1.0, 0.10, 1.5), (2.0, 0.22, 3.0)], Guard::Dip)]
#[case([(0.0, 0.0, 0.0), (1.0, 0.10, 20.0), (2.0, 0.22, 0.0)], Guard::ZConsistency)]
#[case([(0.0, 0.0, 0.0), (1.0, 0.10, 0.5), (2.0, 0.20, 1.0)], Guard::Collinear)]
// Heading at about 68 degrees from x, i.e. a local sine of about 0.93
#[case([(0.0, 0.0, 0.0), (1.0, 2.5, 0.0), (2.0, 5.1, 0.0)], Guard::Arc)]
#[case([(0.0, 0.0, 0.0), (0.0, 0.0, 0.0), (2.0, 0.20, 1.0)], Guard::Collinear)]
fn three_point_rejections(gate: GateConfig, #[case] coords: [(f64, f64, f64); 3], #[case] guard: Guard) {
    let [p1, p2, p3] = coords.map(|(x, y, z)| SpacePoint::with_resolution(x, y, z, 0.01, 0.01));
    match TrackState::seed_from_three_points(&p1, &p2, &p3, &gate) {
        Err(TrackError::SeedRejected { guard: rejected }) => assert_eq!(rejected, guard),
        other => panic!("expected a seed rejected by the {guard} guard, got {other:?}"),
    }
}

#[rstest]
fn prior_beyond_the_arc_limit(gate: GateConfig, mut prior: PriorTrajectory) {
    // The local sine at the starting point is sin(1.2), about 0.93
    prior.phi0 = 1.2;
    let point = SpacePoint::with_resolution(85.0, 0.0, 0.0, 0.05, 0.05);
    match TrackState::seed_from_prior(&prior, &point, 5.0, &gate) {
        Err(TrackError::SeedRejected { guard }) => assert_eq!(guard, Guard::Arc),
        other => panic!("expected a seed rejected by the arc guard, got {other:?}"),
    }
    let kf = HelixKF::new(5.0).with_prior(prior);
    assert_eq!(kf.seed(&[point]).unwrap_err().guard(), Some(Guard::Arc));
}

#[test]
fn three_point_seed_on_a_helix() {
    let sim = tpc_helix().with_noise(0.0, 0.0);
    let points = measured(&sim, 0);
    let kf = HelixKF::default();
    let (state, _) = kf.seed(&points).unwrap();

    let truth = sim.truth_params(points[2].x).unwrap();
    assert_eq!(state.x, points[2].x);
    assert_eq!(state.y(), truth[0]);
    assert_eq!(state.z(), truth[1]);
    assert_relative_eq!(state.eta(), truth[2], max_relative = 1e-6);
    assert_relative_eq!(state.curvature(), truth[4], max_relative = 1e-6);
    // The dip is measured over the chord
    assert_relative_eq!(state.tan_dip(), truth[3], max_relative = 1e-4);
}
