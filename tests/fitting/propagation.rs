use approx::assert_relative_eq;
use helixfit::fit::{ScatteringModel, ThinLayer};
use helixfit::linalg::Vector5;
use helixfit::track::Covariance;
use helixfit::{Guard, HelixKF, TrackError, TrackState};
use pretty_env_logger::try_init;
use rstest::*;

use crate::tpc_helix;

#[fixture]
fn truth_state() -> TrackState {
    let sim = tpc_helix();
    let params = sim.truth_params(sim.x0).unwrap();
    let mut covar =
        Covariance::from_diagonal(&Vector5::new(2.5e-3, 6.4e-3, 1e-4, 1e-4, 1e-7));
    covar[(2, 0)] = 1e-5;
    covar[(4, 0)] = 2e-6;
    covar[(4, 2)] = 1e-6;
    covar[(3, 1)] = 3e-5;
    TrackState::new(sim.x0, params, covar)
}

#[rstest]
#[case(ScatteringModel::None)]
#[case(ScatteringModel::ThinLayer(ThinLayer::argon_pion()))]
fn zero_length_propagation_is_identity(truth_state: TrackState, #[case] scattering: ScatteringModel) {
    let _ = try_init();
    let predicted = truth_state.predict(truth_state.x, 5.0, &scattering).unwrap();
    assert_eq!(predicted, truth_state);
}

#[rstest]
fn predict_matches_propagate_to(truth_state: TrackState) {
    let _ = try_init();
    let kf = HelixKF::new(5.0).with_scattering(ScatteringModel::ThinLayer(ThinLayer::argon_pion()));
    let mut state = truth_state;
    for x in [87.5, 90.0, 100.0, 95.0] {
        let predicted = kf.predict(&state, x).unwrap();
        kf.propagate_to(&mut state, x).unwrap();
        assert_eq!(predicted, state);
    }
}

#[rstest]
fn follows_the_true_helix(truth_state: TrackState) {
    let sim = tpc_helix();
    let kf = HelixKF::new(5.0);
    // The bending plane is exact over any distance
    let far = kf.predict(&truth_state, 150.0).unwrap();
    let truth = sim.truth_params(150.0).unwrap();
    assert_relative_eq!(far.y(), truth[0], epsilon = 1e-9);
    // The circle parameters do not change along the arc
    assert_eq!(far.eta(), truth_state.eta());
    assert_eq!(far.tan_dip(), truth_state.tan_dip());
    assert_eq!(far.curvature(), truth_state.curvature());

    // Along z, row by row
    let mut state = truth_state;
    for row in 1..=20 {
        let x = sim.x0 + 2.5 * row as f64;
        kf.propagate_to(&mut state, x).unwrap();
        let truth = sim.truth_params(x).unwrap();
        assert_relative_eq!(state.y(), truth[0], epsilon = 1e-9);
        assert_relative_eq!(state.z(), truth[1], epsilon = 1e-4);
    }
}

#[rstest]
fn backward_propagation_returns(truth_state: TrackState) {
    let kf = HelixKF::new(5.0);
    let forward = kf.predict(&truth_state, 110.0).unwrap();
    let back = kf.predict(&forward, truth_state.x).unwrap();
    assert_relative_eq!(back.params, truth_state.params, epsilon = 1e-10);
    assert_relative_eq!(
        back.covar.to_matrix(),
        truth_state.covar.to_matrix(),
        epsilon = 1e-12,
        max_relative = 1e-9
    );
}

#[rstest]
fn arc_guard_leaves_the_state_untouched(truth_state: TrackState) {
    let kf = HelixKF::new(5.0);
    // The local sine reaches 0.9 near x = 738 cm
    let mut state = truth_state;
    match kf.propagate_to(&mut state, 740.0) {
        Err(TrackError::PropagationFailed { guard }) => assert_eq!(guard, Guard::Arc),
        other => panic!("expected a failed propagation, got {other:?}"),
    }
    assert_eq!(state, truth_state);
    assert!(kf.predict(&state, f64::NAN).is_err());
    assert_eq!(state, truth_state);
}

#[rstest]
fn scattering_only_inflates_the_angles(truth_state: TrackState) {
    let plain = truth_state.predict(120.0, 5.0, &ScatteringModel::None).unwrap();
    let scattered = truth_state
        .predict(120.0, 5.0, &ScatteringModel::ThinLayer(ThinLayer::argon_pion()))
        .unwrap();
    assert_eq!(plain.params, scattered.params);
    assert_eq!(plain.covar[(0, 0)], scattered.covar[(0, 0)]);
    assert_eq!(plain.covar[(1, 1)], scattered.covar[(1, 1)]);
    assert_eq!(plain.covar[(1, 0)], scattered.covar[(1, 0)]);
    for i in 2..5 {
        assert!(scattered.covar[(i, i)] > plain.covar[(i, i)]);
    }

    // Without a field the momentum is unknown, and the covariance is only transported
    let no_field = truth_state
        .predict(120.0, 0.0, &ScatteringModel::ThinLayer(ThinLayer::argon_pion()))
        .unwrap();
    assert_eq!(no_field, plain);
}
