use approx::assert_relative_eq;
use helixfit::fit::{FitConfig, ScatteringModel, SeedingMode, ThinLayer};
use helixfit::io::ConfigRepr;
use helixfit::sim::{layers, HelixSim};
use helixfit::track::PriorTrajectory;
use helixfit::{FitProcess, HelixKF, SpacePoint, TrackError};
use pretty_env_logger::try_init;
use rstest::*;

use crate::{measured, tpc_helix};

#[fixture]
fn process() -> FitProcess<HelixKF> {
    FitProcess::new(HelixKF::new(5.0), None)
}

#[rstest]
#[case(2e-3, 0.05)]
#[case(-4e-3, -0.1)]
#[case(1e-3, 0.02)]
fn noiseless_arc_convergence(process: FitProcess<HelixKF>, #[case] curvature: f64, #[case] phi0: f64) {
    let _ = try_init();
    let eps = 1e-8_f64;
    let sim = HelixSim::builder()
        .phi0(phi0)
        .curvature(curvature)
        .sigma_y(eps.sqrt())
        .sigma_z(eps.sqrt())
        .build();
    let points: Vec<SpacePoint> = layers(0.0, 5.0, 20)
        .into_iter()
        .map(|x| sim.truth_at(x).unwrap())
        .collect();

    let solution = process.fit(&points).unwrap();
    println!("{solution}");
    assert!(solution.skipped.is_empty());
    assert_eq!(solution.state.hits, points.len());
    assert!((solution.state.curvature() - curvature).abs() < 1e-8);
    assert!(solution.state.chi2 < points.len() as f64 * eps);

    let truth = sim.truth_params(solution.state.x).unwrap();
    assert_relative_eq!(solution.state.y(), truth[0], epsilon = 1e-8);
    assert_relative_eq!(solution.state.eta(), truth[2], epsilon = 1e-8);
}

#[rstest]
fn noisy_fit_is_consistent(process: FitProcess<HelixKF>) {
    let _ = try_init();
    let sim = tpc_helix();
    let mut pulls = Vec::new();
    for seed in 0..40 {
        let solution = process.fit(&measured(&sim, seed)).unwrap();
        let state = solution.state;
        let truth = sim.truth_params(state.x).unwrap();
        pulls.push((state.curvature() - truth[4]) / state.covar[(4, 4)].sqrt());
        assert_relative_eq!(state.pt(5.0), 1.0, max_relative = 0.1);
        assert!(solution.chi2_ndf().is_some());
    }
    let mean = pulls.iter().sum::<f64>() / pulls.len() as f64;
    let rms = (pulls.iter().map(|p| p * p).sum::<f64>() / pulls.len() as f64).sqrt();
    assert!(mean.abs() < 0.6, "curvature pull mean = {mean}");
    assert!((0.6..1.5).contains(&rms), "curvature pull rms = {rms}");
}

#[rstest]
fn fits_are_deterministic(process: FitProcess<HelixKF>) {
    let points = measured(&tpc_helix(), 42);
    let first = process.fit(&points).unwrap();
    let second = process.fit(&points).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.state.params, second.state.params);
}

#[rstest]
fn parallel_fits_match_sequential_fits(process: FitProcess<HelixKF>) {
    let _ = try_init();
    let mut tracks: Vec<Vec<SpacePoint>> = (0..64).map(|seed| measured(&tpc_helix(), seed)).collect();
    // Too short to be seeded
    let short = tracks[0][..2].to_vec();
    tracks.push(short);

    let parallel = process.fit_many(&tracks);
    assert_eq!(parallel.len(), tracks.len());
    for (points, result) in tracks.iter().zip(&parallel) {
        match (process.fit(points), result) {
            (Ok(sequential), Ok(parallel)) => assert_eq!(&sequential, parallel),
            (Err(_), Err(TrackError::TooFewPoints { got, .. })) => assert_eq!(*got, 2),
            (sequential, parallel) => panic!("{sequential:?} != {parallel:?}"),
        }
    }
}

#[test]
fn chi2_cut_skips_outliers() {
    let _ = try_init();
    let mut points = measured(&tpc_helix(), 5);
    points[10].y += 0.5;
    points[25].z -= 1.0;

    let solution = FitProcess::new(HelixKF::new(5.0), Some(25.0))
        .fit(&points)
        .unwrap();
    assert_eq!(solution.skipped, vec![10, 25]);
    assert_eq!(solution.rejected(), 2);
    assert_eq!(solution.state.hits, points.len() - 2);
    let rejected: Vec<f64> = solution
        .residuals
        .iter()
        .filter(|resid| resid.rejected)
        .map(|resid| resid.x)
        .collect();
    assert_eq!(rejected, vec![points[10].x, points[25].x]);
    assert!(solution.max_chi2().unwrap() <= 25.0);

    // The same point fused without the cut
    let uncut = FitProcess::new(HelixKF::new(5.0), None).fit(&points).unwrap();
    assert!(uncut.skipped.is_empty());
    assert!(uncut.state.chi2 > solution.state.chi2);
}

#[rstest]
fn unreachable_points_are_skipped(process: FitProcess<HelixKF>) {
    let _ = try_init();
    let mut points = measured(&tpc_helix(), 9);
    let complete = process.fit(&points).unwrap();
    // Beyond the turning point of the track
    points.push(SpacePoint::with_resolution(1000.0, 0.0, 0.0, 0.01, 0.02));

    let solution = process.fit(&points).unwrap();
    assert_eq!(solution.skipped, vec![points.len() - 1]);
    assert_eq!(solution.state, complete.state);
}

#[test]
fn fit_from_a_prior() {
    let _ = try_init();
    let prior = PriorTrajectory {
        x0: 85.0,
        phi0: 0.08,
        tan_dip: 0.35,
        charge: 1,
        pt: 1.0,
    };
    let sim = HelixSim::from_prior(&prior, 1.5, -3.0, 5.0).with_noise(0.01, 0.02);
    let points = measured(&sim, 17);

    let solution = FitProcess::new(HelixKF::new(5.0).with_prior(prior), None)
        .fit(&points)
        .unwrap();
    assert_eq!(solution.seed_points, 1);
    assert_eq!(solution.residuals.len(), points.len() - 1);
    assert_relative_eq!(solution.state.pt(5.0), 1.0, max_relative = 0.1);
    assert!(solution.state.q_over_pt(5.0) > 0.0);
}

#[test]
fn process_from_yaml() {
    let _ = try_init();
    let cfg = FitConfig::loads(
        r#"
field: 5.0
max_chi2: 30.0
scattering:
  model: ThinLayer
  radiation_length: 19.55
  density: 0.00166
  mass: 0.13957
seeding:
  method: ThreePoints
"#,
    )
    .unwrap();
    assert_eq!(
        cfg.scattering,
        ScatteringModel::ThinLayer(ThinLayer::argon_pion())
    );
    assert_eq!(cfg.seeding, SeedingMode::ThreePoints);

    let process = FitProcess::from_config(&cfg).unwrap();
    assert_eq!(process.max_chi2, Some(30.0));
    assert_eq!(process.filter.field, 5.0);
    let solution = process.fit(&measured(&tpc_helix(), 1)).unwrap();
    assert_eq!(solution.state.hits, 40);

    let invalid = FitConfig::builder().field(5.0).max_chi2(0.0).build();
    assert!(matches!(
        FitProcess::from_config(&invalid),
        Err(TrackError::TrackConfigError { .. })
    ));
}
