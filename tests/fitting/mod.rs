extern crate helixfit;

mod process;
mod propagation;
mod seeding;

use helixfit::fit::Filter;
use helixfit::{HelixKF, SpacePoint};

#[test]
fn filter_needs_enough_points_to_seed() {
    let kf = HelixKF::default();
    let points = [SpacePoint::with_resolution(1.0, 0.0, 0.0, 0.1, 0.1); 2];
    match kf.seed(&points) {
        Err(helixfit::TrackError::TooFewPoints { need, got, .. }) => {
            assert_eq!(need, 3);
            assert_eq!(got, 2);
        }
        other => panic!("expected too few points, got {other:?}"),
    }
}
