pub mod em;
pub mod estimator;

pub use em::{
    assignment_cost, expectation_maximization, random_target, sightings_to_targets, EmDriver,
};
pub use estimator::estimate_segment;
