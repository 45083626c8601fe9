pub mod ground_truth;

pub use ground_truth::*;
