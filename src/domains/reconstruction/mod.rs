pub mod merger;
pub mod reconstruct;
pub mod transform;

pub use merger::*;
pub use reconstruct::*;
pub use transform::*;
