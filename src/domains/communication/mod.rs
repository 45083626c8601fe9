pub mod delaunay;
pub mod delaunay_graph;
pub mod distance_limited;
pub mod global;
pub mod policy;
pub mod ports;
pub mod proximity;
pub mod roster;

pub use delaunay::*;
pub use delaunay_graph::*;
pub use distance_limited::*;
pub use global::*;
pub use policy::*;
pub use ports::*;
pub use proximity::*;
pub use roster::*;
