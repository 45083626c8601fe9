pub mod payload;
pub mod peer_cache;
pub mod store;

pub use payload::*;
pub use peer_cache::*;
pub use store::*;
