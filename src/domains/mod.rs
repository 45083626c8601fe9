pub mod agent;
pub mod communication;
pub mod gossip;
pub mod logger;
pub mod reconstruction;
pub mod triangulation;

pub use agent::*;
pub use communication::*;
pub use gossip::*;
pub use logger::*;
pub use reconstruction::*;
pub use triangulation::*;
