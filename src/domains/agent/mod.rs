pub mod actors;
pub mod events;
pub mod node;
pub mod projections;

pub use actors::*;
pub use events::*;
pub use node::*;
pub use projections::*;
