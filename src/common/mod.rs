pub mod error;
pub mod event;
pub mod frame;

pub use error::*;
pub use event::*;
pub use frame::*;
