pub mod convert;
pub mod error;
pub mod frame;
pub mod v1;

pub use convert::*;
pub use error::*;
pub use frame::*;
