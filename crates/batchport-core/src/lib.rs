pub mod backend;
pub mod codec;
pub mod error;
pub mod schema;
pub mod signature;
pub mod tensor;

pub use backend::*;
pub use codec::*;
pub use error::*;
pub use schema::*;
pub use signature::*;
pub use tensor::*;
