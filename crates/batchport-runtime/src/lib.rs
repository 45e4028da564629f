pub mod config;
pub mod error;
pub mod ledger;
pub mod merge;
pub mod processor;
pub mod request;
pub mod split;
pub mod warmup;
pub mod worker;

pub use config::*;
pub use error::*;
pub use ledger::*;
pub use merge::*;
pub use processor::*;
pub use request::*;
pub use split::*;
pub use warmup::*;
pub use worker::*;
