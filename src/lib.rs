pub mod config;
pub mod constants;
pub mod core;
pub mod error;
pub mod framework;
pub mod monitor;
pub mod utils;
pub mod workers;

pub use error::Error;
pub use error::Result;
