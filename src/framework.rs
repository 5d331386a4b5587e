pub mod migrations;
pub mod store;
mod worker;

pub use worker::Job;
pub use worker::JobWorker;
