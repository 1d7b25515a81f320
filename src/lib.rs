pub mod application;
pub mod cli;
pub mod domain;
pub mod quotes;
pub mod storage;

pub use domain::*;
pub use storage::Repository;
