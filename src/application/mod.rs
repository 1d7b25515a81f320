pub mod error;
pub mod reporting;

mod auth;
mod service;
mod session;

pub use auth::*;
pub use error::*;
pub use service::*;
pub use session::*;
