pub mod models;
pub mod catalog;
pub mod services;
pub mod errors;

pub use models::*;
pub use catalog::*;
pub use services::*;
pub use errors::*;
