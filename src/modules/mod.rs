pub mod config;
pub mod logger;
pub mod oidc;

pub use config::*;
pub use logger::*;
