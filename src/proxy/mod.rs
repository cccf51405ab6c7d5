// proxy module - terminology lookup proxy

pub mod cache;
pub mod config;
pub mod server;
pub mod terminology;
pub mod token_manager;

pub mod handlers; // API endpoint handlers
pub mod middleware; // Axum middleware
pub mod upstream; // Upstream client

pub use cache::ResponseCache;
pub use config::ProxyConfig;
pub use server::AxumServer;
pub use terminology::TerminologyProxy;
pub use token_manager::TokenManager;
