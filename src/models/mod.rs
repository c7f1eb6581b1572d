pub mod api;
pub mod api_key;
pub mod client;
pub mod plan;
pub mod tenant;

pub use api::Api;
pub use api_key::ApiKey;
pub use client::Client;
pub use plan::Plan;
pub use tenant::Tenant;
