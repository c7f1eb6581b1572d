use std::sync::Arc;

pub mod auth;
pub mod config;
pub mod counters;
pub mod error;
pub mod middleware;
pub mod models;
pub mod proxy;
pub mod rate_limit;
pub mod registry;
pub mod routes;
pub mod usage;
pub mod utils;

use config::Settings;
use counters::CounterStoreHandle;
use registry::RegistryClient;

#[derive(Clone)]
pub struct AppState {
    pub registry: RegistryClient,
    pub http_client: reqwest::Client,
    pub counters: CounterStoreHandle,
    pub settings: Arc<Settings>,
}
