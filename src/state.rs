//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::Config;
use crate::guest_cart::GuestCart;
use crate::store::Store;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    /// Process-local cart for the guest identity; reset on restart.
    pub guest_cart: GuestCart,
    pub http_client: reqwest::Client,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, config: Config) -> Self {
        Self {
            store,
            guest_cart: GuestCart::new(),
            http_client: reqwest::Client::new(),
            config: Arc::new(config),
        }
    }
}
