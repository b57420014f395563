pub mod config;
pub mod db;
pub mod dtos;
pub mod error;
pub mod handler;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod service;
pub mod utils;

use std::sync::Arc;

use config::Config;
use db::Store;
use service::{
    booking_service::BookingService, credentials::CredentialService,
    listing_service::ListingService,
};

#[derive(Debug, Clone)]
pub struct AppState {
    pub env: Config,
    pub credential_service: Arc<CredentialService>,
    pub listing_service: Arc<ListingService>,
    pub booking_service: Arc<BookingService>,
}

impl AppState {
    pub fn new(db_client: Arc<dyn Store>, config: Config) -> Self {
        let credential_service = Arc::new(CredentialService::new(
            db_client.clone(),
            config.jwt_secret.clone(),
            config.jwt_maxage,
        ));
        let listing_service = Arc::new(ListingService::new(db_client.clone()));
        let booking_service = Arc::new(BookingService::new(db_client));

        AppState {
            env: config,
            credential_service,
            listing_service,
            booking_service,
        }
    }
}
