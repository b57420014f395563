pub mod booking_service;
pub mod credentials;
pub mod error;
pub mod listing_service;
pub mod recommendation;
