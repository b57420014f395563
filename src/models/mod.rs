pub mod bookingmodel;
pub mod listingmodel;
pub mod usermodel;
