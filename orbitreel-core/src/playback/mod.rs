pub mod driver;
pub mod ease;
pub mod scrub;
