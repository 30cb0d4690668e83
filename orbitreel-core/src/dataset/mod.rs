pub mod tracks;
pub mod trajectory;
