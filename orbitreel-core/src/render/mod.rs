pub mod fingerprint;
pub mod frontend;
pub mod state;
pub mod trace;
