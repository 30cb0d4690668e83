pub mod spec;
pub mod transform;
