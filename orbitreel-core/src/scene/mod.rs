pub mod builder;
pub mod manifest;
