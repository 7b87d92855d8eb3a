pub mod context;
pub mod encoder;
pub mod forecast;
pub mod loader;
pub mod regression;
