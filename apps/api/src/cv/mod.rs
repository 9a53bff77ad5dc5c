pub mod handlers;
pub mod locator;
pub mod models;
pub mod paths;
pub mod store;
