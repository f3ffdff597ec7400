//! Vendor credentials and the request context they travel in

pub mod credentials;

pub use credentials::{ApiContext, Credentials};
