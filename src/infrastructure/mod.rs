//! Infrastructure layer - External service implementations

pub mod cache;
pub mod observability;
pub mod services;
pub mod upstream;
