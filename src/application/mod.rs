//! Application services layer.

pub mod admin;
pub mod backend;
pub mod error;
pub mod pagination;
pub mod routes;
