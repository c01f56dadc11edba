//! postdeck: admin service for users and their blog posts.
//!
//! Reads and writes flow through a route adapter over a persistence backend.
//! Reads are cached per query and invalidated by tag when a mutation succeeds.

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
