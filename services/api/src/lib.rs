//! services/api/src/lib.rs
//!
//! The Monogatari Weavers API service: HTTP routes, the story and narration
//! pipelines, the adapters behind every core port and the narration queue worker.

pub mod adapters;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod web;
pub mod worker;
