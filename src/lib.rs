//! Spiral layout rendering service.
//!
//! Clients submit delimited text, a single-flight scheduler renders queued
//! jobs into PDF artifacts off the request path, and clients poll for the
//! result and download it.

pub mod application;
pub mod config;
pub mod domain;
pub mod infra;
