//! Tilewall - poster walls from a single image
//!
//! Splits an image into a grid of print-ready A4 tiles: geometry, sampling,
//! print enhancement, JPEG encoding and PDF assembly.
//! This library exposes modules for integration testing.

pub mod api;
pub mod error;
pub mod models;
pub mod rendering;
pub mod server;
pub mod services;
