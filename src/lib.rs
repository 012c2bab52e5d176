//! Headscale dashboard backend
//!
//! Helper layer of a web dashboard in front of a headscale server: preflight
//! checks before serving pages, API key validation and renewal, and the
//! formatting helpers the pages use.

pub mod api;
pub mod checks;
pub mod config;
pub mod display;
pub mod headscale;
pub mod types;
