//! URL handling module
//!
//! This module provides URL normalization, host extraction, wildcard domain
//! matching and glob patterns over full URLs.

mod domain;
mod matcher;
mod normalize;

pub use domain::{extract_domain, same_host};
pub use matcher::{matches_wildcard, GlobPattern};
pub use normalize::normalize_url;
