//! Application services: routing, rendering and the site build.

pub mod build;
pub mod error;
pub mod permalink;
pub mod render;
