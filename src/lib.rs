//! Content routing and markdown rendering for a static notes site.
//!
//! [`application::permalink`] turns front-matter permalinks into a rewrite
//! table, [`application::render`] runs each document through the markdown pass
//! pipeline, and [`application::build`] ties both together over a content
//! directory.

pub mod application;
pub mod config;
pub mod domain;
pub mod infra;
