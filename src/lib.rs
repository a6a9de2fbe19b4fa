//! Cross-reference curated ("Hall of Fame") enhancers with their metadata
//! and per-cell-type chromatin accessibility, and turn the result into
//! genome-browser-style tracks.

pub mod color;
pub mod config;
pub mod data;
