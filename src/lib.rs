//! Furni Catalog Library
//!
//! This library provides functionality to fetch furniture catalog metadata per
//! region, merge two locales into one per-item directory tree, and download the
//! assets each item references.

pub mod assets;
pub mod config;
pub mod fetch;
pub mod merge;
pub mod utils;

#[cfg(test)]
mod test_support;
