//! Configuration management for evrec.
//!
//! Loading and saving application configuration from TOML files in the
//! user's config directory. Device and directory choices are made
//! interactively in the app and written back here.

pub mod file;

pub use file::{config_path, AudioConfig, EvrecConfig, PathsConfig};
