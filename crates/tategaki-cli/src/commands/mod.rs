//! Command handlers

pub mod chapter;
pub mod config;
pub mod project;
