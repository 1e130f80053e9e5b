//! Core runtime infrastructure.
//!
//! This module contains the essential components for running Beacon:
//! - [`config`] - Configuration parsing and validation
//! - [`runtime`] - Main runtime orchestration
//! - [`error`] - Error types and protocol-specific mapping

pub mod config;
pub mod error;
pub mod runtime;
