//! Shared utilities and common types for the DjangoPBX switch integration bus.
//!
//! This crate provides common functionality used across all other crates:
//! - String flags as stored by the web application (`'true'`/`'false'`)
//! - Named placeholder substitution for email templates
//! - Validation of values that end up in shell paths and mail envelopes

pub mod flag;
pub mod placeholder;
pub mod validation;
