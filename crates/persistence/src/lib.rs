//! Persistence layer for the DjangoPBX switch integration bus.
//!
//! This crate contains:
//! - Database connection management
//! - Entity definitions (row mappings of the web application's tables)
//! - Read-only repositories over those tables
//!
//! The schema is owned by the web application; nothing here writes to it.

pub mod db;
pub mod entities;
pub mod metrics;
pub mod repositories;
