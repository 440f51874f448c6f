//! # prism-core
//!
//! Core document types and enums for Prism.
//!
//! This crate provides the foundational types shared across all Prism crates:
//! - Document structs for the three collections (issues, articles, media sources)
//! - Closed enums for category and political perspective, plus the three-way
//!   perspective bucket used by the coverage spectrum
//! - The `Document` sum type handed from the validator to the store

pub mod document;
pub mod entities;
pub mod enums;
