//! CKN admin tooling library
//!
//! Maintenance operations for the 21-day nutrition course backend: content
//! import, AI quiz generation, verification, group membership repair and
//! test data seeding.
//!
//! ## Architecture
//!
//! - `supabase`: REST/auth client for the hosted backend
//! - `ai`: completion providers used for quiz generation
//! - `repositories`: typed table access
//! - `services`: the operations behind each CLI command
//! - `cli`: argument parsing and dispatch

pub mod ai;
pub mod cli;
pub mod config;
pub mod error;
pub mod report;
pub mod repositories;
pub mod services;
pub mod state;
pub mod supabase;
