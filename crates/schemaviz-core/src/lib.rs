//! Schemaviz Core Types and Definitions
//!
//! This crate provides the foundational types shared by the schemaviz crates:
//!
//! - **Categories**: The three top-level type classifications ([`category::Category`])
//! - **Identifiers**: Graph node identities and their allocator ([`identifier`] module)
//! - **Graph**: The schema graph produced by a build ([`graph::SchemaGraph`])
//! - **Sources**: The read-only type source contract ([`source::TypeSource`])
//! - **Snapshots**: An in-memory type source ([`snapshot::SchemaSnapshot`])
//! - **Colors**: CSS color handling for diagram styling ([`color::Color`])

pub mod category;
pub mod color;
pub mod graph;
pub mod identifier;
pub mod snapshot;
pub mod source;
