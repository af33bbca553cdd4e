//! Configuration derivation pipeline for the relay-agent MCP runtime.
//!
//! Responsibilities:
//! - Snapshot a set of named form fields plus repeated server sub-forms
//!   (`form`), validate and assemble them into a nested [`model::AgentConfig`]
//!   (`builder`).
//! - Render a config as pretty JSON, a shell export script, and launcher
//!   JSON snippets for direct-binary and container invocation (`render`).
//! - Round-trip externally supplied config JSON back onto the form, filling
//!   defaults for absent fields (`upload`).
//! - Gate racing rebuilds so only the newest result is published (`seq`).

pub mod builder;
pub mod error;
pub mod form;
pub mod model;
pub mod render;
pub mod seq;
pub mod upload;
