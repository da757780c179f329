//! MCP server exposing a small set of GitHub repository tools.
//!
//! Provides tools for fetching repository metadata, listing and creating
//! issues, reading file contents, and searching code within a repository.

pub mod client;
pub mod config;
pub mod error;
pub mod server;
pub mod tools;
