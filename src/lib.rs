//! # unidocs — Unity Documentation MCP Server
//!
//! Indexes the offline Unity documentation corpus into SQLite and serves
//! semantic search plus structured API facts to AI assistants via the
//! Model Context Protocol (MCP).
//!
//! ## Architecture
//!
//! - **[`config`]** — Configuration loading, validation, and defaults
//! - **[`downloader`]** — Offline documentation archive download and version tracking
//! - **[`extract`]** — HTML page reading, class/method extraction, chunking
//! - **[`db`]** — SQLite + sqlite-vec store (pages, chunks, API structure, search)
//! - **[`embedder`]** — Text embedding via Ollama (or a deterministic mock)
//! - **[`indexer`]** — Documentation tree walk feeding the store
//! - **[`mcp`]** — MCP server with 9 tool handlers (stdio transport via rmcp)

pub mod config;
pub mod db;
pub mod downloader;
pub mod embedder;
pub mod extract;
pub mod indexer;
pub mod mcp;
