//! # PDF Analyzer
//!
//! Upload PDF manuals, pull machine-component mentions out of their text,
//! and read the results back as JSON or CSV.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌───────────┐   ┌───────────┐   ┌──────────┐
//! │  Upload  │──▶│  Extract  │──▶│  Matcher  │──▶│  SQLite  │
//! │ uploads/ │   │ pdf text  │   │ regex set │   │  store   │
//! └──────────┘   └───────────┘   └───────────┘   └────┬─────┘
//!                                                     │
//!                                ┌────────────────────┤
//!                                ▼                    ▼
//!                          ┌──────────┐         ┌──────────┐
//!                          │   CLI    │         │   HTTP   │
//!                          └──────────┘         └──────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`error`] | Domain error type |
//! | [`extract`] | PDF text extraction with panic and timeout containment |
//! | [`matcher`] | Keyword rules and component matching |
//! | [`store`] | Analysis store trait, SQLite and in-memory backends |
//! | [`export`] | JSON and CSV rendering |
//! | [`uploads`] | Upload validation and on-disk file layout |
//! | [`pipeline`] | Upload, analyze, results, and export operations |
//! | [`server`] | HTTP API |
//! | [`cli`] | CLI command handlers |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema creation |

pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod export;
pub mod extract;
pub mod matcher;
pub mod migrate;
pub mod models;
pub mod pipeline;
pub mod server;
pub mod store;
pub mod uploads;
