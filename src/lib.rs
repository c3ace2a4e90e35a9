//! # Maritime Knowledge Base
//!
//! A local-first ingestion pipeline that turns maritime documents (charter
//! parties, bills of lading, weather reports, voyage instructions) into
//! structured, searchable knowledge.
//!
//! Each upload is extracted to plain text, segmented into titled sections and
//! clauses, tagged with keywords, classified, and summarized. Summaries come
//! from an optional hosted language model with an extractive fallback, so the
//! pipeline works with no network access at all. Knowledge entries are derived
//! from the stored sections on demand and are never persisted themselves.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌───────────┐   ┌────────────┐   ┌───────────┐
//! │ Extract  │──▶│ Segment ‖ │──▶│ Summarize  │──▶│   Store   │
//! │ PDF/text │   │ Features  │   │ (enricher) │   │ JSON/file │
//! └──────────┘   └───────────┘   └────────────┘   └─────┬─────┘
//!                                                       │
//!                                                       ▼
//!                                              ┌────────────────┐
//!                                              │   Knowledge    │
//!                                              │ entries (rank) │
//!                                              └────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! mkb ingest ./docs/gencon.pdf           # extract, analyse, store
//! mkb list                               # newest first
//! mkb search "demurrage"
//! mkb knowledge --category laytime
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types and the on-disk record format |
//! | [`error`] | Typed error taxonomy |
//! | [`extract`] | PDF and text extraction |
//! | [`segment`] | Header and clause detection |
//! | [`features`] | Keywords and document-type classification |
//! | [`enrichment`] | Optional hosted language model |
//! | [`summarize`] | Summaries with an extractive fallback |
//! | [`knowledge`] | Knowledge entries, scoring and ranking |
//! | [`store`] | Document record storage |
//! | [`ingest`] | The [`Pipeline`](ingest::Pipeline) tying it together |
//! | [`commands`] | CLI command runners |

pub mod commands;
pub mod config;
pub mod enrichment;
pub mod error;
pub mod extract;
pub mod features;
pub mod ingest;
pub mod knowledge;
pub mod models;
pub mod segment;
pub mod store;
pub mod summarize;

pub use ingest::Pipeline;
