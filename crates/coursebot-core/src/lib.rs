//! # Coursebot Core
//!
//! Runtime-agnostic logic for coursebot: the course catalog, the content
//! store seam, retrieval strategies, answer backends, and the query router
//! that decides which resolution path answers a question.
//!
//! This crate performs no network or filesystem I/O. Embedding and
//! generation services are reached through the [`embedding::Embedder`] and
//! [`backend::Generator`] traits, which the application crate implements.
//!
//! ## Resolution order
//!
//! ```text
//! question ──▶ course id ──▶ course title ──▶ semantic (strategy + backend)
//!                 │               │                  │
//!                 ▼               ▼                  ▼
//!              answer          answer       answer / "no answer found"
//! ```

pub mod backend;
pub mod catalog;
pub mod embedding;
pub mod error;
pub mod models;
pub mod policy;
pub mod router;
pub mod store;
pub mod strategy;
