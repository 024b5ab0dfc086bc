//! # Coursebot
//!
//! A question-answering assistant over a course catalog.
//!
//! Questions are resolved by the [`coursebot_core::router::QueryRouter`]:
//! an exact course id or title match is answered from the catalog, and
//! anything else goes through retrieval-augmented generation against an
//! in-memory embedding index of the course descriptions.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌─────────────┐   ┌────────────────┐
//! │ courses.jsonl│──▶│   Catalog   │──▶│ In-memory index│
//! └──────────────┘   └──────┬──────┘   └───────┬────────┘
//!                           │                  │
//!                           ▼                  ▼
//!                    ┌─────────────────────────────┐
//!                    │ Controller ─▶ QueryRouter   │──▶ Ollama / OpenAI / Gemini
//!                    └──────────────┬──────────────┘
//!                                   ▼
//!                           CLI (chat / ask)
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`logging`] | tracing subscriber setup |
//! | [`catalog`] | JSON Lines catalog loader |
//! | [`http`] | JSON-over-HTTP with retry |
//! | [`embedding`] | Ollama and OpenAI embedders |
//! | [`generation`] | Ollama, OpenAI and Gemini completion clients |
//! | [`controller`] | Wiring and strategy/backend hot-swap |
//! | [`repl`] | Interactive chat loop |

pub mod catalog;
pub mod config;
pub mod controller;
pub mod embedding;
pub mod generation;
pub mod http;
pub mod logging;
pub mod repl;
