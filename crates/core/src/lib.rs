// crates/core/src/lib.rs

//! Tool synthesis and validation engine.
//!
//! A candidate tool travels normalize → extract → inspect → synthesize
//! inputs → run → novelty check → registry. [`pipeline::Synthesizer`]
//! drives that path; [`tool_registry::ToolRegistry`] owns admitted tools.

pub mod ai_client;
pub mod extract;
pub mod harness;
pub mod ingest;
pub mod memory;
pub mod normalize;
pub mod novelty;
pub mod openai_client;
pub mod pipeline;
pub mod purpose;
pub mod script;
pub mod seeds;
pub mod signature;
pub mod synthesize;
pub mod tool_registry;
