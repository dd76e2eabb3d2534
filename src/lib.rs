//! Replikk - Subtitle RAG
//!
//! A CLI tool that indexes a season of TV subtitles and answers questions
//! about it with cited dialogue.
//!
//! The name "Replikk" comes from the Norwegian word for a line of dialogue.
//!
//! # Overview
//!
//! Replikk allows you to:
//! - Load a directory of SxxEyy.txt subtitle files
//! - Build a searchable vector index of overlapping dialogue chunks
//! - Ask questions and get answers cited with episode labels and line ranges
//! - Search dialogue semantically without generating an answer
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Configuration management
//! - `subtitles` - Subtitle loading and episode identification
//! - `chunking` - Line-window chunking with overlap
//! - `embedding` - Embedding generation
//! - `generation` - Answer generation
//! - `vector_store` - Vector database abstraction
//! - `indexer` - Index building with retry and incremental updates
//! - `rag` - Retrieval and answer composition
//! - `orchestrator` - Pipeline coordination
//!
//! # Example
//!
//! ```rust,no_run
//! use replikk::config::Settings;
//! use replikk::indexer::IndexMode;
//! use replikk::orchestrator::Orchestrator;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let subtitle_dir = settings.subtitle_dir();
//!     let orchestrator = Orchestrator::new(settings)?;
//!
//!     let (report, _skipped) = orchestrator
//!         .build_index(&subtitle_dir, IndexMode::Incremental)
//!         .await?;
//!     println!("Indexed {} chunks", report.chunks_indexed);
//!
//!     let answer = orchestrator.ask("Who built the Machine?", None).await?;
//!     println!("{}", answer.format_for_display());
//!
//!     Ok(())
//! }
//! ```

pub mod chunking;
pub mod cli;
pub mod config;
pub mod embedding;
pub mod error;
pub mod generation;
pub mod indexer;
pub mod openai;
pub mod orchestrator;
pub mod rag;
pub mod subtitles;
pub mod vector_store;

pub use error::{ReplikkError, Result};
