//! dealscope - LLM-driven investment screening for startup deal flow
//!
//! This library runs a fixed analysis pipeline over a checkpoint of startup
//! companies. Each company passes through exploration, technology validation,
//! market evaluation, competitor analysis, weighted scoring, and report
//! generation, with every result merged back into the checkpoint so runs can
//! resume from any stage.
//!
//! # Core Concepts
//!
//! - **Investment Record**: The single shared state for one company. Each
//!   stage owns a fixed group of fields and never touches the rest.
//! - **Stages**: Units of analysis that gather evidence (document index, web
//!   search, patent registry), screen it for relevance, and make one
//!   synthesis call to the model.
//! - **Scoring**: Six weighted criteria roll up into a total score; crossing
//!   the recommendation threshold is what triggers a written report.
//!
//! # Example Usage
//!
//! ```ignore
//! use dealscope::batch::BatchDriver;
//! use dealscope::checkpoint::CheckpointStore;
//! use dealscope::config::DealscopeConfig;
//! use dealscope::pipeline::{PipelineConfig, PipelineController, StageContext};
//!
//! async fn run_batch() -> anyhow::Result<()> {
//!     let config = DealscopeConfig::default();
//!     config.validate()?;
//!
//!     let context = StageContext::new(
//!         config.create_llm_client().await?,
//!         config.create_gatherer()?,
//!         PipelineConfig::default(),
//!         config.reports_dir.clone(),
//!     );
//!
//!     let driver = BatchDriver::new(
//!         PipelineController::new(context),
//!         CheckpointStore::new(&config.checkpoint_path),
//!     );
//!     let summary = driver.run(None, None).await?;
//!     println!("{} companies analyzed", summary.companies);
//!     Ok(())
//! }
//! ```
//!
//! # Project Structure
//!
//! - [`pipeline`]: Stage sequence, controller, and per-stage analysis logic
//! - [`record`]: Investment record, scoring, and decision types
//! - [`search`]: Evidence retrieval providers and relevance screening
//! - [`llm`]: Model client abstractions over multiple providers
//! - [`checkpoint`]: JSON checkpoint persistence with field-merge semantics
//! - [`report`]: Markdown report rendering for recommended companies

// Public modules
pub mod batch;
pub mod checkpoint;
pub mod cli;
pub mod config;
pub mod llm;
pub mod pipeline;
pub mod progress;
pub mod record;
pub mod report;
pub mod search;
pub mod util;

// Re-export key types for convenient access
pub use batch::{BatchDriver, BatchSummary};
pub use checkpoint::{CheckpointError, CheckpointStore};
pub use config::{ConfigError, DealscopeConfig};
pub use llm::{BackendError, GenAIClient, LLMClient};
pub use pipeline::{PipelineConfig, PipelineController, StageContext, StageId};
pub use record::{Decision, InvestmentRecord};
pub use util::{init_from_env, init_logging, LoggingConfig};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
