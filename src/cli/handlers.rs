//! Command handlers mapping parsed arguments to pipeline runs
//!
//! Each handler returns a process exit code: 0 on success, 1 on a
//! runtime failure, 2 on a configuration error.

use std::env;
use std::sync::Arc;

use genai::adapter::AdapterKind;
use tracing::debug;

use crate::batch::BatchDriver;
use crate::checkpoint::CheckpointStore;
use crate::config::DealscopeConfig;
use crate::llm::{LLMClient, LLMRequest};
use crate::pipeline::{PipelineConfig, PipelineController, StageContext};
use crate::progress::{LoggingHandler, ProgressHandler};

use super::commands::{AnalyzeArgs, HealthArgs};

pub const EXIT_OK: i32 = 0;
pub const EXIT_FAILURE: i32 = 1;
pub const EXIT_CONFIG: i32 = 2;

/// Applies provider and model overrides from the command line.
///
/// Overriding the provider without naming a model re-derives the
/// provider default, unless `DEALSCOPE_MODEL` pins one explicitly.
fn apply_model_overrides(
    config: &mut DealscopeConfig,
    provider: Option<AdapterKind>,
    model: Option<&str>,
) {
    if let Some(provider) = provider {
        config.provider = provider;
        if model.is_none() && env::var("DEALSCOPE_MODEL").is_err() {
            config.model = DealscopeConfig::default_model(provider).to_string();
        }
    }
    if let Some(model) = model {
        config.model = model.to_string();
    }
}

pub async fn handle_analyze(args: &AnalyzeArgs, quiet: bool) -> i32 {
    let mut config = DealscopeConfig::default();
    apply_model_overrides(&mut config, args.provider, args.model.as_deref());
    if let Some(timeout) = args.timeout {
        config.request_timeout_secs = timeout;
    }
    if let Some(path) = &args.checkpoint {
        config.checkpoint_path = path.clone();
    }
    if let Some(dir) = &args.reports_dir {
        config.reports_dir = dir.clone();
    }

    if let Err(e) = config.validate() {
        eprintln!("Configuration error: {}", e);
        return EXIT_CONFIG;
    }
    debug!("{}", config);

    let llm = match config.create_llm_client().await {
        Ok(client) => client,
        Err(e) => {
            eprintln!("Failed to initialize model client: {}", e);
            return EXIT_FAILURE;
        }
    };
    let gatherer = match config.create_gatherer() {
        Ok(gatherer) => gatherer,
        Err(e) => {
            eprintln!("Failed to initialize search providers: {}", e);
            return EXIT_FAILURE;
        }
    };

    let context = StageContext::new(
        llm,
        gatherer,
        PipelineConfig::default(),
        config.reports_dir.clone(),
    );
    let progress: Arc<dyn ProgressHandler> = Arc::new(LoggingHandler);
    let controller = PipelineController::new(context).with_progress(progress.clone());
    let store = CheckpointStore::new(&config.checkpoint_path);
    let driver = BatchDriver::new(controller, store)
        .with_progress(progress)
        .with_progress_bar(!args.no_progress && !quiet);

    match driver.run(args.from, args.company.as_deref()).await {
        Ok(summary) => {
            if !quiet {
                println!(
                    "Analyzed {} companies in {:.1}s",
                    summary.companies,
                    summary.duration.as_secs_f64()
                );
                if summary.skipped > 0 {
                    println!("Skipped {} malformed checkpoint entries", summary.skipped);
                }
                if summary.stage_failures > 0 {
                    println!(
                        "{} stage failures (affected fields carry placeholders)",
                        summary.stage_failures
                    );
                }
                println!(
                    "Reports written: {} ({})",
                    summary.reports_written,
                    config.reports_dir.display()
                );
                println!("Checkpoint: {}", config.checkpoint_path.display());
            }
            EXIT_OK
        }
        Err(e) => {
            eprintln!("Analysis run failed: {:#}", e);
            EXIT_FAILURE
        }
    }
}

pub async fn handle_health(args: &HealthArgs) -> i32 {
    let mut config = DealscopeConfig::default();
    apply_model_overrides(&mut config, args.provider, args.model.as_deref());

    println!("{}", config);

    let llm = match config.create_llm_client().await {
        Ok(client) => client,
        Err(e) => {
            eprintln!("Failed to initialize model client: {}", e);
            return EXIT_FAILURE;
        }
    };

    let request = LLMRequest::user("Reply with the single word: ok").with_max_tokens(8);
    let mut healthy = true;

    match llm.chat(request).await {
        Ok(response) => {
            println!(
                "Model provider {} ({}): responded in {:.2}s",
                llm.name(),
                config.model,
                response.response_time.as_secs_f64()
            );
        }
        Err(e) => {
            println!("Model provider {}: unavailable ({})", llm.name(), e);
            healthy = false;
        }
    }

    match &config.tavily_api_key {
        Some(_) => println!("Web search: configured"),
        None => {
            println!("Web search: TAVILY_API_KEY not set");
            healthy = false;
        }
    }
    match &config.index_url {
        Some(url) => println!("Document index: {}", url),
        None => {
            println!("Document index: DEALSCOPE_INDEX_URL not set");
            healthy = false;
        }
    }
    match &config.kipris_api_key {
        Some(_) => println!("Patent registry: configured"),
        None => println!("Patent registry: not configured (stub results)"),
    }

    if healthy {
        EXIT_OK
    } else {
        EXIT_FAILURE
    }
}
