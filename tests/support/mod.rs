//! Shared helpers for integration tests
//!
//! Builds a stage context over scripted providers so full pipeline runs
//! stay deterministic: with no evidence configured, the relevance
//! filter makes no judgment calls and every queued model response feeds
//! exactly one stage synthesis.

#![allow(dead_code)]

use dealscope::batch::BatchDriver;
use dealscope::checkpoint::CheckpointStore;
use dealscope::llm::{MockLLMClient, MockResponse};
use dealscope::pipeline::{PipelineConfig, PipelineController, StageContext};
use dealscope::search::mock::{MockDocumentIndex, MockPatentRegistry, MockWebSearch};
use dealscope::search::EvidenceGatherer;
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;

/// Handles to the scripted retrieval providers behind a context
pub struct Providers {
    pub index: Arc<MockDocumentIndex>,
    pub web: Arc<MockWebSearch>,
    pub patents: Arc<MockPatentRegistry>,
}

/// Builds a context over empty mock providers and a scripted model.
pub fn mock_context() -> (StageContext, Arc<MockLLMClient>, Providers, TempDir) {
    mock_context_with(PipelineConfig::default())
}

pub fn mock_context_with(
    config: PipelineConfig,
) -> (StageContext, Arc<MockLLMClient>, Providers, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let llm = Arc::new(MockLLMClient::new());
    let providers = Providers {
        index: Arc::new(MockDocumentIndex::new()),
        web: Arc::new(MockWebSearch::new()),
        patents: Arc::new(MockPatentRegistry::new()),
    };
    let gatherer = Arc::new(EvidenceGatherer::new(
        providers.index.clone(),
        providers.web.clone(),
        providers.patents.clone(),
    ));

    let context = StageContext::new(
        llm.clone(),
        gatherer,
        config,
        temp_dir.path().to_path_buf(),
    );

    (context, llm, providers, temp_dir)
}

/// Controller variant of [`mock_context`] for full pipeline runs.
pub fn mock_controller() -> (PipelineController, Arc<MockLLMClient>, Providers, TempDir) {
    let (context, llm, providers, temp_dir) = mock_context();
    (PipelineController::new(context), llm, providers, temp_dir)
}

/// Batch driver over an on-disk checkpoint seeded with `entries`. The
/// returned store reads the same file the driver writes; hold both
/// temp dirs alive for the duration of the test.
pub fn mock_batch(
    entries: &[Value],
) -> (
    BatchDriver,
    CheckpointStore,
    Arc<MockLLMClient>,
    Providers,
    (TempDir, TempDir),
) {
    let (controller, llm, providers, reports_dir) = mock_controller();
    let checkpoint_dir = TempDir::new().unwrap();
    let store = CheckpointStore::new(checkpoint_dir.path().join("companies.json"));
    store.save(entries).unwrap();

    let driver = BatchDriver::new(controller, store.clone());
    (driver, store, llm, providers, (checkpoint_dir, reports_dir))
}

/// A response that parses as an empty stage output for every stage:
/// no text fields are written and scoring falls back to neutral 50s.
pub fn inert_response_body() -> &'static str {
    r#"{"note": "no findings"}"#
}

pub fn explore_response() -> MockResponse {
    MockResponse::json(json!({
        "owner": "Dr. Jane Doe, ex-Samsung Medison imaging lead",
        "core_tech": "wearable glucose biosensor",
        "pros": "needle-free application, 14-day wear time",
        "patents": "two granted sensor patents",
        "investments": "Series A, 5M USD, 2024"
    }))
}

pub fn tech_response() -> MockResponse {
    MockResponse::json(json!({
        "tech_summary": "Electrochemical sensing patch with on-device calibration.",
        "strengths_and_weaknesses": "High accuracy; unproven at scale.",
        "differentiation_points": "No finger-prick calibration required.",
        "technical_risks": "Sensor drift beyond day 10.",
        "patents_and_papers": ["KR10-2419-0001", "doi:10.1000/sensor.2024"]
    }))
}

pub fn market_response() -> MockResponse {
    MockResponse::json(json!({
        "industry_trends": "Continuous monitoring is displacing spot checks.",
        "market_size": "CGM market projected to reach 31B USD by 2030.",
        "regulatory_barriers": "Class II clearance required in major markets.",
        "customer_segments": "Type 1 diabetics, then fitness wearables."
    }))
}

pub fn competitor_response() -> MockResponse {
    MockResponse::json(json!({
        "main_competitors": "Dexcom",
        "competitor_profiles": "Founded 1999, public, CGM category leader.",
        "market_positioning": "Incumbent versus low-cost challenger.",
        "product_comparison": "Cheaper sensor, shorter wear time.",
        "unique_value_props": "Needle-free application.",
        "threat_analysis": "Category leader can compress prices.",
        "market_share": "Dexcom holds roughly 40% of CGM revenue.",
        "reference_urls": ["https://www.reuters.com/dexcom-profile"]
    }))
}

/// Scores that produce a 79.5 weighted total (recommend).
pub fn recommend_scores_response() -> MockResponse {
    MockResponse::json(json!({
        "owner": 90, "market": 80, "product": 70,
        "competitor": 60, "performance": 90, "deal": 70
    }))
}

/// Scores that produce a 73.9 weighted total (hold, just under the bar).
pub fn hold_scores_response() -> MockResponse {
    MockResponse::json(json!({
        "owner": 80, "market": 70, "product": 70,
        "competitor": 60, "performance": 80, "deal": 79
    }))
}

pub fn summary_response() -> MockResponse {
    MockResponse::text(
        "Acme combines a differentiated sensor with a credible founding team. \
         The weighted score clears the bar on owner and market strength. \
         Recommend proceeding to diligence.",
    )
}
