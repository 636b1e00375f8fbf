// Analysis stages of the investment pipeline
//
// Each stage is self-contained with its own prompt builder, parse
// fallback, and failure placeholder. Stages run in the numbered order
// and each writes only the record fields it owns.

pub mod llm_helper;

#[path = "01_explore.rs"]
pub mod explore;
#[path = "02_tech_summary.rs"]
pub mod tech_summary;
#[path = "03_market_eval.rs"]
pub mod market_eval;
#[path = "04_competitor.rs"]
pub mod competitor;
#[path = "05_invest.rs"]
pub mod invest;
#[path = "06_report.rs"]
pub mod report;

pub use competitor::CompetitorStage;
pub use explore::ExploreStage;
pub use invest::InvestStage;
pub use market_eval::MarketEvalStage;
pub use report::ReportStage;
pub use tech_summary::TechSummaryStage;
