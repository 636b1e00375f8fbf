use super::context::StageContext;
use crate::record::InvestmentRecord;
use anyhow::Result;
use async_trait::async_trait;

/// One unit of analysis in the fixed stage sequence
///
/// A stage reads previously written record fields, gathers and filters
/// evidence, makes one synthesis call, and writes only the field group
/// it owns. A returned error is absorbed by the controller, which calls
/// `apply_failure` so the owned fields carry an explicit placeholder
/// instead of silently staying empty.
#[async_trait]
pub trait AnalysisStage: Send + Sync {
    fn name(&self) -> &'static str;

    async fn execute(&self, record: &mut InvestmentRecord, ctx: &StageContext) -> Result<()>;

    /// Marks the stage's owned fields after a hard failure. Must not
    /// touch fields owned by other stages.
    fn apply_failure(&self, record: &mut InvestmentRecord, error: &str);
}

/// Identifier for each stage in pipeline order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageId {
    Explore,
    TechSummary,
    MarketEval,
    Competitor,
    Invest,
    Report,
}

impl StageId {
    /// All stages in execution order
    pub fn all() -> [StageId; 6] {
        [
            StageId::Explore,
            StageId::TechSummary,
            StageId::MarketEval,
            StageId::Competitor,
            StageId::Invest,
            StageId::Report,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StageId::Explore => "explore",
            StageId::TechSummary => "tech-summary",
            StageId::MarketEval => "market-eval",
            StageId::Competitor => "competitor",
            StageId::Invest => "invest",
            StageId::Report => "report",
        }
    }
}

impl std::str::FromStr for StageId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "explore" => Ok(StageId::Explore),
            "tech" | "tech-summary" => Ok(StageId::TechSummary),
            "market" | "market-eval" => Ok(StageId::MarketEval),
            "competitor" => Ok(StageId::Competitor),
            "invest" => Ok(StageId::Invest),
            "report" => Ok(StageId::Report),
            other => Err(format!(
                "unknown stage '{}' (expected one of: explore, tech-summary, market-eval, competitor, invest, report)",
                other
            )),
        }
    }
}

impl std::fmt::Display for StageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_order() {
        let all = StageId::all();
        assert_eq!(all[0], StageId::Explore);
        assert_eq!(all[5], StageId::Report);
        assert_eq!(all.len(), 6);
    }

    #[test]
    fn test_stage_id_parsing() {
        assert_eq!("explore".parse::<StageId>().unwrap(), StageId::Explore);
        assert_eq!("tech".parse::<StageId>().unwrap(), StageId::TechSummary);
        assert_eq!(
            "tech_summary".parse::<StageId>().unwrap(),
            StageId::TechSummary
        );
        assert_eq!(
            "Market-Eval".parse::<StageId>().unwrap(),
            StageId::MarketEval
        );
        assert!("unknown".parse::<StageId>().is_err());
    }

    #[test]
    fn test_display_round_trip() {
        for stage in StageId::all() {
            assert_eq!(stage.to_string().parse::<StageId>().unwrap(), stage);
        }
    }
}
