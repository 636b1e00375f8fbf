use clap::{Parser, Subcommand};
use genai::adapter::AdapterKind;
use std::path::PathBuf;

use crate::pipeline::StageId;

/// LLM-driven investment screening for startup deal flow
#[derive(Parser, Debug)]
#[command(
    name = "dealscope",
    about = "LLM-driven investment screening for startup deal flow",
    version,
    author,
    long_about = "dealscope runs a fixed analysis pipeline over a checkpoint of startup \
                  companies: exploration, technology validation, market evaluation, \
                  competitor analysis, weighted scoring, and report generation. It \
                  supports multiple model providers (Ollama, OpenAI, Claude, Gemini, \
                  Grok, Groq) and resumes from any stage."
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, global = true, value_name = "LEVEL", help = "Set logging level")]
    pub log_level: Option<String>,

    #[arg(short = 'v', long, global = true, help = "Enable debug output")]
    pub verbose: bool,

    #[arg(
        short = 'q',
        long,
        global = true,
        conflicts_with = "verbose",
        help = "Only log errors; skip the progress bar"
    )]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(
        about = "Analyze companies from the checkpoint",
        long_about = "Runs the analysis pipeline for every company in the checkpoint, or \
                      for one named company, and merges results back into the checkpoint \
                      after each company.\n\n\
                      Examples:\n  \
                      dealscope analyze\n  \
                      dealscope analyze \"Acme Robotics\"\n  \
                      dealscope analyze --from invest\n  \
                      dealscope analyze --provider openai --model gpt-4o-mini"
    )]
    Analyze(AnalyzeArgs),

    #[command(
        about = "Check provider availability",
        long_about = "Checks the configured model provider with a minimal chat round trip \
                      and reports which search providers are configured.\n\n\
                      Examples:\n  \
                      dealscope health\n  \
                      dealscope health --provider ollama"
    )]
    Health(HealthArgs),
}

#[derive(Parser, Debug, Clone)]
pub struct AnalyzeArgs {
    #[arg(
        value_name = "COMPANY",
        help = "Analyze only this company (added to the checkpoint if absent)"
    )]
    pub company: Option<String>,

    #[arg(
        short = 'c',
        long,
        value_name = "FILE",
        help = "Checkpoint file holding the company array"
    )]
    pub checkpoint: Option<PathBuf>,

    #[arg(
        long,
        value_name = "DIR",
        help = "Directory to write recommendation reports into"
    )]
    pub reports_dir: Option<PathBuf>,

    #[arg(
        long,
        value_name = "STAGE",
        help = "Resume from this stage (explore, tech-summary, market-eval, competitor, invest, report)"
    )]
    pub from: Option<StageId>,

    #[arg(
        short = 'p',
        long,
        value_parser = parse_adapter_kind,
        help = "Model provider to use (overrides DEALSCOPE_PROVIDER)"
    )]
    pub provider: Option<AdapterKind>,

    #[arg(
        short = 'm',
        long,
        value_name = "MODEL",
        help = "Model name to use (provider-specific, e.g. 'qwen2.5:7b' for Ollama)"
    )]
    pub model: Option<String>,

    #[arg(
        long,
        value_name = "SECONDS",
        help = "Request timeout in seconds (overrides DEALSCOPE_REQUEST_TIMEOUT)"
    )]
    pub timeout: Option<u64>,

    #[arg(long, help = "Disable the terminal progress bar")]
    pub no_progress: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct HealthArgs {
    #[arg(
        short = 'p',
        long,
        value_parser = parse_adapter_kind,
        help = "Model provider to check (overrides DEALSCOPE_PROVIDER)"
    )]
    pub provider: Option<AdapterKind>,

    #[arg(
        short = 'm',
        long,
        value_name = "MODEL",
        help = "Model name to check with"
    )]
    pub model: Option<String>,
}

fn parse_adapter_kind(s: &str) -> Result<AdapterKind, String> {
    AdapterKind::from_lower_str(&s.to_lowercase()).ok_or_else(|| {
        format!(
            "unknown provider '{}' (expected one of: ollama, openai, anthropic, gemini, xai, groq)",
            s
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_args_verify() {
        // Verify that CLI structure is valid
        CliArgs::command().debug_assert();
    }

    #[test]
    fn test_default_analyze_args() {
        let args = CliArgs::parse_from(["dealscope", "analyze"]);
        match args.command {
            Commands::Analyze(analyze_args) => {
                assert!(analyze_args.company.is_none());
                assert!(analyze_args.checkpoint.is_none());
                assert!(analyze_args.from.is_none());
                assert!(analyze_args.provider.is_none());
                assert!(analyze_args.timeout.is_none());
                assert!(!analyze_args.no_progress);
            }
            _ => panic!("Expected Analyze command"),
        }
    }

    #[test]
    fn test_analyze_with_company() {
        let args = CliArgs::parse_from(["dealscope", "analyze", "Acme Robotics"]);
        match args.command {
            Commands::Analyze(analyze_args) => {
                assert_eq!(analyze_args.company, Some("Acme Robotics".to_string()));
            }
            _ => panic!("Expected Analyze command"),
        }
    }

    #[test]
    fn test_analyze_with_options() {
        let args = CliArgs::parse_from([
            "dealscope",
            "analyze",
            "--checkpoint",
            "/data/run.json",
            "--from",
            "invest",
            "--provider",
            "ollama",
            "--model",
            "qwen2.5:7b",
            "--timeout",
            "120",
            "--no-progress",
        ]);

        match args.command {
            Commands::Analyze(analyze_args) => {
                assert_eq!(analyze_args.checkpoint, Some(PathBuf::from("/data/run.json")));
                assert_eq!(analyze_args.from, Some(StageId::Invest));
                assert_eq!(analyze_args.provider, Some(AdapterKind::Ollama));
                assert_eq!(analyze_args.model, Some("qwen2.5:7b".to_string()));
                assert_eq!(analyze_args.timeout, Some(120));
                assert!(analyze_args.no_progress);
            }
            _ => panic!("Expected Analyze command"),
        }
    }

    #[test]
    fn test_analyze_from_stage_aliases() {
        let args = CliArgs::parse_from(["dealscope", "analyze", "--from", "tech_summary"]);
        match args.command {
            Commands::Analyze(analyze_args) => {
                assert_eq!(analyze_args.from, Some(StageId::TechSummary));
            }
            _ => panic!("Expected Analyze command"),
        }
    }

    #[test]
    fn test_analyze_rejects_unknown_stage() {
        let result = CliArgs::try_parse_from(["dealscope", "analyze", "--from", "scoring"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_health_command() {
        let args = CliArgs::parse_from(["dealscope", "health"]);
        match args.command {
            Commands::Health(health_args) => {
                assert!(health_args.provider.is_none());
                assert!(health_args.model.is_none());
            }
            _ => panic!("Expected Health command"),
        }
    }

    #[test]
    fn test_health_with_provider() {
        let args = CliArgs::parse_from(["dealscope", "health", "--provider", "ollama"]);
        match args.command {
            Commands::Health(health_args) => {
                assert_eq!(health_args.provider, Some(AdapterKind::Ollama));
            }
            _ => panic!("Expected Health command"),
        }
    }

    #[test]
    fn test_global_verbose_flag() {
        let args = CliArgs::parse_from(["dealscope", "-v", "analyze"]);
        assert!(args.verbose);
        assert!(!args.quiet);
    }

    #[test]
    fn test_global_quiet_flag() {
        let args = CliArgs::parse_from(["dealscope", "-q", "analyze"]);
        assert!(!args.verbose);
        assert!(args.quiet);
    }

    #[test]
    fn test_log_level_flag() {
        let args = CliArgs::parse_from(["dealscope", "--log-level", "debug", "analyze"]);
        assert_eq!(args.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_adapter_kind_parsing() {
        assert!(parse_adapter_kind("ollama").is_ok());
        assert!(parse_adapter_kind("openai").is_ok());
        assert!(parse_adapter_kind("anthropic").is_ok());
        assert!(parse_adapter_kind("gemini").is_ok());
        assert!(parse_adapter_kind("xai").is_ok());
        assert!(parse_adapter_kind("groq").is_ok());
        assert!(parse_adapter_kind("invalid").is_err());
    }
}
