//! Markdown report rendering
//!
//! Renders the fully annotated record into a per-company investment
//! report. Reports are only produced for recommended companies; the
//! gate lives in the report stage, this module just renders and writes.

use crate::record::{InvestmentRecord, SCORE_WEIGHTS};
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Maps a company name to a filesystem-safe slug: lowercased, runs of
/// non-alphanumeric characters collapsed to single dashes.
pub fn sanitize_company_name(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut last_dash = true;

    for c in name.chars() {
        if c.is_alphanumeric() {
            for lower in c.to_lowercase() {
                slug.push(lower);
            }
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }

    while slug.ends_with('-') {
        slug.pop();
    }

    if slug.is_empty() {
        "company".to_string()
    } else {
        slug
    }
}

fn section(text: &str) -> &str {
    if text.trim().is_empty() {
        "N/A"
    } else {
        text
    }
}

/// Renders the full report body. `executive_summary` may be empty, in
/// which case the section is omitted.
pub fn render_markdown(record: &InvestmentRecord, executive_summary: &str) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "# Investment Evaluation Report: {}\n\n",
        record.company_name()
    ));

    if !executive_summary.trim().is_empty() {
        out.push_str("## Executive Summary\n");
        out.push_str(executive_summary.trim());
        out.push_str("\n\n");
    }

    out.push_str("## Company Overview\n");
    out.push_str(&format!("- Owner: {}\n", section(&record.owner)));
    out.push_str(&format!("- Core technology: {}\n", section(&record.core_tech)));
    out.push_str(&format!("- Strengths: {}\n", section(&record.pros)));
    out.push_str(&format!("- Patents: {}\n", section(&record.patents)));
    out.push_str(&format!(
        "- Funding history: {}\n\n",
        section(&record.investments)
    ));

    out.push_str("## Technology Summary\n");
    out.push_str(section(&record.tech_summary));
    out.push_str("\n\n");
    out.push_str(&format!(
        "- Strengths and weaknesses: {}\n",
        section(&record.strengths_and_weaknesses)
    ));
    out.push_str(&format!(
        "- Differentiation: {}\n",
        section(&record.differentiation_points)
    ));
    out.push_str(&format!(
        "- Technical risks: {}\n",
        section(&record.technical_risks)
    ));
    if !record.patents_and_papers.is_empty() {
        out.push_str(&format!(
            "- Patents and papers: {}\n",
            record.patents_and_papers.join(", ")
        ));
    }
    out.push('\n');

    out.push_str("## Market Evaluation\n");
    out.push_str(&format!(
        "- Industry trends: {}\n",
        section(&record.industry_trends)
    ));
    out.push_str(&format!("- Market size: {}\n", section(&record.market_size)));
    out.push_str(&format!(
        "- Regulatory barriers: {}\n",
        section(&record.regulatory_barriers)
    ));
    out.push_str(&format!(
        "- Customer segments: {}\n\n",
        section(&record.customer_segments)
    ));

    out.push_str("## Competitor Analysis\n");
    out.push_str(&format!(
        "- Main competitors: {}\n",
        section(&record.main_competitors)
    ));
    out.push_str(&format!(
        "- Profiles: {}\n",
        section(&record.competitor_profiles)
    ));
    out.push_str(&format!(
        "- Market positioning: {}\n",
        section(&record.market_positioning)
    ));
    out.push_str(&format!(
        "- Product comparison: {}\n",
        section(&record.product_comparison)
    ));
    out.push_str(&format!(
        "- Unique value propositions: {}\n",
        section(&record.unique_value_props)
    ));
    out.push_str(&format!(
        "- Threat analysis: {}\n",
        section(&record.threat_analysis)
    ));
    out.push_str(&format!(
        "- Market share: {}\n\n",
        section(&record.market_share)
    ));

    out.push_str("## Scores\n");
    out.push_str("| Criterion | Weight | Score |\n");
    out.push_str("|-----------|--------|-------|\n");
    for (criterion, weight) in SCORE_WEIGHTS {
        let score = record
            .scores()
            .get(criterion)
            .map(|s| s.to_string())
            .unwrap_or_else(|| "-".to_string());
        out.push_str(&format!("| {} | {:.2} | {} |\n", criterion, weight, score));
    }
    if let Some(total) = record.total_score() {
        out.push_str(&format!("\n**Weighted total: {:.1}**\n", total));
    }
    out.push('\n');

    out.push_str("## Decision\n");
    match record.decision() {
        Some(decision) => out.push_str(&format!("{}\n", decision)),
        None => out.push_str("not scored\n"),
    }

    if !record.reference_urls.is_empty() {
        out.push_str("\n## References\n");
        for url in &record.reference_urls {
            out.push_str(&format!("- {}\n", url));
        }
    }

    out
}

/// Writes the report under `reports_dir` and returns its path.
pub fn write_report(
    reports_dir: &Path,
    record: &InvestmentRecord,
    executive_summary: &str,
) -> Result<PathBuf> {
    fs::create_dir_all(reports_dir)
        .with_context(|| format!("creating reports dir {}", reports_dir.display()))?;

    let filename = format!("{}_report.md", sanitize_company_name(record.company_name()));
    let path = reports_dir.join(filename);

    let content = render_markdown(record, executive_summary);
    fs::write(&path, content).with_context(|| format!("writing report {}", path.display()))?;

    Ok(path)
}
