//! Output formatting for the CLI.

use cga_core::{CoverageEntry, PageEntityTable, SerpResult};
use cga_gap::GapReport;
use clap::ValueEnum;
use colored::Colorize;
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Format a gap analysis report.
    pub fn format_report(&self, report: &GapReport, missing_only: bool) -> anyhow::Result<String> {
        let entries: Vec<&CoverageEntry> = if missing_only {
            report.missing().collect()
        } else {
            report.coverage.iter().collect()
        };

        match self.format {
            OutputFormat::Json if missing_only => Ok(serde_json::to_string_pretty(&entries)?),
            OutputFormat::Json => Ok(report.to_json()?),
            OutputFormat::Table => {
                let summary = report.summary();
                let mut out = self.coverage_table(&entries);
                out.push('\n');
                out.push_str(&self.info(&format!(
                    "{} pages analyzed, {} with entities, {} entities, {} missing from {}",
                    summary.pages_analyzed,
                    summary.pages_with_entities,
                    summary.distinct_entities,
                    summary.missing_entities,
                    report.target_url
                )));
                Ok(out)
            }
        }
    }

    /// Format search results.
    pub fn format_serp(&self, results: &[SerpResult]) -> anyhow::Result<String> {
        if self.format == OutputFormat::Json {
            return Ok(serde_json::to_string_pretty(results)?);
        }
        if results.is_empty() {
            return Ok(self.colorize("No search results found.", "yellow"));
        }

        let mut builder = Builder::default();
        builder.push_record(["Position", "Source", "Link", "Snippet"]);
        for result in results {
            builder.push_record([
                result.position.map(|p| p.to_string()).unwrap_or_default(),
                result.source.clone().unwrap_or_default(),
                result.link.clone(),
                truncate(result.snippet.as_deref().unwrap_or_default(), 80),
            ]);
        }

        Ok(render(builder))
    }

    /// Format one page's entity table.
    pub fn format_entities(&self, table: &PageEntityTable) -> anyhow::Result<String> {
        if self.format == OutputFormat::Json {
            return Ok(serde_json::to_string_pretty(table)?);
        }
        if table.is_empty() {
            return Ok(self.colorize(&format!("No entities found for {}.", table.url()), "yellow"));
        }

        let mut builder = Builder::default();
        builder.push_record(["Entity", "Salience"]);
        for record in table.records() {
            builder.push_record([record.name.clone(), format!("{:.4}", record.salience)]);
        }

        Ok(render(builder))
    }

    /// Coverage table with gap rows highlighted.
    fn coverage_table(&self, entries: &[&CoverageEntry]) -> String {
        if entries.is_empty() {
            return self.colorize("No entities found.", "yellow");
        }

        let mut builder = Builder::default();
        builder.push_record(["#", "Entity", "Count", "Missing", "URLs"]);
        for (i, entry) in entries.iter().enumerate() {
            builder.push_record([
                (i + 1).to_string(),
                entry.entity.clone(),
                entry.count.to_string(),
                if entry.missing { "yes" } else { "no" }.to_string(),
                entry.urls.join(", "),
            ]);
        }

        let rendered = render(builder);
        if !self.color_enabled {
            return rendered;
        }

        // Rounded style: top border, header, separator, then one line per row
        rendered
            .lines()
            .enumerate()
            .map(|(line_no, line)| match line_no.checked_sub(3).and_then(|i| entries.get(i)) {
                Some(entry) if entry.missing => line.yellow().to_string(),
                _ => line.to_string(),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an info message.
    pub fn info(&self, message: &str) -> String {
        self.colorize(&format!("ℹ {}", message), "blue")
    }

    /// Colorize text if colors are enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "yellow" => text.yellow().to_string(),
            "blue" => text.blue().to_string(),
            _ => text.to_string(),
        }
    }
}

fn render(builder: Builder) -> String {
    let mut table = builder.build();
    table
        .with(Style::rounded())
        .with(Modify::new(Rows::first()).with(Alignment::center()));
    table.to_string()
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    out.push('…');
    out
}
