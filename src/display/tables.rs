//! Table formatting for recommendations, mentor listings and build reports.

use comfy_table::{
    Attribute, Cell, CellAlignment, Color, Table, modifiers::UTF8_ROUND_CORNERS,
    presets::UTF8_FULL,
};

use crate::display::ScoreBand;
use crate::semantic::IndexManifest;
use crate::types::{BuildReport, BuildStatus, MentorRecord, RecommendResponse};

/// Builder for creating formatted tables.
pub struct TableBuilder {
    table: Table,
}

impl Default for TableBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TableBuilder {
    pub fn new() -> Self {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.apply_modifier(UTF8_ROUND_CORNERS);
        Self { table }
    }

    pub fn set_headers(mut self, headers: Vec<&str>) -> Self {
        let header_cells: Vec<Cell> = headers
            .into_iter()
            .map(|h| Cell::new(h).add_attribute(Attribute::Bold))
            .collect();
        self.table.set_header(header_cells);
        self
    }

    pub fn add_row(mut self, row: Vec<String>) -> Self {
        self.table.add_row(row);
        self
    }

    pub fn add_cells(mut self, row: Vec<Cell>) -> Self {
        self.table.add_row(row);
        self
    }

    pub fn build(self) -> String {
        self.table.to_string()
    }
}

fn text(value: &Option<String>) -> String {
    value.clone().unwrap_or_else(|| "-".to_string())
}

/// Ranked results, best first.
pub fn recommendation_table(response: &RecommendResponse) -> String {
    let mut builder = TableBuilder::new().set_headers(vec![
        "#", "Score", "Name", "Department", "Position", "Company", "Location", "Expertise",
    ]);

    for (rank, result) in response.results.iter().enumerate() {
        let score_color = match ScoreBand::of(result.score) {
            ScoreBand::Strong => Color::Green,
            ScoreBand::Fair => Color::Yellow,
            ScoreBand::Weak => Color::Reset,
        };
        builder = builder.add_cells(vec![
            Cell::new(rank + 1).set_alignment(CellAlignment::Right),
            Cell::new(format!("{:.3}", result.score)).fg(score_color),
            Cell::new(text(&result.name)),
            Cell::new(text(&result.department)),
            Cell::new(text(&result.position)),
            Cell::new(text(&result.company)),
            Cell::new(text(&result.location)),
            Cell::new(text(&result.expertise)),
        ]);
    }

    builder.build()
}

pub fn mentor_table(mentors: &[MentorRecord]) -> String {
    let mut builder = TableBuilder::new().set_headers(vec![
        "ID", "Name", "Department", "Company", "Location", "Available", "Max mentees",
    ]);

    for mentor in mentors {
        builder = builder.add_row(vec![
            mentor.mentor_id.to_string(),
            text(&mentor.name),
            text(&mentor.department),
            text(&mentor.company),
            text(&mentor.location),
            if mentor.availability { "yes" } else { "no" }.to_string(),
            mentor
                .max_mentees
                .map_or_else(|| "-".to_string(), |m| m.to_string()),
        ]);
    }

    builder.build()
}

pub fn build_report_table(report: &BuildReport) -> String {
    let (status, color) = match report.status {
        BuildStatus::Ok => ("published", Color::Green),
        BuildStatus::Empty => ("nothing to build", Color::Yellow),
        BuildStatus::Error => ("failed", Color::Red),
    };

    let mut builder = TableBuilder::new()
        .set_headers(vec!["Build", "Value"])
        .add_cells(vec![
            Cell::new("Status"),
            Cell::new(status).fg(color).add_attribute(Attribute::Bold),
        ])
        .add_row(vec![
            "Mentors indexed".to_string(),
            report.records_processed.to_string(),
        ]);

    if let Some(dimension) = report.dimension {
        builder = builder.add_row(vec!["Dimension".to_string(), dimension.to_string()]);
    }
    if let Some(generation) = &report.generation {
        builder = builder.add_row(vec!["Generation".to_string(), generation.clone()]);
    }
    if let Some(error) = &report.error {
        builder = builder.add_cells(vec![Cell::new("Error"), Cell::new(error).fg(Color::Red)]);
    }

    builder.build()
}

/// Summary of the served generation.
pub fn index_info_table(generation: &str, manifest: &IndexManifest, kept: usize) -> String {
    TableBuilder::new()
        .set_headers(vec!["Index", "Value"])
        .add_row(vec!["Generation".to_string(), generation.to_string()])
        .add_row(vec!["Mentors".to_string(), manifest.record_count.to_string()])
        .add_row(vec!["Model".to_string(), manifest.model_name.clone()])
        .add_row(vec![
            "Dimension".to_string(),
            manifest.dimension.get().to_string(),
        ])
        .add_row(vec!["Created".to_string(), manifest.created_at.to_rfc3339()])
        .add_row(vec!["Generations on disk".to_string(), kept.to_string()])
        .build()
}
