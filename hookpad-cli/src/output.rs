// ABOUTME: Output formatting for session history, image fits, and flow results
// ABOUTME: Provides table formatting with optional color and JSON formatting

use crate::fitting::{ContainerBox, FitResult};
use crate::flow::GeneratedImage;
use crate::session::HistoryEntry;
use anyhow::Result;
use owo_colors::OwoColorize;
use serde::Serialize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

pub trait OutputFormat {
    fn format_history(&self, entries: &[HistoryEntry]) -> Result<String>;
    fn format_fit(&self, container: ContainerBox, fit: &FitResult) -> Result<String>;
}

pub struct TableFormatter {
    use_color: bool,
}

impl TableFormatter {
    pub fn new(use_color: bool) -> Self {
        Self { use_color }
    }

    fn format_title(&self, entry: &HistoryEntry) -> String {
        let title = if entry.active {
            format!("* {}", entry.title)
        } else {
            entry.title.clone()
        };

        if self.use_color && entry.active {
            title.green().bold().to_string()
        } else {
            title
        }
    }

    fn format_method(&self, fit: &FitResult) -> String {
        let method = fit.method.to_string();
        if !self.use_color {
            return method;
        }
        if fit.method.is_adjusted() {
            method.yellow().to_string()
        } else {
            method.cyan().to_string()
        }
    }

    fn dim(&self, text: &str) -> String {
        if self.use_color {
            text.dimmed().to_string()
        } else {
            text.to_string()
        }
    }
}

#[derive(Tabled)]
struct HistoryRow {
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Updated")]
    date: String,
    #[tabled(rename = "Session")]
    session_id: String,
}

#[derive(Tabled)]
struct FieldRow {
    #[tabled(rename = "Field")]
    field: String,
    #[tabled(rename = "Value")]
    value: String,
}

impl FieldRow {
    fn new(field: &str, value: String) -> Self {
        Self {
            field: field.to_string(),
            value,
        }
    }
}

impl OutputFormat for TableFormatter {
    fn format_history(&self, entries: &[HistoryEntry]) -> Result<String> {
        if entries.is_empty() {
            return Ok(self.dim("No saved prompts yet"));
        }

        let rows: Vec<HistoryRow> = entries
            .iter()
            .map(|entry| HistoryRow {
                title: self.format_title(entry),
                date: entry.date.clone(),
                session_id: self.dim(&entry.session_id),
            })
            .collect();

        let mut table = Table::new(rows);
        table.with(Style::psql());
        Ok(table.to_string())
    }

    fn format_fit(&self, container: ContainerBox, fit: &FitResult) -> Result<String> {
        let rows = vec![
            FieldRow::new(
                "Original",
                format!("{}x{}", fit.original_width, fit.original_height),
            ),
            FieldRow::new(
                "Container",
                format!("{:.0}x{:.0}", container.width, container.height),
            ),
            FieldRow::new("Fitted", format!("{}x{}", fit.width, fit.height)),
            FieldRow::new("Scale", format!("{:.3}", fit.scale)),
            FieldRow::new("Method", self.format_method(fit)),
        ];

        let mut table = Table::new(rows);
        table.with(Style::psql());
        Ok(table.to_string())
    }
}

pub struct JsonFormatter {
    pretty: bool,
}

impl JsonFormatter {
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    fn render<T: Serialize + ?Sized>(&self, value: &T) -> Result<String> {
        if self.pretty {
            Ok(serde_json::to_string_pretty(value)?)
        } else {
            Ok(serde_json::to_string(value)?)
        }
    }
}

#[derive(Serialize)]
struct FitReport<'a> {
    container: ContainerBox,
    #[serde(flatten)]
    fit: &'a FitResult,
}

impl OutputFormat for JsonFormatter {
    fn format_history(&self, entries: &[HistoryEntry]) -> Result<String> {
        self.render(entries)
    }

    fn format_fit(&self, container: ContainerBox, fit: &FitResult) -> Result<String> {
        self.render(&FitReport { container, fit })
    }
}

/// One-line description of a saved image.
pub fn format_generated_image(image: &GeneratedImage, use_color: bool) -> String {
    let path = image.path.display().to_string();
    let path = if use_color {
        path.bold().to_string()
    } else {
        path
    };

    let mut line = format!(
        "Saved {} ({}, {}, {})",
        path, image.mime, image.dimensions, image.size
    );
    if let Some(fit) = &image.fit {
        line.push_str(&format!(
            "; display at {}x{} ({})",
            fit.width, fit.height, fit.method
        ));
    }
    line
}

/// Hint line shown under the editor content.
pub fn format_hint(hint: &str, use_color: bool) -> String {
    if use_color {
        format!("{} {}", "hint:".dimmed(), hint.italic())
    } else {
        format!("hint: {}", hint)
    }
}
