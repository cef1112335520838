//! Render an analysis as a downloadable JSON or CSV file.
//!
//! The JSON body has the same shape as the results endpoint. The CSV has one
//! row per component with the document fields repeated on every row:
//!
//! ```text
//! pdf_id,pdf_filename,analysis_type,component_name
//! 3,lathe.pdf,component_extraction,HSK-63
//! 3,lathe.pdf,component_extraction,5kW
//! ```

use std::str::FromStr;

use crate::error::{AnalyzerError, Result};
use crate::models::AnalysisRecord;

pub const CSV_HEADER: [&str; 4] = ["pdf_id", "pdf_filename", "analysis_type", "component_name"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Json => "application/json",
            ExportFormat::Csv => "text/csv",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = AnalyzerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "csv" => Ok(ExportFormat::Csv),
            _ => Err(AnalyzerError::InvalidArgument(format!(
                "Unsupported format: {}. Use 'json' or 'csv'.",
                s
            ))),
        }
    }
}

/// A rendered export, ready to be written to disk or sent as an attachment.
#[derive(Debug, Clone)]
pub struct ExportPayload {
    pub body: Vec<u8>,
    pub filename: String,
    pub content_type: &'static str,
}

pub fn render(record: &AnalysisRecord, format: ExportFormat) -> Result<ExportPayload> {
    let body = match format {
        ExportFormat::Json => serde_json::to_vec_pretty(record)?,
        ExportFormat::Csv => render_csv(record)?,
    };

    Ok(ExportPayload {
        body,
        filename: format!("analysis_{}.{}", record.document_id, format.extension()),
        content_type: format.content_type(),
    })
}

fn render_csv(record: &AnalysisRecord) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::CRLF)
        .from_writer(Vec::new());

    writer.write_record(CSV_HEADER)?;
    let id = record.document_id.to_string();
    for component in &record.components {
        writer.write_record([
            id.as_str(),
            record.filename.as_str(),
            record.analysis_type.as_str(),
            component.as_str(),
        ])?;
    }

    writer
        .into_inner()
        .map_err(|e| AnalyzerError::Serialization(e.to_string()))
}
