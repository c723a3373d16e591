//! Result assembly: the serializable output of one run.

use chrono::{DateTime, TimeZone};
use serde::{Deserialize, Serialize};

use crate::refine::RefinedSection;

/// Timestamp layout used in run metadata
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// Run metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub input_documents: Vec<String>,
    pub persona: String,
    pub job_to_be_done: String,
    pub processing_timestamp: String,
}

/// One ranked section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedSection {
    pub document: String,
    pub section_title: String,
    pub importance_rank: usize,
    pub page_number: u32,
}

/// Refined text for the section at the same index in `extracted_sections`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubsectionAnalysis {
    pub document: String,
    pub refined_text: String,
    pub page_number: u32,
}

/// Output of one run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunResult {
    pub metadata: Metadata,
    pub extracted_sections: Vec<ExtractedSection>,
    pub subsection_analysis: Vec<SubsectionAnalysis>,
}

/// Format a timestamp for metadata
pub fn format_timestamp<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    at.format(TIMESTAMP_FORMAT).to_string()
}

/// Split refined sections into the two index-aligned output lists
pub fn assemble(
    input_documents: Vec<String>,
    persona: &str,
    task: &str,
    processing_timestamp: String,
    sections: &[RefinedSection],
) -> RunResult {
    let (extracted_sections, subsection_analysis) = sections
        .iter()
        .map(|refined| {
            let unit = &refined.section.scored.unit;
            (
                ExtractedSection {
                    document: unit.document_id.clone(),
                    section_title: refined.section_title.clone(),
                    importance_rank: refined.section.rank,
                    page_number: unit.page_number,
                },
                SubsectionAnalysis {
                    document: unit.document_id.clone(),
                    refined_text: refined.refined_text.clone(),
                    page_number: unit.page_number,
                },
            )
        })
        .unzip();

    RunResult {
        metadata: Metadata {
            input_documents,
            persona: persona.to_string(),
            job_to_be_done: task.to_string(),
            processing_timestamp,
        },
        extracted_sections,
        subsection_analysis,
    }
}
