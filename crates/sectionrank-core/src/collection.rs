//! Collection directories: request JSON and PDFs in, result JSON out.
//!
//! Layout:
//! ```text
//! <collection>/
//!   challenge1b_input.json
//!   PDFs/<filename>.pdf
//!   challenge1b_output.json   (written)
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::assemble::RunResult;
use crate::pdf;
use crate::pipeline::RunRequest;

pub const INPUT_FILE: &str = "challenge1b_input.json";
pub const OUTPUT_FILE: &str = "challenge1b_output.json";
pub const PDF_DIR: &str = "PDFs";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChallengeInfo {
    pub challenge_id: String,
    pub test_case_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRef {
    pub filename: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Persona {
    pub role: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobToBeDone {
    pub task: String,
}

/// Request file of a collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub challenge_info: Option<ChallengeInfo>,
    pub documents: Vec<DocumentRef>,
    pub persona: Persona,
    pub job_to_be_done: JobToBeDone,
}

/// A collection directory on disk
#[derive(Debug, Clone)]
pub struct Collection {
    pub dir: PathBuf,
}

impl Collection {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn input_path(&self) -> PathBuf {
        self.dir.join(INPUT_FILE)
    }

    pub fn pdf_dir(&self) -> PathBuf {
        self.dir.join(PDF_DIR)
    }

    pub fn output_path(&self) -> PathBuf {
        self.dir.join(OUTPUT_FILE)
    }

    /// Read the request file
    pub fn read_input(&self) -> Result<CollectionInput> {
        let path = self.input_path();
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read input file {:?}", path))?;
        serde_json::from_str(&content).with_context(|| format!("Invalid input file {:?}", path))
    }

    /// Read the request and extract every listed PDF.
    ///
    /// A PDF that is missing or cannot be parsed is skipped with a warning;
    /// it still appears in the run metadata.
    pub fn load(&self) -> Result<RunRequest> {
        let input = self.read_input()?;
        let pdf_dir = self.pdf_dir();

        let mut documents = Vec::with_capacity(input.documents.len());
        for doc in &input.documents {
            let path = pdf_dir.join(&doc.filename);
            if !path.is_file() {
                tracing::warn!("PDF not found: {:?}", path);
                continue;
            }

            match pdf::extract_pages(&path) {
                Ok(extracted) => {
                    tracing::debug!(
                        document = %doc.filename,
                        pages = extracted.page_count(),
                        "Extracted document"
                    );
                    documents.push(extracted.into_document(doc.filename.clone()));
                }
                Err(e) => {
                    tracing::warn!(document = %doc.filename, error = %e, "Skipping unreadable PDF");
                }
            }
        }

        let input_documents = input.documents.iter().map(|d| d.filename.clone()).collect();

        Ok(RunRequest {
            persona: input.persona.role,
            task: input.job_to_be_done.task,
            input_documents,
            documents,
        })
    }

    /// Write the result next to the input
    pub fn write_result(&self, result: &RunResult) -> Result<PathBuf> {
        let path = self.output_path();
        write_result(&path, result)?;
        Ok(path)
    }
}

/// Load the run request of the collection at `dir`
pub fn load_collection(dir: &Path) -> Result<RunRequest> {
    Collection::new(dir).load()
}

/// Write a result as pretty-printed JSON, creating parent directories
pub fn write_result(path: &Path, result: &RunResult) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {:?}", parent))?;
    }
    let json = serde_json::to_string_pretty(result).context("Failed to serialize result")?;
    std::fs::write(path, json).with_context(|| format!("Failed to write {:?}", path))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assemble::{ExtractedSection, Metadata, SubsectionAnalysis};
    use crate::pdf::extractor::tests::create_multipage_pdf;

    const INPUT_JSON: &str = r#"{
        "challenge_info": {
            "challenge_id": "round_1b_001",
            "test_case_name": "menu_planning"
        },
        "documents": [
            {"filename": "Dinner Ideas.pdf", "title": "Dinner Ideas"},
            {"filename": "Missing.pdf", "title": "Missing"}
        ],
        "persona": {"role": "Food Contractor"},
        "job_to_be_done": {"task": "Prepare a vegetarian buffet-style dinner menu"}
    }"#;

    fn write_collection(dir: &Path) {
        std::fs::write(dir.join(INPUT_FILE), INPUT_JSON).unwrap();
        std::fs::create_dir_all(dir.join(PDF_DIR)).unwrap();
        std::fs::write(
            dir.join(PDF_DIR).join("Dinner Ideas.pdf"),
            create_multipage_pdf(&["Falafel Ingredients chickpeas", "", "Lasagna"]),
        )
        .unwrap();
    }

    #[test]
    fn test_read_input() {
        let temp_dir = tempfile::tempdir().unwrap();
        write_collection(temp_dir.path());

        let input = Collection::new(temp_dir.path()).read_input().unwrap();

        assert_eq!(input.persona.role, "Food Contractor");
        assert_eq!(input.documents.len(), 2);
        assert_eq!(
            input.challenge_info.unwrap().test_case_name,
            "menu_planning"
        );
    }

    #[test]
    fn test_input_without_challenge_info() {
        let input: CollectionInput = serde_json::from_str(
            r#"{"documents": [], "persona": {"role": "r"}, "job_to_be_done": {"task": "t"}}"#,
        )
        .unwrap();
        assert!(input.challenge_info.is_none());
    }

    #[test]
    fn test_load_skips_missing_pdf() {
        let temp_dir = tempfile::tempdir().unwrap();
        write_collection(temp_dir.path());

        let request = Collection::new(temp_dir.path()).load().unwrap();

        assert_eq!(request.persona, "Food Contractor");
        assert_eq!(request.input_documents, vec!["Dinner Ideas.pdf", "Missing.pdf"]);
        assert_eq!(request.documents.len(), 1);
        assert_eq!(request.documents[0].pages.len(), 3);
        assert_eq!(request.documents[0].pages[2].page_number, 3);
    }

    #[test]
    fn test_load_skips_corrupt_pdf() {
        let temp_dir = tempfile::tempdir().unwrap();
        write_collection(temp_dir.path());
        std::fs::write(temp_dir.path().join(PDF_DIR).join("Missing.pdf"), b"not a pdf").unwrap();

        let request = load_collection(temp_dir.path()).unwrap();

        assert_eq!(request.documents.len(), 1);
        assert_eq!(request.input_documents.len(), 2);
    }

    #[test]
    fn test_load_missing_input_fails() {
        let temp_dir = tempfile::tempdir().unwrap();

        let err = Collection::new(temp_dir.path()).load().unwrap_err();
        assert!(err.to_string().contains("Failed to read input file"));
    }

    #[test]
    fn test_write_result_round_trip() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("out").join(OUTPUT_FILE);
        let result = RunResult {
            metadata: Metadata {
                input_documents: vec!["Crêpes.pdf".into()],
                persona: "Chef".into(),
                job_to_be_done: "Cook".into(),
                processing_timestamp: "2025-01-01 00:00:00.000000".into(),
            },
            extracted_sections: vec![ExtractedSection {
                document: "Crêpes.pdf".into(),
                section_title: "Crêpes".into(),
                importance_rank: 1,
                page_number: 1,
            }],
            subsection_analysis: vec![SubsectionAnalysis {
                document: "Crêpes.pdf".into(),
                refined_text: "Thin pancakes.".into(),
                page_number: 1,
            }],
        };

        write_result(&path, &result).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("Crêpes"), "non-ASCII should be kept verbatim");
        let parsed: RunResult = serde_json::from_str(&written).unwrap();
        assert_eq!(parsed, result);
    }
}
