//! # Score CLI
//!
//! `veid score --inputs FILE` computes a composite identity score and
//! prints the full result, contributions and reason codes included.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use veid_scoring::{CompositeScoreResult, CompositeScoringInputs};

use crate::config::VeidConfig;
use crate::{print_json, read_document};

/// `veid score` arguments.
#[derive(Args, Debug)]
pub struct ScoreArgs {
    /// Scoring inputs (JSON or YAML).
    #[arg(long)]
    pub inputs: PathBuf,
}

/// Compute the score for an inputs file.
pub fn compute_score(inputs: &Path, config: &VeidConfig) -> Result<CompositeScoreResult> {
    let inputs: CompositeScoringInputs = read_document(inputs)?;
    let engine = config.scoring_engine()?;
    engine
        .compute(&inputs)
        .with_context(|| format!("failed to score {}", inputs.account))
}

/// Execute `veid score`.
pub fn run_score(args: &ScoreArgs, config: &VeidConfig) -> Result<u8> {
    let result = compute_score(&args.inputs, config)?;
    tracing::info!(
        account = %result.account,
        passed = result.passed,
        "composite score computed"
    );
    print_json(&result)?;
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use veid_scoring::ReasonCode;

    #[test]
    fn scores_a_yaml_inputs_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("inputs.yaml");
        std::fs::write(
            &path,
            "account: veid1alice\n\
             block_height: 12\n\
             timestamp: \"2023-11-14T22:13:20Z\"\n\
             document_authenticity:\n  present: true\n  authenticity_score: 9000\n  ocr_confidence: 9000\n  template_match: 9000\n\
             face_match:\n  present: true\n  similarity_score: 9000\n  quality_score: 9000\n",
        )
        .unwrap();
        let result = compute_score(&path, &VeidConfig::default()).unwrap();
        assert_eq!(result.final_score, 70);
        assert!(result.passed);
        assert!(result.reason_codes.contains(&ReasonCode::MissingLiveness));
    }

    #[test]
    fn out_of_range_metric_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("inputs.json");
        std::fs::write(
            &path,
            r#"{"account":"veid1alice","block_height":1,"timestamp":"2023-11-14T22:13:20Z",
                "face_match":{"present":true,"similarity_score":10001,"quality_score":0}}"#,
        )
        .unwrap();
        assert!(compute_score(&path, &VeidConfig::default()).is_err());
    }
}
