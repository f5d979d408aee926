//! Text and JSON rendering of a pipeline run.
use crate::pipeline::StageResult;
use crate::workflow::{PipelineReport, StageReport, StageStatus};
use anyhow::{Context, Result};
use std::fmt::Write as _;

/// Pretty JSON for `agro run --json`.
pub fn render_json(report: &PipelineReport) -> Result<String> {
    serde_json::to_string_pretty(report).context("serialize pipeline report")
}

/// One line per stage that ran, then warnings and the final position.
pub fn render_text(report: &PipelineReport) -> String {
    let mut out = String::new();
    for stage in &report.stages {
        let _ = writeln!(
            out,
            "{:<11} {:<9} {}",
            stage.stage.as_str(),
            status_label(stage.status),
            summary(stage)
        );
    }
    for warning in &report.warnings {
        let _ = writeln!(out, "warning: {warning}");
    }
    match report.halted_at {
        Some(stage) => {
            let _ = writeln!(out, "halted at {stage}");
        }
        None => {
            let _ = writeln!(out, "reached {}", report.reached);
        }
    }
    out
}

fn status_label(status: StageStatus) -> &'static str {
    match status {
        StageStatus::Succeeded => "ok",
        StageStatus::Failed => "failed",
        StageStatus::Blocked => "blocked",
    }
}

fn summary(stage: &StageReport) -> String {
    if let Some(result) = &stage.result {
        return describe_result(result);
    }
    match (&stage.message, &stage.detail) {
        (Some(message), Some(detail)) => format!("{message} ({detail})"),
        (Some(message), None) => message.clone(),
        _ => String::new(),
    }
}

fn describe_result(result: &StageResult) -> String {
    match result {
        StageResult::Weather(reading) => format!(
            "temperature {:.1} C, rainfall {} mm",
            reading.temperature, reading.rainfall_estimate
        ),
        StageResult::Crop(prediction) => prediction.crop.clone(),
        StageResult::Nutrients(prediction) => {
            let rounded = prediction.rounded();
            format!(
                "N {:.2}  P {:.2}  K {:.2}",
                rounded.nitrogen, rounded.phosphorus, rounded.potassium
            )
        }
        StageResult::Fertilizer(prediction) => prediction.fertilizer.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::StageContext;
    use crate::gateway::{CropPrediction, NutrientPrediction};
    use crate::pipeline::Stage;

    fn report() -> PipelineReport {
        PipelineReport {
            reached: Stage::Fertilizer,
            halted_at: Some(Stage::Fertilizer),
            stages: vec![
                StageReport {
                    stage: Stage::Crop,
                    status: StageStatus::Succeeded,
                    result: Some(StageResult::Crop(CropPrediction {
                        crop: "Rice".to_string(),
                    })),
                    message: None,
                    detail: None,
                },
                StageReport {
                    stage: Stage::Nutrients,
                    status: StageStatus::Succeeded,
                    result: Some(StageResult::Nutrients(NutrientPrediction {
                        nitrogen: 12.345,
                        phosphorus: 7.0,
                        potassium: 99.999,
                    })),
                    message: None,
                    detail: None,
                },
                StageReport {
                    stage: Stage::Fertilizer,
                    status: StageStatus::Failed,
                    result: None,
                    message: Some("There was an error making the prediction request!".to_string()),
                    detail: Some("connection refused".to_string()),
                },
            ],
            context: StageContext::default(),
            warnings: vec!["location lookup failed".to_string()],
        }
    }

    #[test]
    fn text_lists_each_stage_and_halt() {
        let text = render_text(&report());
        assert!(text.contains("crop        ok        Rice"));
        assert!(text.contains("N 12.35  P 7.00  K 100.00"));
        assert!(text.contains("fertilizer  failed    There was an error"));
        assert!(text.contains("warning: location lookup failed"));
        assert!(text.trim_end().ends_with("halted at fertilizer"));
    }

    #[test]
    fn json_tags_results_by_kind() {
        let json = render_json(&report()).expect("render json");
        let value: serde_json::Value = serde_json::from_str(&json).expect("parse json");
        assert_eq!(value["halted_at"], "fertilizer");
        assert_eq!(value["stages"][0]["result"]["kind"], "crop");
        assert_eq!(value["stages"][2]["status"], "failed");
        assert!(value["stages"][0].get("message").is_none());
    }
}
