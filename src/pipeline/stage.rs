use serde::{Deserialize, Serialize};
use std::fmt;

/// Pipeline stages in the only order they can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Weather,
    Crop,
    Nutrients,
    Fertilizer,
    Done,
}

impl Stage {
    /// Return the stable string identifier used in JSON output.
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Weather => "weather",
            Stage::Crop => "crop",
            Stage::Nutrients => "nutrients",
            Stage::Fertilizer => "fertilizer",
            Stage::Done => "done",
        }
    }

    pub fn next(&self) -> Option<Stage> {
        match self {
            Stage::Weather => Some(Stage::Crop),
            Stage::Crop => Some(Stage::Nutrients),
            Stage::Nutrients => Some(Stage::Fertilizer),
            Stage::Fertilizer => Some(Stage::Done),
            Stage::Done => None,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Stage {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "weather" => Ok(Stage::Weather),
            "crop" => Ok(Stage::Crop),
            "nutrients" | "nutrient" => Ok(Stage::Nutrients),
            "fertilizer" | "fertilizers" => Ok(Stage::Fertilizer),
            "done" => Ok(Stage::Done),
            other => Err(format!("unknown stage {other:?}")),
        }
    }
}
