use crate::error::LoaderError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A caller-requested pipeline step
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    /// Fetch the dataset archive into the output directory
    Download,
    /// Unpack the archive in place, then remove it
    Extract,
    /// Validate the source file and write one artifact per release decade
    #[value(alias = "chunk")]
    #[serde(alias = "chunk")]
    Partition,
    /// Declare constraints, then write every decade artifact to the graph store
    Load,
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Download => "download",
            Operation::Extract => "extract",
            Operation::Partition => "partition",
            Operation::Load => "load",
        }
    }

    /// The full pipeline, in natural order
    pub fn all() -> [Operation; 4] {
        [
            Operation::Download,
            Operation::Extract,
            Operation::Partition,
            Operation::Load,
        ]
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Operation {
    type Err = LoaderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "download" => Ok(Operation::Download),
            "extract" => Ok(Operation::Extract),
            "partition" | "chunk" => Ok(Operation::Partition),
            "load" => Ok(Operation::Load),
            other => Err(LoaderError::configuration(format!(
                "Invalid operation '{}' (expected download, extract, partition/chunk or load)",
                other
            ))),
        }
    }
}
