//! Feature categories for logging
//!
//! Every pipeline stage logs under its own target so a run can be filtered down to
//! one stage (`MOVIEGRAPH_LOG_FEATURE_WRITER=debug`).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Pipeline stage a log line or diagnostic belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFeature {
    Archive,
    Cleaner,
    Validator,
    Partitioner,
    Writer,
    Store,
    Pipeline,
}

impl LogFeature {
    /// Get the target string for this feature
    pub fn target(&self) -> &'static str {
        match self {
            LogFeature::Archive => "moviegraph::archive",
            LogFeature::Cleaner => "moviegraph::cleaner",
            LogFeature::Validator => "moviegraph::validator",
            LogFeature::Partitioner => "moviegraph::partitioner",
            LogFeature::Writer => "moviegraph::writer",
            LogFeature::Store => "moviegraph::store",
            LogFeature::Pipeline => "moviegraph::pipeline",
        }
    }

    /// Short name used in configuration keys
    pub fn name(&self) -> &'static str {
        self.target().trim_start_matches("moviegraph::")
    }
}

impl fmt::Display for LogFeature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feature_names_match_targets() {
        assert_eq!(LogFeature::Writer.target(), "moviegraph::writer");
        assert_eq!(LogFeature::Writer.name(), "writer");
        assert_eq!(LogFeature::Partitioner.to_string(), "partitioner");
    }
}
