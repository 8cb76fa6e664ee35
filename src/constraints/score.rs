use serde::{Deserialize, Serialize};

use crate::{error::Result, partition::Partition};

/// A whole-plan score that bound constraints compare against.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Score {
    /// Sum over parts of `1 / polsby_popper`; infinite if any part scores zero.
    L1ReciprocalPolsbyPopper,
    /// Number of cut edges.
    CutEdgeCount,
}

impl Score {
    pub fn name(&self) -> &'static str {
        match self {
            Score::L1ReciprocalPolsbyPopper => "l1_reciprocal_polsby_popper",
            Score::CutEdgeCount => "cut_edge_count",
        }
    }

    /// Get the updater this score reads.
    pub fn requires(&self) -> &'static str {
        match self {
            Score::L1ReciprocalPolsbyPopper => "polsby_popper",
            Score::CutEdgeCount => "cut_edges",
        }
    }

    /// Evaluate the score on a partition.
    pub fn evaluate(&self, partition: &Partition) -> Result<f64> {
        match self {
            Score::L1ReciprocalPolsbyPopper => Ok(partition.per_part("polsby_popper")?.iter()
                .map(|&score| if score == 0.0 { f64::INFINITY } else { score.recip() })
                .sum()),
            Score::CutEdgeCount => Ok(partition.cut_edges()?.len() as f64),
        }
    }
}
