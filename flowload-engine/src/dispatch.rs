//! Weighted random dispatch
//!
//! Each iteration draws one exerciser area from a fixed table, with
//! selection probability proportional to its integer weight. The draw is
//! an integer in `[0, total)` walked against cumulative weights; the first
//! bucket containing the draw wins, so ties break deterministically and no
//! floating-point edge cases exist.

use flowload_config::WeightsConfig;
use std::fmt;
use thiserror::Error;

/// Functional areas of the target API, one exerciser each
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Area {
    Sources,
    Pipelines,
    Executions,
    Tasks,
}

impl Area {
    pub fn as_str(&self) -> &'static str {
        match self {
            Area::Sources => "sources",
            Area::Pipelines => "pipelines",
            Area::Executions => "executions",
            Area::Tasks => "tasks",
        }
    }
}

impl fmt::Display for Area {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A table entry: pick `item` with probability `weight / total`
#[derive(Debug, Clone, Copy)]
pub struct WeightedChoice<T> {
    pub weight: u32,
    pub item: T,
}

/// Zero total weight is a configuration error, not a runtime fallback
#[derive(Debug, Error)]
#[error("weighted dispatch table has zero total weight")]
pub struct ZeroWeightError;

/// Immutable weighted selection table
#[derive(Debug, Clone)]
pub struct WeightedTable<T> {
    choices: Vec<WeightedChoice<T>>,
    total: u32,
}

impl<T: Copy> WeightedTable<T> {
    /// Build a table; fails fast when the weights sum to zero
    pub fn new(choices: Vec<WeightedChoice<T>>) -> Result<Self, ZeroWeightError> {
        let total: u32 = choices.iter().map(|c| c.weight).sum();
        if total == 0 {
            return Err(ZeroWeightError);
        }
        Ok(Self { choices, total })
    }

    /// Draw one item
    pub fn pick(&self) -> T {
        let draw = fastrand::u32(0..self.total);
        let mut cumulative = 0u32;
        for choice in &self.choices {
            cumulative += choice.weight;
            if draw < cumulative {
                return choice.item;
            }
        }
        unreachable!("draw below total weight always lands in a bucket")
    }

    /// Sum of all weights
    pub fn total_weight(&self) -> u32 {
        self.total
    }
}

/// The exerciser table used by every virtual user
pub fn exerciser_table(weights: &WeightsConfig) -> Result<WeightedTable<Area>, ZeroWeightError> {
    WeightedTable::new(vec![
        WeightedChoice {
            weight: weights.sources,
            item: Area::Sources,
        },
        WeightedChoice {
            weight: weights.pipelines,
            item: Area::Pipelines,
        },
        WeightedChoice {
            weight: weights.executions,
            item: Area::Executions,
        },
        WeightedChoice {
            weight: weights.tasks,
            item: Area::Tasks,
        },
    ])
}
