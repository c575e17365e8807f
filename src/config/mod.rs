//! Configuration for the weighted aggregation pass.

/// Configuration for the `WeightedAggregator`
#[derive(Debug, Clone)]
pub struct AggregationConfig {
    /// Cells with fewer valid (non-missing) respondents than this are
    /// emitted but tagged unreliable; suppression is left to the consumer
    pub reliability_floor: usize,
    /// Minimum record count before the aggregation pass fans out across
    /// threads; below this a sequential pass is cheaper
    pub parallel_threshold: usize,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            reliability_floor: 30,
            parallel_threshold: 10_000,
        }
    }
}
