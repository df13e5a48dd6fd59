use crate::screener::models::{Horizon, OptionType, QueryCriteria, Side};
use serde::{Deserialize, Serialize};

/// Partially answered query, filled one question at a time
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CriteriaBuilder {
    pub option_type: Option<OptionType>,
    pub side: Option<Side>,
    pub otm_only: Option<bool>,
    pub target_premium: Option<f64>,
    pub horizon: Option<Horizon>,
    pub contracts: Option<u32>,
}

impl CriteriaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_complete(&self) -> bool {
        self.build().is_some()
    }

    /// The finished query, or `None` while any answer is missing
    pub fn build(&self) -> Option<QueryCriteria> {
        Some(QueryCriteria {
            option_type: self.option_type?,
            side: self.side?,
            otm_only: self.otm_only?,
            target_premium: self.target_premium?,
            horizon: self.horizon?,
            contracts: self.contracts?,
        })
    }
}
