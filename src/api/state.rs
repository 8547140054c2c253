use std::sync::Arc;

use crate::data::{PoolYieldSource, RiskFreeRateSource};
use crate::domain::SpreadConfig;
use crate::window::Clock;

/// Collaborators shared by every request.
#[derive(Clone)]
pub struct ApiState {
    pub pools: Arc<dyn PoolYieldSource>,
    pub rates: Arc<dyn RiskFreeRateSource>,
    pub clock: Arc<dyn Clock>,
    pub config: Arc<SpreadConfig>,
}

impl ApiState {
    pub fn new(
        pools: Arc<dyn PoolYieldSource>,
        rates: Arc<dyn RiskFreeRateSource>,
        clock: Arc<dyn Clock>,
        config: SpreadConfig,
    ) -> Self {
        Self {
            pools,
            rates,
            clock,
            config: Arc::new(config),
        }
    }
}
