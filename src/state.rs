use crate::{config::Config, services::payroll::PayrollEngine};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub engine: PayrollEngine,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(engine: PayrollEngine, config: Config) -> Self {
        Self {
            engine,
            config: Arc::new(config),
        }
    }
}
