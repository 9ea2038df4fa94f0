//! Shared handler state.

use salon_db::Database;

use crate::services::{SaleService, StatisticsService};

/// State handed to every handler through axum's `State` extractor.
///
/// `Database` wraps a pooled handle, so cloning per request is cheap.
#[derive(Debug, Clone)]
pub struct AppState {
    pub db: Database,
}

impl AppState {
    pub fn new(db: Database) -> Self {
        AppState { db }
    }

    pub fn sales(&self) -> SaleService<Database> {
        SaleService::new(self.db.clone())
    }

    pub fn statistics(&self) -> StatisticsService<Database> {
        StatisticsService::new(self.db.clone())
    }
}
