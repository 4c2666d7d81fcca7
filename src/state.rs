use std::sync::Arc;

use crate::services::unified_report_service::UnifiedReportService;

#[derive(Clone)]
pub struct AppState {
    pub reports: Arc<UnifiedReportService>,
}
