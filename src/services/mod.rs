pub mod report_cache;
pub mod report_validation;
pub mod strategy;
pub mod unified_report_service;
