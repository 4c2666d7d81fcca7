pub mod accounting_api;
pub mod report_provider;
