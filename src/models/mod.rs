mod report;

pub use report::{
    CacheStats, DataFreshness, FindingStatus, Impact, PerformanceMetrics, ReportFormat,
    ReportMetadata, ReportOptions, ReportResult, ReportSource, ReportType, StrategyDecision,
    StrategyFactors, ValidationFinding, ValidationLevel,
};
