pub mod aggregator;
pub mod refresher;

pub use aggregator::{
    AggregationOutcome, AggregationReport, Aggregator, AggregatorConfig, ItemFailure, SourceFailure,
};
pub use refresher::{RefreshOutcome, Refresher, RefresherStatus, Snapshot};
