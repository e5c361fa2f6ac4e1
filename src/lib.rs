pub mod artifacts;
pub mod classify;
pub mod decoder;
pub mod node;
pub mod registry;
pub mod report;
pub(crate) mod rpc;
#[cfg(test)]
pub(crate) mod test_utils;
pub mod utils;
pub mod walker;

pub use report::{generate_report, ReportConfig, ScanSummary};
