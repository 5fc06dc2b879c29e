pub mod dates;
pub mod report;
pub mod risk;
pub mod task;

pub use report::{AlertRecord, DigestReport, PassFailure, PassOutcome, RiskReport};
pub use risk::{assess, classify, RiskLabel, RiskWindow};
pub use task::Task;
