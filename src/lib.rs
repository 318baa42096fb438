mod collect;
mod compare;
mod engine;
mod error;
mod registry;
mod runner;
mod types;

pub use collect::{ActivationStats, ExecutionStats, NoopStats, RuntimeStats, SequenceStats};
pub use compare::DiffEngine;
pub use engine::{EventSession, RuleCatalog, SessionListener};
pub use error::StatsError;
pub use registry::StatsRegistry;
pub use runner::{CompareRunner, ExecutionComparison, SessionSource, Workload, DEFAULT_MAX_FACTS};
pub use types::{
    ActivationId, CounterSnapshot, DiffNode, RuleId, StatsKind, StatsSnapshot, DIFF_HEADER,
    SAME_ARRAY, SAME_HEADER, SAME_MAP,
};
