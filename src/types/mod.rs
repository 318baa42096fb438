mod counter;
mod diff;
mod kind;
mod rule;
mod snapshot;

pub(crate) use counter::CounterNode;
pub use diff::{DiffNode, DIFF_HEADER, SAME_ARRAY, SAME_HEADER, SAME_MAP};
pub use kind::StatsKind;
pub use rule::{ActivationId, RuleId};
pub use snapshot::{CounterSnapshot, StatsSnapshot};
