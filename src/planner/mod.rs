pub mod builder;
pub mod plan;
pub mod selection;
pub mod simulate;

pub use builder::{build_plan, validate_root, BuildOutcome};
pub use plan::{Change, ChangeCounts, ChangeKind, ChangeType, Plan, WireError};
pub use selection::Selection;
pub use simulate::{simulate, Simulation};
