pub mod engine;

pub use engine::{apply, ApplyOptions, ApplyReport, ChangeResult, Outcome};
