//! # Housekeeper
//!
//! Plan-first cleanup of a directory tree.
//!
//! Housekeeper walks a directory once and builds an ordered, reviewable
//! plan of changes:
//!
//! - **Delete** files whose extension (or name prefix) is on a deny list
//! - **Rename** files whose extension has a configured replacement
//! - **Remove** directories that the plan leaves empty, children first
//!
//! The plan is inert until handed to [`cleaner::apply`], which re-checks
//! each change against the live filesystem and reports a per-change
//! outcome. [`planner::simulate`] runs the same plan builder and only
//! summarizes it.

pub mod cleaner;
pub mod cli;
pub mod common;
pub mod planner;
pub mod rules;
pub mod scanner;
