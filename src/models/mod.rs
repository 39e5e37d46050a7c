//! Data models for case execution
//!
//! This module contains the data structures shared by the registry, executor and reporter.

mod case;

pub use case::{
    join_path, normalize_name, CaseId, CaseRecord, ExecutionReport, FailureDetail, Outcome,
};
