// src/engine/mod.rs

pub mod eligibility;
pub mod events;
pub mod grading;
pub mod lifecycle;
pub mod result;
pub mod selector;
pub mod time_budget;
