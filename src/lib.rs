//! Daily task-state snapshots.
//!
//! Counts rows of `t_task` per status (optionally per `sys_name` / `employee`) and stores the
//! result in `t_task_state_count` under the current date, replacing anything already stored
//! for that date in a single transaction.

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod presentation;
