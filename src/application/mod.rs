pub mod count_task_state;
pub mod task_history;
