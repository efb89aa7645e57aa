pub mod shared;
pub mod task_state;
