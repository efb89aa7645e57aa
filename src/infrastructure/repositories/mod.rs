pub mod sqlx_task_state_repository;
