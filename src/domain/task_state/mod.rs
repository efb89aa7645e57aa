pub mod entity;
pub mod errors;
pub mod grouping;
pub mod repository;
