pub mod pagination;
pub mod student;
