pub mod admin;
pub mod course;
pub mod event;
pub mod student;
