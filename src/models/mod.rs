pub mod course;
pub mod enrollment;
pub mod structure;
pub mod user;
