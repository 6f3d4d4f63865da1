pub mod room;
pub mod student;

pub use room::{Room, ROOMS_RESOURCE};
pub use student::{Student, STUDENTS_RESOURCE};
