pub mod course;
pub mod file;
pub mod id;
pub mod user;

pub use course::{Course, NewCourseForm};
pub use file::LocalFile;
pub use user::{User, UserPatch};
