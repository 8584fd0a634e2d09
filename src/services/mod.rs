pub mod catalog;
pub mod enrollment_store;
pub mod session_store;

pub use catalog::CourseCatalog;
pub use enrollment_store::{EnrollmentState, EnrollmentStore};
pub use session_store::SessionStore;
