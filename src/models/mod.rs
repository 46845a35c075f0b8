pub mod task;
pub mod user;

pub use task::{PageParams, Task, TaskInput};
pub use user::{NewUser, User};
