pub mod task;
pub mod user;

pub use task::{dedup_assignees, NewTask, Task, TaskChanges, TaskStatus, TaskView};
pub use user::{NewUser, Role, User, UserChanges, UserSummary};
