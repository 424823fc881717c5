pub mod task;
pub mod user;

pub use task::{
    SortDirection, Task, TaskInput, TaskListOptions, TaskQuery, TaskSort, TaskSortField,
    TaskUpdate,
};
pub use user::{
    normalize_email, AvatarSet, LoginRequest, NewUser, ProfileUpdate, Session, SignUpRequest,
    User, UserChanges,
};
