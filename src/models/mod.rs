mod collection;
mod nurse;
mod role;
mod schedule;
mod user;

pub use collection::{ChangeKind, Collection, FeedMessage};
pub use nurse::Nurse;
pub use role::Role;
pub use schedule::{
    days_in_month, normalize_month, DayRecord, Note, ScheduleKey, ScheduleRow, ShiftStatus,
};
pub use user::{NewUser, User, ADMIN_ID, ADMIN_USERNAME, DEFAULT_ADMIN_SECRET};
