//! Client-side workout session: the reconciled view of workouts and sets,
//! plus the notices raised while mutating them.

mod notify;
mod state;
pub mod store;

pub use notify::{Notice, NoticeLevel, Notifier};
pub use state::{SessionState, SetStatus};
pub use store::{BatchOutcome, SessionStore};
