mod clock;
pub mod controller;
pub mod state;

pub use clock::{Clock, ManualClock, SystemClock};
pub use controller::{TimerController, TimerSnapshot};
pub use state::{compute_remaining, RestSnapshot, RestTimer, SessionPhase, TimerState};
