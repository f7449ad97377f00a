mod auth;
mod timers;

pub(crate) mod keys {
    pub const AUTH_TOKENS: &str = "auth.tokens";
    pub const AUTH_USER: &str = "auth.user";
    pub const REST_TIMER: &str = "timer.rest";
    pub const WORKOUT_ANCHOR_PREFIX: &str = "timer.anchor.";
    pub const MANUAL_SETS: &str = "timer.manual_sets";
}
