use std::collections::VecDeque;

use chrono::{DateTime, Duration, Utc};

use crate::{
    session::{Notice, SessionState},
    timer::TimerSnapshot,
};

const MAX_NOTICES: usize = 3;
const NOTICE_TTL_SECS: i64 = 4;

/// Everything the live view draws, copied out of the watch channels once per
/// frame.
pub struct App {
    pub session: SessionState,
    pub timer: Option<TimerSnapshot>,
    pub notices: VecDeque<Notice>,
    pub auto_start: bool,
    /// `None` while the current set waits for a manual start.
    pub set_clock: Option<u64>,
    pub should_quit: bool,
}

impl App {
    pub fn new(auto_start: bool) -> Self {
        Self {
            session: SessionState::default(),
            timer: None,
            notices: VecDeque::new(),
            auto_start,
            set_clock: None,
            should_quit: false,
        }
    }

    pub fn push_notice(&mut self, notice: Notice) {
        self.notices.push_back(notice);
        while self.notices.len() > MAX_NOTICES {
            self.notices.pop_front();
        }
    }

    pub fn prune_notices(&mut self, now: DateTime<Utc>) {
        let ttl = Duration::seconds(NOTICE_TTL_SECS);
        self.notices.retain(|notice| now - notice.raised_at < ttl);
    }

    pub fn elapsed_secs(&self) -> u64 {
        self.timer
            .as_ref()
            .map(|timer| timer.state.elapsed_secs)
            .unwrap_or(0)
    }

    pub fn rest_remaining(&self) -> Option<u64> {
        self.timer
            .as_ref()
            .filter(|timer| timer.state.is_resting())
            .map(|timer| timer.rest_remaining_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::NoticeLevel;
    use chrono::TimeZone;
    use uuid::Uuid;

    fn notice(message: &str, raised_at: DateTime<Utc>) -> Notice {
        Notice {
            id: Uuid::new_v4(),
            level: NoticeLevel::Info,
            message: message.into(),
            raised_at,
        }
    }

    #[test]
    fn keeps_only_recent_notices() {
        let t0 = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
        let mut app = App::new(true);
        for i in 0..5 {
            app.push_notice(notice(&format!("n{i}"), t0 + Duration::seconds(i)));
        }
        assert_eq!(app.notices.len(), MAX_NOTICES);
        assert_eq!(app.notices.front().map(|n| n.message.as_str()), Some("n2"));

        app.prune_notices(t0 + Duration::seconds(7));
        let left: Vec<_> = app.notices.iter().map(|n| n.message.as_str()).collect();
        assert_eq!(left, vec!["n4"]);
    }
}
