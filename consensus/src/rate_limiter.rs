// Copyright (C) 2024-2026 The Nilotic Network Developers.
// This file is part of the nilotic library.

// The nilotic library is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// The nilotic library is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU General Public License for more details.

// You should have received a copy of the GNU General Public License
// along with the nilotic library. If not, see <https://www.gnu.org/licenses/>.

use crate::{MAX_REQUESTS_PER_MINUTE, RATE_LIMIT_WINDOW_SECS};

use std::collections::{HashMap, VecDeque};

/// A per-sender sliding-window submission limiter.
///
/// Each sender may submit up to `max_per_window` transactions within any
/// `window_secs` span; excess submissions are rejected without queuing.
#[derive(Debug)]
pub struct RateLimiter {
    window_secs: i64,
    max_per_window: usize,
    submissions: HashMap<String, VecDeque<i64>>,
}

impl RateLimiter {
    pub fn new(window_secs: i64, max_per_window: usize) -> Self {
        Self {
            window_secs,
            max_per_window,
            submissions: HashMap::new(),
        }
    }

    /// Records a submission at `now` and returns whether it is permitted.
    pub fn check(&mut self, sender: &str, now: i64) -> bool {
        let log = self.submissions.entry(sender.to_owned()).or_default();
        let cutoff = now - self.window_secs;
        while log.front().map_or(false, |&ts| ts <= cutoff) {
            log.pop_front();
        }
        if log.len() >= self.max_per_window {
            return false;
        }
        log.push_back(now);
        true
    }

    /// Drops senders whose entire window has expired.
    pub fn prune(&mut self, now: i64) {
        let cutoff = now - self.window_secs;
        self.submissions
            .retain(|_, log| log.back().map_or(false, |&ts| ts > cutoff));
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(RATE_LIMIT_WINDOW_SECS, MAX_REQUESTS_PER_MINUTE)
    }
}
