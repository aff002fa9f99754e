// Copyright (C) 2025 Joshua Kesler
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

use std::time::{Duration, Instant};

pub const ZERO_TIME: &str = "00:00:00";

/// Formats milliseconds as `HH:MM:SS`. Hours are not wrapped.
pub fn format_time(ms: u64) -> String {
    let sec = (ms / 1000) % 60;
    let min = (ms / (1000 * 60)) % 60;
    let hr = ms / (1000 * 60 * 60);
    format!("{:02}:{:02}:{:02}", hr, min, sec)
}

/// Wall-clock accumulator that excludes paused spans.
#[derive(Debug, Clone, Default)]
pub struct Stopwatch {
    accumulated: Duration,
    running_since: Option<Instant>
}

impl Stopwatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self) {
        self.start_at(Instant::now());
    }

    pub fn start_at(&mut self, now: Instant) {
        if self.running_since.is_none() {
            self.running_since = Some(now);
        }
    }

    pub fn pause(&mut self) {
        self.pause_at(Instant::now());
    }

    pub fn pause_at(&mut self, now: Instant) {
        if let Some(since) = self.running_since.take() {
            self.accumulated += now.saturating_duration_since(since);
        }
    }

    pub fn reset(&mut self) {
        self.accumulated = Duration::ZERO;
        self.running_since = None;
    }

    /// Drops the accumulated time and sets a new origin, keeping the running flag.
    pub fn set(&mut self, elapsed: Duration) {
        self.set_at(elapsed, Instant::now());
    }

    pub fn set_at(&mut self, elapsed: Duration, now: Instant) {
        self.accumulated = elapsed;
        if self.running_since.is_some() {
            self.running_since = Some(now);
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed_at(Instant::now())
    }

    pub fn elapsed_at(&self, now: Instant) -> Duration {
        match self.running_since {
            Some(since) => self.accumulated + now.saturating_duration_since(since),
            None => self.accumulated
        }
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed().as_millis() as u64
    }
}
