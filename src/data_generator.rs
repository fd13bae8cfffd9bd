//! Seeded synthetic shows and lookup ranges.

use std::fmt;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use time::macros::datetime;
use time::{Duration, PrimitiveDateTime};

use crate::error::{BenchError, Result};
use crate::model::{Language, Roster, Show, Timestamp};

/// Half-open interval `[start, end)` that show start times are drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    start: PrimitiveDateTime,
    end: PrimitiveDateTime,
}

impl TimeWindow {
    /// Creates a window, rejecting empty or inverted ranges.
    pub fn new(start: PrimitiveDateTime, end: PrimitiveDateTime) -> Result<Self> {
        if (end - start).whole_seconds() < 1 {
            return Err(BenchError::InvalidArgument(format!(
                "time window {start} .. {end} is empty"
            )));
        }
        Ok(Self { start, end })
    }

    /// First instant of the window.
    pub fn start(&self) -> PrimitiveDateTime {
        self.start
    }

    /// Exclusive end of the window.
    pub fn end(&self) -> PrimitiveDateTime {
        self.end
    }

    fn span_seconds(&self) -> i64 {
        (self.end - self.start).whole_seconds()
    }
}

impl Default for TimeWindow {
    /// The 2023 screening calendar.
    fn default() -> Self {
        Self {
            start: datetime!(2023-01-01 0:00),
            end: datetime!(2023-12-31 0:00),
        }
    }
}

/// A (hall, time range) lookup issued against the shows table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupProbe {
    /// Hall to filter on.
    pub hall_id: String,
    /// Inclusive lower bound of `start_time`.
    pub from: Timestamp,
    /// Inclusive upper bound of `start_time`.
    pub to: Timestamp,
}

impl fmt::Display for LookupProbe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{} .. {}]", self.hall_id, self.from, self.to)
    }
}

/// Seeded generator for synthetic shows and lookup probes.
pub struct ShowGenerator<'a> {
    roster: &'a Roster,
    window: TimeWindow,
    rng: ChaCha8Rng,
}

impl<'a> ShowGenerator<'a> {
    /// Fails when the roster has nothing for a show to reference.
    pub fn new(roster: &'a Roster, window: TimeWindow, seed: u64) -> Result<Self> {
        if roster.movies.is_empty() {
            return Err(BenchError::EmptyRoster("movies"));
        }
        if roster.halls.is_empty() {
            return Err(BenchError::EmptyRoster("halls"));
        }
        Ok(Self {
            roster,
            window,
            rng: ChaCha8Rng::seed_from_u64(seed),
        })
    }

    /// Uniformly random whole second inside the window.
    pub fn random_timestamp(&mut self) -> Timestamp {
        let offset = self.rng.gen_range(0..self.window.span_seconds());
        Timestamp(self.window.start + Duration::seconds(offset))
    }

    fn random_hall(&mut self) -> &'a str {
        let roster = self.roster;
        let idx = self.rng.gen_range(0..roster.halls.len());
        &roster.halls[idx].id
    }

    fn random_movie(&mut self) -> &'a str {
        let roster = self.roster;
        let idx = self.rng.gen_range(0..roster.movies.len());
        &roster.movies[idx].id
    }

    /// Generates the show with id `show_<index>`.
    pub fn show(&mut self, index: usize) -> Show {
        let movie_id = self.random_movie().to_string();
        let hall_id = self.random_hall().to_string();
        let start_time = self.random_timestamp();
        let language = Language::ALL[self.rng.gen_range(0..Language::ALL.len())];
        Show {
            id: format!("show_{index}"),
            movie_id,
            hall_id,
            start_time,
            language,
        }
    }

    /// Splits `size` shows into batches of at most `batch_size` rows.
    pub fn batches(&mut self, size: usize, batch_size: usize) -> ShowBatches<'_, 'a> {
        ShowBatches {
            generator: self,
            next: 0,
            size,
            batch_size: batch_size.max(1),
        }
    }

    /// Random hall plus a window of `half_width` either side of a random instant.
    pub fn probe(&mut self, half_width: Duration) -> LookupProbe {
        let hall_id = self.random_hall().to_string();
        let center = self.random_timestamp();
        LookupProbe {
            hall_id,
            from: center.offset(-half_width),
            to: center.offset(half_width),
        }
    }
}

/// Iterator returned by [`ShowGenerator::batches`].
pub struct ShowBatches<'g, 'a> {
    generator: &'g mut ShowGenerator<'a>,
    next: usize,
    size: usize,
    batch_size: usize,
}

impl Iterator for ShowBatches<'_, '_> {
    type Item = Vec<Show>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.size {
            return None;
        }
        let end = (self.next + self.batch_size).min(self.size);
        let batch = (self.next..end).map(|i| self.generator.show(i)).collect();
        self.next = end;
        Some(batch)
    }
}
