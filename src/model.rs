//! Row types for the cinema schedule schema and their SQLite encodings.

use std::fmt;
use std::str::FromStr;

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use thiserror::Error;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{Duration, PrimitiveDateTime};

/// Number of movies in the standard roster.
pub const DEFAULT_MOVIES: usize = 100;
/// Number of halls in the standard roster.
pub const DEFAULT_HALLS: usize = 10;

const TIMESTAMP_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]");

/// Show start time, stored as fixed-width ISO-8601 text so that lexical and
/// chronological order agree inside SQLite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(pub PrimitiveDateTime);

impl Timestamp {
    /// Shifts the timestamp by `delta`.
    pub fn offset(self, delta: Duration) -> Self {
        Timestamp(self.0 + delta)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = self.0.format(TIMESTAMP_FORMAT).map_err(|_| fmt::Error)?;
        f.write_str(&text)
    }
}

impl FromStr for Timestamp {
    type Err = time::error::Parse;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PrimitiveDateTime::parse(s, TIMESTAMP_FORMAT).map(Timestamp)
    }
}

impl ToSql for Timestamp {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.to_string()))
    }
}

impl FromSql for Timestamp {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|err| FromSqlError::Other(Box::new(err)))
    }
}

/// Screening language of a show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    /// English.
    English,
    /// Spanish.
    Spanish,
    /// French.
    French,
    /// German.
    German,
    /// Italian.
    Italian,
    /// Russian.
    Russian,
}

impl Language {
    /// Every language a generated show may use.
    pub const ALL: [Language; 6] = [
        Language::English,
        Language::Spanish,
        Language::French,
        Language::German,
        Language::Italian,
        Language::Russian,
    ];

    /// Stored column value.
    pub fn as_str(self) -> &'static str {
        match self {
            Language::English => "English",
            Language::Spanish => "Spanish",
            Language::French => "French",
            Language::German => "German",
            Language::Italian => "Italian",
            Language::Russian => "Русский",
        }
    }
}

/// Returned when a stored language value is not one of [`Language::ALL`].
#[derive(Debug, Error)]
#[error("unknown language '{0}'")]
pub struct UnknownLanguage(pub String);

impl FromStr for Language {
    type Err = UnknownLanguage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Language::ALL
            .into_iter()
            .find(|lang| lang.as_str() == s)
            .ok_or_else(|| UnknownLanguage(s.to_string()))
    }
}

impl ToSql for Language {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Language {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|err| FromSqlError::Other(Box::new(err)))
    }
}

/// A film in the roster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Movie {
    /// Unique id, `movie_<n>`.
    pub id: String,
    /// Display title.
    pub title: String,
    /// Running time.
    pub duration: Duration,
}

impl Movie {
    /// Running time encoded as `HH:MM:SS`.
    pub fn duration_text(&self) -> String {
        let total = self.duration.whole_seconds();
        format!(
            "{:02}:{:02}:{:02}",
            total / 3600,
            (total % 3600) / 60,
            total % 60
        )
    }
}

/// A screening hall.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hall {
    /// Unique id, `hall_<n>`.
    pub id: String,
    /// Display name.
    pub name: String,
}

/// One scheduled screening; the table under test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Show {
    /// Unique id, `show_<n>`.
    pub id: String,
    /// Referenced movie id.
    pub movie_id: String,
    /// Referenced hall id.
    pub hall_id: String,
    /// Scheduled start.
    pub start_time: Timestamp,
    /// Screening language.
    pub language: Language,
}

/// Fixed set of movies and halls that every experiment inserts before its shows.
#[derive(Debug, Clone)]
pub struct Roster {
    /// Movies, referenced by generated shows.
    pub movies: Vec<Movie>,
    /// Halls, referenced by generated shows.
    pub halls: Vec<Hall>,
}

impl Roster {
    /// Builds `movies` movies of two and a half hours each and `halls` halls.
    pub fn new(movies: usize, halls: usize) -> Self {
        let movies = (0..movies)
            .map(|i| Movie {
                id: format!("movie_{i}"),
                title: format!("Movie {i}"),
                duration: Duration::minutes(150),
            })
            .collect();
        let halls = (0..halls)
            .map(|i| Hall {
                id: format!("hall_{i}"),
                name: format!("Hall {i}"),
            })
            .collect();
        Self { movies, halls }
    }
}

impl Default for Roster {
    fn default() -> Self {
        Self::new(DEFAULT_MOVIES, DEFAULT_HALLS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn timestamp_text_is_fixed_width_and_parses_back() {
        let ts = Timestamp(datetime!(2023-03-07 04:05:06));
        let text = ts.to_string();
        assert_eq!(text, "2023-03-07T04:05:06");
        assert_eq!(text.parse::<Timestamp>().unwrap(), ts);
    }

    #[test]
    fn timestamp_text_orders_chronologically() {
        let early = Timestamp(datetime!(2023-02-09 23:00:00));
        let late = Timestamp(datetime!(2023-10-01 01:00:00));
        assert!(early.to_string() < late.to_string());
    }

    #[test]
    fn timestamp_text_pads_every_field() {
        let ts = Timestamp(datetime!(987-01-02 0:00:09));
        assert_eq!(ts.to_string(), "0987-01-02T00:00:09");
        assert_eq!(ts.to_string().parse::<Timestamp>().unwrap(), ts);
    }

    #[test]
    fn language_names_parse() {
        for lang in Language::ALL {
            assert_eq!(lang.as_str().parse::<Language>().unwrap(), lang);
        }
        assert!("Klingon".parse::<Language>().is_err());
    }

    #[test]
    fn standard_roster() {
        let roster = Roster::default();
        assert_eq!(roster.movies.len(), 100);
        assert_eq!(roster.halls.len(), 10);
        assert_eq!(roster.movies[7].id, "movie_7");
        assert_eq!(roster.movies[7].duration_text(), "02:30:00");
        assert_eq!(roster.halls[3].name, "Hall 3");
    }
}
