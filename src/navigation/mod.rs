//! Date navigation between journal days.
//!
//! There are two addressable views: the canonical today route and an
//! explicit-date route. Navigation never reaches past today.

pub mod clock;
pub mod date;

use std::fmt;

pub use clock::{Clock, ClockMode};
pub use date::{EntryDate, InvalidDate};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Today,
    Entry(EntryDate),
}

impl Route {
    pub fn resolve(&self, today: EntryDate) -> EntryDate {
        match self {
            Route::Today => today,
            Route::Entry(date) => *date,
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::Today => write!(f, "/"),
            Route::Entry(date) => write!(f, "/entry/{date}"),
        }
    }
}

pub fn previous_day(date: EntryDate) -> Route {
    Route::Entry(date.previous().unwrap_or(date))
}

/// Returns `None` when the next day would be in the future.
pub fn next_day(date: EntryDate, today: EntryDate) -> Option<Route> {
    let next = date.next()?;

    if next > today {
        return None;
    }

    if next == today {
        Some(Route::Today)
    } else {
        Some(Route::Entry(next))
    }
}

pub fn go_to_today() -> Route {
    Route::Today
}

pub fn can_go_next(date: EntryDate, today: EntryDate) -> bool {
    date < today
}

/// Header title for a day: "Today", or the weekday name.
pub fn heading(date: EntryDate, today: EntryDate) -> String {
    if date == today {
        "Today".to_string()
    } else {
        date.as_naive().format("%A").to_string()
    }
}

pub fn long_date(date: EntryDate) -> String {
    date.as_naive().format("%B %-d, %Y").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(raw: &str) -> EntryDate {
        EntryDate::parse(raw).unwrap()
    }

    #[test]
    fn previous_day_is_always_allowed() {
        assert_eq!(previous_day(d("2024-03-15")), Route::Entry(d("2024-03-14")));
        assert_eq!(previous_day(d("2024-01-01")), Route::Entry(d("2023-12-31")));
    }

    #[test]
    fn next_day_into_past_uses_explicit_route() {
        let today = d("2024-03-20");
        assert_eq!(
            next_day(d("2024-03-14"), today),
            Some(Route::Entry(d("2024-03-15")))
        );
    }

    #[test]
    fn next_day_onto_today_uses_canonical_route() {
        let today = d("2024-03-15");
        assert_eq!(next_day(d("2024-03-14"), today), Some(Route::Today));
    }

    #[test]
    fn next_day_from_today_is_blocked() {
        let today = d("2024-03-15");
        assert_eq!(next_day(today, today), None);
        assert!(!can_go_next(today, today));
        assert!(can_go_next(d("2024-03-14"), today));
    }

    #[test]
    fn routes_render_like_paths() {
        assert_eq!(go_to_today().to_string(), "/");
        assert_eq!(Route::Entry(d("2024-03-15")).to_string(), "/entry/2024-03-15");
        assert_eq!(Route::Today.resolve(d("2024-03-15")), d("2024-03-15"));
    }

    #[test]
    fn header_text() {
        let today = d("2024-03-15");
        assert_eq!(heading(today, today), "Today");
        assert_eq!(heading(d("2024-03-14"), today), "Thursday");
        assert_eq!(long_date(d("2024-03-05")), "March 5, 2024");
    }
}
