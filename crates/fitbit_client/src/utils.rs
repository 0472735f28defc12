//! Date helpers and the typed path parameters of the heart-rate endpoint.

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use std::fmt;
use std::str::FromStr;

use crate::FitbitError;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Calendar date of `now` in the given fixed offset, as `YYYY-MM-DD`.
pub fn local_date(now: DateTime<Utc>, offset: FixedOffset) -> String {
    now.with_timezone(&offset).format(DATE_FORMAT).to_string()
}

/// Build a fixed offset from whole hours east of UTC.
pub fn offset_from_hours(hours: i32) -> Result<FixedOffset, FitbitError> {
    hours
        .checked_mul(3600)
        .and_then(FixedOffset::east_opt)
        .ok_or_else(|| FitbitError::Config(format!("utc offset out of range: {hours}h")))
}

/// The `{date}` segment of the heart-rate endpoint.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DateParam {
    #[default]
    Today,
    Day(NaiveDate),
}

impl fmt::Display for DateParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DateParam::Today => f.write_str("today"),
            DateParam::Day(date) => write!(f, "{}", date.format(DATE_FORMAT)),
        }
    }
}

impl FromStr for DateParam {
    type Err = FitbitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("today") {
            return Ok(DateParam::Today);
        }
        NaiveDate::parse_from_str(s, DATE_FORMAT)
            .map(DateParam::Day)
            .map_err(|_| FitbitError::Config(format!("expected `today` or YYYY-MM-DD, got {s:?}")))
    }
}

/// The `{period}` segment of the heart-rate endpoint.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Period {
    #[default]
    OneDay,
    SevenDays,
    ThirtyDays,
    OneWeek,
    OneMonth,
}

impl Period {
    pub fn as_str(&self) -> &'static str {
        match self {
            Period::OneDay => "1d",
            Period::SevenDays => "7d",
            Period::ThirtyDays => "30d",
            Period::OneWeek => "1w",
            Period::OneMonth => "1m",
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Period {
    type Err = FitbitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1d" => Ok(Period::OneDay),
            "7d" => Ok(Period::SevenDays),
            "30d" => Ok(Period::ThirtyDays),
            "1w" => Ok(Period::OneWeek),
            "1m" => Ok(Period::OneMonth),
            other => Err(FitbitError::Config(format!(
                "unsupported period {other:?} (expected 1d, 7d, 30d, 1w or 1m)"
            ))),
        }
    }
}
