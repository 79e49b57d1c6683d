//! Date filter for the change list sidebar.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};

/// Choices offered for filtering by a timestamp column.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DateFilter {
    Any,
    Today,
    PastSevenDays,
    ThisMonth,
    ThisYear,
}

impl DateFilter {
    pub const ALL: [DateFilter; 5] = [
        DateFilter::Any,
        DateFilter::Today,
        DateFilter::PastSevenDays,
        DateFilter::ThisMonth,
        DateFilter::ThisYear,
    ];

    /// Parse the query string value. Unknown values mean no filter.
    pub fn from_param(param: Option<&str>) -> Self {
        match param.unwrap_or_default() {
            "today" => DateFilter::Today,
            "past_7_days" => DateFilter::PastSevenDays,
            "this_month" => DateFilter::ThisMonth,
            "this_year" => DateFilter::ThisYear,
            _ => DateFilter::Any,
        }
    }

    pub fn param(&self) -> &'static str {
        match self {
            DateFilter::Any => "",
            DateFilter::Today => "today",
            DateFilter::PastSevenDays => "past_7_days",
            DateFilter::ThisMonth => "this_month",
            DateFilter::ThisYear => "this_year",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DateFilter::Any => "Any date",
            DateFilter::Today => "Today",
            DateFilter::PastSevenDays => "Past 7 days",
            DateFilter::ThisMonth => "This month",
            DateFilter::ThisYear => "This year",
        }
    }

    /// Half-open `[start, end)` range selected by the filter, relative to `now`.
    pub fn bounds(&self, now: NaiveDateTime) -> Option<(NaiveDateTime, NaiveDateTime)> {
        let today = now.date();
        let tomorrow = midnight(today + Duration::days(1))?;

        match self {
            DateFilter::Any => None,
            DateFilter::Today => Some((midnight(today)?, tomorrow)),
            DateFilter::PastSevenDays => Some((midnight(today - Duration::days(7))?, tomorrow)),
            DateFilter::ThisMonth => {
                let first = NaiveDate::from_ymd_opt(today.year(), today.month(), 1)?;
                let next = if today.month() == 12 {
                    NaiveDate::from_ymd_opt(today.year() + 1, 1, 1)?
                } else {
                    NaiveDate::from_ymd_opt(today.year(), today.month() + 1, 1)?
                };
                Some((midnight(first)?, midnight(next)?))
            }
            DateFilter::ThisYear => {
                let first = NaiveDate::from_ymd_opt(today.year(), 1, 1)?;
                let next = NaiveDate::from_ymd_opt(today.year() + 1, 1, 1)?;
                Some((midnight(first)?, midnight(next)?))
            }
        }
    }
}

fn midnight(date: NaiveDate) -> Option<NaiveDateTime> {
    date.and_hms_opt(0, 0, 0)
}
