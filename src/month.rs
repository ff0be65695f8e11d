use anyhow::{Result, anyhow};
use chrono::{Datelike, NaiveDate};
use std::fmt;
use std::str::FromStr;

/// A calendar month. Ordering is chronological (derived field order matters).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Result<Self> {
        if !(1..=12).contains(&month) {
            return Err(anyhow!("Invalid month value: {month}"));
        }
        Ok(Self { year, month })
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn next(self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    pub fn prev(self) -> Self {
        if self.month == 1 {
            Self {
                year: self.year - 1,
                month: 12,
            }
        } else {
            Self {
                year: self.year,
                month: self.month - 1,
            }
        }
    }

    /// First calendar day of the month.
    pub fn first_day(self) -> NaiveDate {
        // Month is validated at construction (1..=12), so day 1 always exists.
        NaiveDate::from_ymd_opt(self.year, self.month, 1).expect("valid year-month")
    }

    /// Last calendar day of the month.
    pub fn last_day(self) -> NaiveDate {
        self.next().first_day().pred_opt().expect("valid year-month")
    }

    pub fn contains(self, date: NaiveDate) -> bool {
        Self::from_date(date) == self
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for YearMonth {
    type Err = anyhow::Error;

    fn from_str(raw: &str) -> Result<Self> {
        let (y, m) = raw
            .split_once('-')
            .ok_or_else(|| anyhow!("Invalid month '{raw}'. Expected YYYY-MM"))?;
        let year: i32 = y
            .parse()
            .map_err(|_| anyhow!("Invalid year in month '{raw}'"))?;
        let month: u32 = m
            .parse()
            .map_err(|_| anyhow!("Invalid month in '{raw}'"))?;
        Self::new(year, month)
    }
}
