use std::fmt;

use chrono::{Duration, NaiveDate};

use serde::{Serialize, Serializer};

use super::error::{Error, Result};
use super::source::{Source, DATE};
use super::table::{parse_date, Table};


static WEEK_DAYS: i64 = 7;


/// A closed range of at most seven days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WeekInterval {
	pub start: NaiveDate,
	pub end: NaiveDate,
}

impl WeekInterval {
	pub fn contains(&self, date: NaiveDate) -> bool {
		self.start <= date && date <= self.end
	}

	pub fn days(&self) -> i64 {
		(self.end - self.start).num_days() + 1
	}
}

impl fmt::Display for WeekInterval {
	fn fmt<'f>(&self, f: &'f mut fmt::Formatter) -> fmt::Result {
		write!(f, "{}/{}", self.start.format("%Y-%m-%d"), self.end.format("%Y-%m-%d"))
	}
}

impl Serialize for WeekInterval {
	fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
		serializer.collect_str(self)
	}
}


/// Consecutive seven-day weeks starting at `first`, with the last one cut off
/// at `last`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeekCalendar {
	first: NaiveDate,
	last: NaiveDate,
}

impl WeekCalendar {
	pub fn new(first: NaiveDate, last: NaiveDate) -> Self {
		assert!(first <= last);
		Self{first, last}
	}

	/// The calendar spanning every date of the epidemiology source.
	pub fn from_epidemiology(epidemiology: &Table) -> Result<Self> {
		let mut span: Option<(NaiveDate, NaiveDate)> = None;
		for cell in epidemiology.column_cells(DATE) {
			let date = match cell {
				Some(v) => parse_date(DATE, v)?,
				None => continue,
			};
			span = Some(match span {
				Some((lo, hi)) => (lo.min(date), hi.max(date)),
				None => (date, date),
			});
		}
		match span {
			Some((first, last)) => Ok(Self::new(first, last)),
			None => Err(Error::EmptySource(Source::Epidemiology)),
		}
	}

	#[inline(always)]
	pub fn first(&self) -> NaiveDate {
		self.first
	}

	#[inline(always)]
	pub fn last(&self) -> NaiveDate {
		self.last
	}

	pub fn len(&self) -> usize {
		self.index(self.last).map(|i| i + 1).unwrap_or(0)
	}

	#[inline(always)]
	pub fn index(&self, date: NaiveDate) -> Option<usize> {
		if date < self.first || date > self.last {
			return None
		}
		Some(((date - self.first).num_days() / WEEK_DAYS) as usize)
	}

	pub fn interval(&self, index: usize) -> Option<WeekInterval> {
		let start = self.first + Duration::days(index as i64 * WEEK_DAYS);
		if start > self.last {
			return None
		}
		let end = (start + Duration::days(WEEK_DAYS - 1)).min(self.last);
		Some(WeekInterval{start, end})
	}

	/// The week containing `date`. Dates outside of the calendar are an
	/// error.
	pub fn week_of(&self, date: NaiveDate) -> Result<WeekInterval> {
		self.index(date)
			.and_then(|i| self.interval(i))
			.ok_or(Error::OutsideCalendar{date, first: self.first, last: self.last})
	}

	pub fn iter(&self) -> impl Iterator<Item = WeekInterval> + '_ {
		(0..self.len()).filter_map(move |i| self.interval(i))
	}
}
