use std::io;
use std::path::PathBuf;

use chrono::NaiveDate;

use thiserror::Error;

use super::source::Source;


#[derive(Error, Debug)]
pub enum Error {
	#[error("source {source_name} not found at {}", .path.display())]
	MissingSource {
		source_name: Source,
		path: PathBuf,
	},

	#[error("join key {key} missing from {source_name}")]
	JoinKey {
		source_name: Source,
		key: &'static str,
	},

	#[error("column {column} missing from {source_name}")]
	MissingColumn {
		source_name: Source,
		column: &'static str,
	},

	#[error("required column {0} fell below the completeness threshold")]
	RequiredColumnPruned(&'static str),

	#[error("failed to parse {value:?} in column {column}")]
	Parse {
		column: String,
		value: String,
	},

	#[error("running total of {0} overflowed")]
	Overflow(&'static str),

	#[error("{0} contains no usable rows")]
	EmptySource(Source),

	#[error("date {date} outside of the week calendar {first}..={last}")]
	OutsideCalendar {
		date: NaiveDate,
		first: NaiveDate,
		last: NaiveDate,
	},

	#[error("start date {start} is after end date {end}")]
	InvalidRange {
		start: NaiveDate,
		end: NaiveDate,
	},

	#[error(transparent)]
	Csv(#[from] csv::Error),

	#[error(transparent)]
	Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
