use chrono::NaiveDate;

use log::info;

mod aggregate;
mod calendar;
mod combine;
mod context;
mod error;
mod filter;
mod ioutil;
mod output;
mod source;
mod table;
mod timeseries;

pub use aggregate::*;
pub use calendar::*;
pub use combine::*;
pub use context::*;
pub use error::*;
pub use filter::*;
pub use ioutil::{magic_create, magic_open, MagicWriter};
pub use output::*;
pub use source::*;
pub use table::*;
pub use timeseries::*;


pub fn default_start_date() -> NaiveDate {
	NaiveDate::from_ymd_opt(2020, 1, 2).expect("valid literal date")
}

pub fn default_end_date() -> NaiveDate {
	NaiveDate::from_ymd_opt(2022, 8, 22).expect("valid literal date")
}


/// The three stages of the macrotable, applied in order to one set of
/// sources.
#[derive(Debug, Clone)]
pub struct Pipeline {
	filter: RowFilter,
}

/// Everything a pipeline run produces.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
	pub combined: CombinedTable,
	pub weekly: Vec<AggregatedWeekRow>,
}

impl Pipeline {
	pub fn new(start: NaiveDate, end: NaiveDate, countries: &[String]) -> Result<Self> {
		Ok(Self{filter: RowFilter::new(start, end, countries)?})
	}

	pub fn run(&self, sources: &Sources) -> Result<PipelineOutput> {
		info!("combining sources ...");
		let combined = combine(sources)?;
		info!("filtering ...");
		let filtered = self.filter.apply(&combined.rows);
		info!("aggregating by week ...");
		let weekly = aggregate_weekly(filtered, sources)?;
		Ok(PipelineOutput{combined, weekly})
	}
}
