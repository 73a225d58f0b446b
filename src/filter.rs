use std::collections::HashSet;

use log::{info, warn};

use chrono::NaiveDate;

use super::combine::CombinedRow;
use super::error::{Error, Result};


/// Date range and optional country allow-list applied to the daily table.
#[derive(Debug, Clone, PartialEq)]
pub struct RowFilter {
	start: NaiveDate,
	end: NaiveDate,
	countries: Option<HashSet<String>>,
}

impl RowFilter {
	/// Both ends of the range are inclusive. An empty country list applies no
	/// country restriction.
	pub fn new(start: NaiveDate, end: NaiveDate, countries: &[String]) -> Result<Self> {
		if start > end {
			return Err(Error::InvalidRange{start, end})
		}
		let countries = if countries.is_empty() {
			None
		} else {
			Some(countries.iter().cloned().collect())
		};
		Ok(Self{start, end, countries})
	}

	pub fn matches(&self, row: &CombinedRow) -> bool {
		if row.date < self.start || row.date > self.end {
			return false
		}
		match &self.countries {
			Some(countries) => match &row.country_name {
				Some(name) => countries.contains(name.as_str()),
				None => false,
			},
			None => true,
		}
	}

	/// Select the matching rows without copying them.
	pub fn apply<'r>(&self, rows: &'r [CombinedRow]) -> Vec<&'r CombinedRow> {
		let before = rows.len();
		let rows: Vec<_> = rows.iter().filter(|r| self.matches(r)).collect();
		info!("kept {} of {} rows between {} and {}", rows.len(), before, self.start, self.end);
		if rows.is_empty() && before > 0 {
			warn!("no rows left after filtering");
		}
		rows
	}
}


/// Keep the rows dated within `start..=end` and, if `countries` is not empty,
/// belonging to one of the named countries.
pub fn filter_rows<'r>(rows: &'r [CombinedRow], start: NaiveDate, end: NaiveDate, countries: &[String]) -> Result<Vec<&'r CombinedRow>> {
	Ok(RowFilter::new(start, end, countries)?.apply(rows))
}


#[cfg(test)]
mod tests {
	use super::*;

	use crate::context::{DailyCumulative, Population};

	fn row(date: NaiveDate, country: Option<&str>) -> CombinedRow {
		CombinedRow{
			location_key: "XX".into(),
			date,
			country_code: "XX".into(),
			country_name: country.map(|c| c.into()),
			population: Population::default(),
			new_confirmed: 1,
			new_deceased: 0,
			cumulative: DailyCumulative::default(),
			attributes: Vec::new(),
		}
	}

	fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
		NaiveDate::from_ymd_opt(y, m, d).unwrap()
	}

	#[test]
	fn range_is_inclusive() {
		let rows: Vec<_> = (1..=10).map(|d| row(ymd(2020, 3, d), Some("Alpha"))).collect();
		let kept = filter_rows(&rows, ymd(2020, 3, 3), ymd(2020, 3, 7), &[]).unwrap();
		let days: Vec<_> = kept.iter().map(|r| r.date).collect();
		assert_eq!(days, (3..=7).map(|d| ymd(2020, 3, d)).collect::<Vec<_>>());
	}

	#[test]
	fn countries_restrict_when_given() {
		let rows = vec![
			row(ymd(2020, 3, 1), Some("Alpha")),
			row(ymd(2020, 3, 1), Some("Beta")),
			row(ymd(2020, 3, 1), None),
			row(ymd(2020, 3, 2), Some("Alpha")),
		];
		let all = filter_rows(&rows, ymd(2020, 1, 1), ymd(2020, 12, 31), &[]).unwrap();
		assert_eq!(all, rows.iter().collect::<Vec<_>>());

		let alpha = filter_rows(&rows, ymd(2020, 1, 1), ymd(2020, 12, 31), &["Alpha".to_string()]).unwrap();
		assert_eq!(alpha, vec![&rows[0], &rows[3]]);
		// the kept rows are the originals, not copies
		assert!(std::ptr::eq(alpha[1], &rows[3]));
	}

	#[test]
	fn filter_is_an_exact_subset() {
		let rows: Vec<_> = (1..=28)
			.map(|d| row(ymd(2021, 2, d), Some(if d % 3 == 0 { "Beta" } else { "Alpha" })))
			.collect();
		let f = RowFilter::new(ymd(2021, 2, 5), ymd(2021, 2, 20), &["Beta".to_string()]).unwrap();
		let kept = f.apply(&rows);
		let expected: Vec<_> = rows.iter()
			.filter(|r| r.date >= ymd(2021, 2, 5) && r.date <= ymd(2021, 2, 20) && r.country_name.as_deref() == Some("Beta"))
			.collect();
		assert_eq!(kept, expected);
		assert!(!kept.is_empty());
	}

	#[test]
	fn inverted_range_is_rejected() {
		match RowFilter::new(ymd(2021, 1, 2), ymd(2021, 1, 1), &[]) {
			Err(Error::InvalidRange{..}) => (),
			other => panic!("unexpected result: {:?}", other),
		}
	}
}
