use std::collections::BTreeMap;

use log::{debug, info};

use enum_map::EnumMap;

use super::calendar::{WeekCalendar, WeekInterval};
use super::combine::CombinedRow;
use super::context::{CountryName, PopulationField, WeeklyCumulative};
use super::error::{Error, Result};
use super::source::{Source, Sources, COUNTRY_NAME, LOCATION_KEY};
use super::table::{parse_f64, Table};
use super::timeseries::grouped_cumsum;


/// Population fields summed over every location of one country.
pub type CountryPopulation = EnumMap<PopulationField, f64>;

#[derive(Debug, Clone, PartialEq)]
pub struct PopulationByCountry {
	pub country_name: CountryName,
	pub population: CountryPopulation,
}

/// One week of one country in the weekly macrotable.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedWeekRow {
	pub week: WeekInterval,
	pub country_name: CountryName,
	pub new_confirmed: u64,
	pub new_deceased: u64,
	pub cumulative: WeeklyCumulative,
	/// `None` if the country has no location in the demographics and index
	/// sources.
	pub population: Option<CountryPopulation>,
}


/// Join demographics with the index and sum the population columns per
/// country. Missing cells count as zero; locations without a country are
/// skipped.
pub fn population_by_country(demographics: &Table, index: &Table) -> Result<Vec<PopulationByCountry>> {
	if !demographics.has_column(LOCATION_KEY) {
		return Err(Error::JoinKey{source_name: Source::Demographics, key: LOCATION_KEY})
	}
	if !index.has_column(LOCATION_KEY) {
		return Err(Error::JoinKey{source_name: Source::Index, key: LOCATION_KEY})
	}
	let joined = demographics.left_join(index, &[LOCATION_KEY]);
	let country = joined.column_index(COUNTRY_NAME);
	let columns: EnumMap<PopulationField, Option<usize>> = EnumMap::from_fn(|f: PopulationField| joined.column_index(f.column()));

	let mut totals: BTreeMap<CountryName, CountryPopulation> = BTreeMap::new();
	for row in joined.rows().iter() {
		let name = match country.and_then(|i| row[i].as_ref()) {
			Some(name) => name,
			None => continue,
		};
		let total = totals.entry(name.clone()).or_default();
		for (field, column) in columns.iter() {
			if let Some(v) = column.and_then(|i| row[i].as_ref()) {
				total[field] += parse_f64(field.column(), v)?;
			}
		}
	}
	debug!("summed population for {} countries", totals.len());
	Ok(totals.into_iter().map(|(country_name, population)| PopulationByCountry{country_name, population}).collect())
}


/// Sum the daily flows per week and country, derive the running totals over
/// each country's weeks and attach the country populations. The output is
/// ordered by week, then by country.
pub fn aggregate<'r>(
	rows: impl IntoIterator<Item = &'r CombinedRow>,
	calendar: &WeekCalendar,
	populations: &[PopulationByCountry],
) -> Result<Vec<AggregatedWeekRow>> {
	let mut sums: BTreeMap<(&CountryName, WeekInterval), (u64, u64)> = BTreeMap::new();
	let mut nrows = 0usize;
	for row in rows {
		nrows += 1;
		let country = match &row.country_name {
			Some(c) => c,
			None => continue,
		};
		let week = calendar.week_of(row.date)?;
		let sum = sums.entry((country, week)).or_insert((0, 0));
		sum.0 = sum.0.checked_add(row.new_confirmed).ok_or(Error::Overflow("weekly new_confirmed"))?;
		sum.1 = sum.1.checked_add(row.new_deceased).ok_or(Error::Overflow("weekly new_deceased"))?;
	}

	// BTreeMap order is (country, week), which is what the running totals need
	let cumulative = grouped_cumsum(
		sums.iter().map(|((country, _), (confirmed, deceased))| (*country, *confirmed, *deceased))
	).ok_or(Error::Overflow("weekly cumulative"))?;

	let populations: BTreeMap<&CountryName, &CountryPopulation> = populations.iter()
		.map(|p| (&p.country_name, &p.population))
		.collect();

	let mut result = Vec::with_capacity(sums.len());
	for (((country, week), (confirmed, deceased)), (cum_confirmed, cum_deceased)) in sums.iter().zip(cumulative.into_iter()) {
		result.push(AggregatedWeekRow{
			week: *week,
			country_name: (*country).clone(),
			new_confirmed: *confirmed,
			new_deceased: *deceased,
			cumulative: WeeklyCumulative{
				confirmed: cum_confirmed,
				deceased: cum_deceased,
			},
			population: populations.get(*country).map(|p| (*p).clone()),
		});
	}
	result.sort_by(|a, b| a.week.cmp(&b.week).then_with(|| a.country_name.cmp(&b.country_name)));
	info!("aggregated {} daily rows into {} weekly rows", nrows, result.len());
	Ok(result)
}


/// The weekly stage as a whole: the calendar is derived from the complete
/// epidemiology source, independent of any filtering applied to `rows`.
pub fn aggregate_weekly<'r>(
	rows: impl IntoIterator<Item = &'r CombinedRow>,
	sources: &Sources,
) -> Result<Vec<AggregatedWeekRow>> {
	let calendar = WeekCalendar::from_epidemiology(&sources.epidemiology)?;
	info!("week calendar spans {} to {} ({} weeks)", calendar.first(), calendar.last(), calendar.len());
	let populations = population_by_country(&sources.demographics, &sources.index)?;
	aggregate(rows, &calendar, &populations)
}
