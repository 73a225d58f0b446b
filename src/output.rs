use std::io;
use std::path::Path;

use log::info;

use serde::Serialize;

use super::aggregate::AggregatedWeekRow;
use super::calendar::WeekInterval;
use super::combine::CombinedTable;
use super::context::PopulationField;
use super::error::Result;
use super::ioutil::magic_create;


#[derive(Debug, Clone, Serialize)]
struct MacrotableRecord<'x> {
	week: WeekInterval,
	country_name: &'x str,
	new_confirmed: u64,
	new_deceased: u64,
	cumulative_confirmed: u64,
	cumulative_deceased: u64,
	population: Option<f64>,
	population_male: Option<f64>,
	population_female: Option<f64>,
	population_age_00_09: Option<f64>,
	population_age_10_19: Option<f64>,
	population_age_20_29: Option<f64>,
	population_age_30_39: Option<f64>,
	population_age_70_79: Option<f64>,
	population_age_60_69: Option<f64>,
	population_age_50_59: Option<f64>,
	population_age_40_49: Option<f64>,
	population_age_80_and_older: Option<f64>,
}

impl<'x> From<&'x AggregatedWeekRow> for MacrotableRecord<'x> {
	fn from(row: &'x AggregatedWeekRow) -> Self {
		let pop = |field: PopulationField| row.population.as_ref().map(|p| p[field]);
		Self{
			week: row.week,
			country_name: &row.country_name,
			new_confirmed: row.new_confirmed,
			new_deceased: row.new_deceased,
			cumulative_confirmed: row.cumulative.confirmed,
			cumulative_deceased: row.cumulative.deceased,
			population: pop(PopulationField::Total),
			population_male: pop(PopulationField::Male),
			population_female: pop(PopulationField::Female),
			population_age_00_09: pop(PopulationField::Age00To09),
			population_age_10_19: pop(PopulationField::Age10To19),
			population_age_20_29: pop(PopulationField::Age20To29),
			population_age_30_39: pop(PopulationField::Age30To39),
			population_age_70_79: pop(PopulationField::Age70To79),
			population_age_60_69: pop(PopulationField::Age60To69),
			population_age_50_59: pop(PopulationField::Age50To59),
			population_age_40_49: pop(PopulationField::Age40To49),
			population_age_80_and_older: pop(PopulationField::Age80AndOlder),
		}
	}
}


/// Write the weekly macrotable as CSV, keyed by week label and country.
pub fn write_macrotable_to<W: io::Write>(w: W, rows: &[AggregatedWeekRow]) -> Result<()> {
	let mut w = csv::Writer::from_writer(w);
	for row in rows.iter() {
		w.serialize(MacrotableRecord::from(row))?;
	}
	if rows.is_empty() {
		// serialize() only emits the header along with the first record
		w.write_record(MACROTABLE_HEADER)?;
	}
	w.flush()?;
	Ok(())
}

static MACROTABLE_HEADER: &[&str] = &[
	"week",
	"country_name",
	"new_confirmed",
	"new_deceased",
	"cumulative_confirmed",
	"cumulative_deceased",
	"population",
	"population_male",
	"population_female",
	"population_age_00_09",
	"population_age_10_19",
	"population_age_20_29",
	"population_age_30_39",
	"population_age_70_79",
	"population_age_60_69",
	"population_age_50_59",
	"population_age_40_49",
	"population_age_80_and_older",
];

pub fn write_macrotable<P: AsRef<Path>>(path: P, rows: &[AggregatedWeekRow]) -> Result<()> {
	let path = path.as_ref();
	let mut out = magic_create(path)?;
	write_macrotable_to(&mut out, rows)?;
	out.finish()?;
	info!("wrote {} weekly rows to {}", rows.len(), path.display());
	Ok(())
}


/// Write the daily combined table: the interpreted columns and daily running
/// totals first, then all carried attribute columns.
pub fn write_combined_to<W: io::Write>(w: W, table: &CombinedTable) -> Result<()> {
	let mut w = csv::Writer::from_writer(w);
	let mut header: Vec<&str> = vec![
		"location_key",
		"date",
		"country_code",
		"country_name",
		"new_confirmed",
		"new_deceased",
		"cumulative_confirmed",
		"cumulative_deceased",
	];
	header.extend(PopulationField::ALL.iter().map(|f| f.column()));
	header.extend(table.attribute_columns.iter().map(|c| c.as_str()));
	w.write_record(&header)?;

	let mut record: Vec<String> = Vec::with_capacity(header.len());
	for row in table.rows.iter() {
		record.clear();
		record.push(row.location_key.to_string());
		record.push(row.date.format("%Y-%m-%d").to_string());
		record.push(row.country_code.to_string());
		record.push(row.country_name.as_deref().unwrap_or("").to_string());
		record.push(row.new_confirmed.to_string());
		record.push(row.new_deceased.to_string());
		record.push(row.cumulative.confirmed.to_string());
		record.push(row.cumulative.deceased.to_string());
		for field in PopulationField::ALL.iter() {
			record.push(row.population[*field].map(|v| v.to_string()).unwrap_or_default());
		}
		for cell in row.attributes.iter() {
			record.push(cell.as_deref().unwrap_or("").to_string());
		}
		w.write_record(&record)?;
	}
	w.flush()?;
	Ok(())
}

pub fn write_combined<P: AsRef<Path>>(path: P, table: &CombinedTable) -> Result<()> {
	let path = path.as_ref();
	let mut out = magic_create(path)?;
	write_combined_to(&mut out, table)?;
	out.finish()?;
	info!("wrote {} daily rows to {}", table.rows.len(), path.display());
	Ok(())
}


#[cfg(test)]
mod tests {
	use super::*;

	use chrono::NaiveDate;
	use enum_map::EnumMap;

	use crate::combine::CombinedRow;
	use crate::context::{DailyCumulative, Population, WeeklyCumulative};

	fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
		NaiveDate::from_ymd_opt(y, m, d).unwrap()
	}

	#[test]
	fn macrotable_leads_with_week_and_country() {
		let mut pop: EnumMap<PopulationField, f64> = EnumMap::default();
		pop[PopulationField::Total] = 100.;
		let rows = vec![
			AggregatedWeekRow{
				week: WeekInterval{start: ymd(2020, 1, 1), end: ymd(2020, 1, 7)},
				country_name: "Alpha".into(),
				new_confirmed: 10,
				new_deceased: 1,
				cumulative: WeeklyCumulative{confirmed: 10, deceased: 1},
				population: Some(pop),
			},
			AggregatedWeekRow{
				week: WeekInterval{start: ymd(2020, 1, 1), end: ymd(2020, 1, 7)},
				country_name: "Beta".into(),
				new_confirmed: 0,
				new_deceased: 0,
				cumulative: WeeklyCumulative::default(),
				population: None,
			},
		];
		let mut buf = Vec::new();
		write_macrotable_to(&mut buf, &rows).unwrap();
		let text = String::from_utf8(buf).unwrap();
		let lines: Vec<&str> = text.lines().collect();
		assert_eq!(lines[0], MACROTABLE_HEADER.join(","));
		assert!(lines[1].starts_with("2020-01-01/2020-01-07,Alpha,10,1,10,1,100"));
		assert_eq!(lines[2], "2020-01-01/2020-01-07,Beta,0,0,0,0,,,,,,,,,,,,");
	}

	#[test]
	fn empty_macrotable_still_has_a_header() {
		let mut buf = Vec::new();
		write_macrotable_to(&mut buf, &[]).unwrap();
		let text = String::from_utf8(buf).unwrap();
		assert_eq!(text.trim_end(), MACROTABLE_HEADER.join(","));
	}

	#[test]
	fn gzipped_macrotable_is_complete() {
		use std::io::Read;

		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("macrotable.csv.gz");
		write_macrotable(&path, &[]).unwrap();
		let mut text = String::new();
		crate::ioutil::magic_open(&path).unwrap().read_to_string(&mut text).unwrap();
		assert_eq!(text.trim_end(), MACROTABLE_HEADER.join(","));
	}

	#[test]
	fn combined_carries_attributes() {
		let table = CombinedTable{
			attribute_columns: vec!["new_tested".into()],
			rows: vec![CombinedRow{
				location_key: "AA".into(),
				date: ymd(2020, 1, 1),
				country_code: "AA".into(),
				country_name: None,
				population: Population::default(),
				new_confirmed: 3,
				new_deceased: 0,
				cumulative: DailyCumulative{confirmed: 3, deceased: 0},
				attributes: vec![Some("12".into())],
			}],
		};
		let mut buf = Vec::new();
		write_combined_to(&mut buf, &table).unwrap();
		let text = String::from_utf8(buf).unwrap();
		let lines: Vec<&str> = text.lines().collect();
		assert!(lines[0].ends_with(",population_age_80_and_older,new_tested"));
		assert_eq!(lines[1], "AA,2020-01-01,AA,,3,0,3,0,,,,,,,,,,,,,12");
	}
}
