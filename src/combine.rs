use std::cmp::Ordering;

use log::{debug, info};

use chrono::NaiveDate;

use enum_map::EnumMap;

use smartstring::alias::{String as SmartString};

use super::context::{CountryName, DailyCumulative, LocationKey, Population, PopulationField};
use super::error::{Error, Result};
use super::source::{Source, Sources, COUNTRY_CODE, COUNTRY_NAME, DATE, LOCATION_KEY, NEW_CONFIRMED, NEW_DECEASED};
use super::table::{parse_date, parse_f64, Cell, Table};
use super::timeseries::grouped_cumsum;


/// A column is kept if at least COMPLETENESS_NUM/COMPLETENESS_DEN of the
/// joined rows have a value for it.
pub static COMPLETENESS_NUM: usize = 3;
pub static COMPLETENESS_DEN: usize = 5;

static METADATA_COLUMNS: &[&str] = &[
	"datacommons_id",
	"place_id",
	"subregion2_code",
	"subregion2_name",
	"wikidata_id",
	"subregion1_name",
	"iso_3166_1_alpha_3",
	"aggregation_level",
	"subregion1_code",
	"iso_3166_1_alpha_2",
	"life_expectancy",
];

static REQUIRED_COLUMNS: &[&str] = &[
	"location_key",
	"date",
	"country_code",
	"new_confirmed",
	"new_deceased",
];


/// One location-day of the daily macrotable.
#[derive(Debug, Clone, PartialEq)]
pub struct CombinedRow {
	pub location_key: LocationKey,
	pub date: NaiveDate,
	pub country_code: SmartString,
	pub country_name: Option<CountryName>,
	pub population: Population,
	pub new_confirmed: u64,
	pub new_deceased: u64,
	pub cumulative: DailyCumulative,
	/// Values of [`CombinedTable::attribute_columns`], in that order.
	pub attributes: Vec<Cell>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CombinedTable {
	/// Columns which survived pruning and are not otherwise interpreted.
	pub attribute_columns: Vec<SmartString>,
	pub rows: Vec<CombinedRow>,
}


// Row state between parsing and the final completeness filter.
struct Staged {
	location_key: Option<LocationKey>,
	date: Option<NaiveDate>,
	country_code: Option<SmartString>,
	country_name: Option<CountryName>,
	population: Population,
	new_confirmed: u64,
	new_deceased: u64,
	attributes: Vec<Cell>,
}

fn clean_flow(column: &str, cell: &Cell) -> Result<u64> {
	match cell {
		Some(v) => {
			let parsed = parse_f64(column, v)?;
			if parsed.round() >= u64::MAX as f64 {
				Err(Error::Parse{column: column.to_string(), value: v.to_string()})
			} else if parsed > 0. {
				Ok(parsed.round() as u64)
			} else {
				Ok(0)
			}
		},
		None => Ok(0),
	}
}

fn join_checked(left: Table, right: &Table, source: Source) -> Result<Table> {
	let on = source.join_keys();
	for key in on.iter() {
		if !left.has_column(key) || !right.has_column(key) {
			return Err(Error::JoinKey{source_name: source, key: *key})
		}
	}
	Ok(left.left_join(right, on))
}

/// Join the six sources into the left-preserving daily table, before any
/// pruning.
pub fn join_sources(sources: &Sources) -> Result<Table> {
	sources.validate()?;
	let mut joined = sources.demographics.clone();
	for source in Source::ALL.iter().skip(1) {
		joined = join_checked(joined, sources.get(*source), *source)?;
	}
	info!("joined sources into {} rows and {} columns", joined.len(), joined.columns().len());
	Ok(joined)
}

/// Drop columns below the completeness threshold, then the fixed list of
/// identifier columns.
pub fn prune(table: &mut Table) {
	let sparse = table.prune_sparse(COMPLETENESS_NUM, COMPLETENESS_DEN);
	if !sparse.is_empty() {
		info!("dropped {} columns below the completeness threshold", sparse.len());
	}
	let metadata = table.drop_columns(METADATA_COLUMNS);
	debug!("dropped metadata columns {:?}", metadata);
}

fn check_required(table: &Table) -> Result<()> {
	for column in REQUIRED_COLUMNS.iter() {
		if !table.has_column(column) {
			return Err(Error::RequiredColumnPruned(*column))
		}
	}
	Ok(())
}

fn is_core_column(name: &str) -> bool {
	name == LOCATION_KEY
		|| name == DATE
		|| name == COUNTRY_CODE
		|| name == COUNTRY_NAME
		|| name == NEW_CONFIRMED
		|| name == NEW_DECEASED
		|| PopulationField::ALL.iter().any(|f| f.column() == name)
}

fn stage(table: Table) -> Result<(Vec<SmartString>, Vec<Staged>)> {
	let index_of = |name: &str| table.column_index(name);
	let location_key = index_of(LOCATION_KEY);
	let date = index_of(DATE);
	let country_code = index_of(COUNTRY_CODE);
	let country_name = index_of(COUNTRY_NAME);
	let new_confirmed = index_of(NEW_CONFIRMED);
	let new_deceased = index_of(NEW_DECEASED);
	let population: EnumMap<PopulationField, Option<usize>> = EnumMap::from_fn(|f: PopulationField| index_of(f.column()));
	let attribute_indices: Vec<usize> = (0..table.columns().len())
		.filter(|i| !is_core_column(&table.columns()[*i]))
		.collect();

	let (columns, rows) = table.into_parts();
	let attribute_columns: Vec<SmartString> = attribute_indices.iter().map(|i| columns[*i].clone()).collect();

	let cell = |row: &[Cell], index: Option<usize>| -> Cell {
		index.and_then(|i| row[i].clone())
	};

	let mut staged = Vec::with_capacity(rows.len());
	for row in rows.iter() {
		let row = &row[..];
		let mut pop = Population::default();
		for (field, index) in population.iter() {
			pop[field] = match cell(row, *index) {
				Some(v) => Some(parse_f64(field.column(), &v)?),
				None => None,
			};
		}
		let date = match cell(row, date) {
			Some(v) => Some(parse_date(DATE, &v)?),
			None => None,
		};
		staged.push(Staged{
			location_key: cell(row, location_key),
			date,
			country_code: cell(row, country_code),
			country_name: cell(row, country_name),
			population: pop,
			new_confirmed: clean_flow(NEW_CONFIRMED, &cell(row, new_confirmed))?,
			new_deceased: clean_flow(NEW_DECEASED, &cell(row, new_deceased))?,
			attributes: attribute_indices.iter().map(|i| row[*i].clone()).collect(),
		});
	}
	Ok((attribute_columns, staged))
}

/// Fill missing demographic values: every band and sex with the mean of its
/// column, then the total from the (imputed) male and female counts. The
/// total is only derived if its column survived pruning.
fn impute(rows: &mut [Staged], derive_total: bool) {
	for field in PopulationField::ALL.iter().filter(|f| f.mean_imputed()) {
		let (sum, n) = rows.iter()
			.filter_map(|r| r.population[*field])
			.fold((0., 0usize), |(sum, n), v| (sum + v, n + 1));
		if n == 0 {
			continue
		}
		let mean = sum / n as f64;
		debug!("imputing {} with mean {}", field, mean);
		for row in rows.iter_mut() {
			if row.population[*field].is_none() {
				row.population[*field] = Some(mean);
			}
		}
	}
	if !derive_total {
		return
	}
	for row in rows.iter_mut() {
		let pop = &mut row.population;
		if pop[PopulationField::Total].is_none() {
			if let (Some(male), Some(female)) = (pop[PopulationField::Male], pop[PopulationField::Female]) {
				pop[PopulationField::Total] = Some(male + female);
			}
		}
	}
}

// Missing values sort last, matching the order of a sorted text column.
fn cmp_missing_last<T: Ord>(a: &Option<T>, b: &Option<T>) -> Ordering {
	match (a, b) {
		(Some(a), Some(b)) => a.cmp(b),
		(Some(_), None) => Ordering::Less,
		(None, Some(_)) => Ordering::Greater,
		(None, None) => Ordering::Equal,
	}
}

/// Build the daily macrotable from the six sources.
pub fn combine(sources: &Sources) -> Result<CombinedTable> {
	let mut joined = join_sources(sources)?;
	prune(&mut joined);
	check_required(&joined)?;

	let has_total = joined.has_column(PopulationField::Total.column());
	let (attribute_columns, mut staged) = stage(joined)?;
	impute(&mut staged, has_total);

	staged.sort_by(|a, b| {
		cmp_missing_last(&a.location_key, &b.location_key)
			.then_with(|| cmp_missing_last(&a.date, &b.date))
	});

	// rows without a location never get a cumulative value
	let cumulative = grouped_cumsum(
		staged.iter()
			.filter_map(|r| Some((r.location_key.as_ref()?, r.new_confirmed, r.new_deceased)))
	).ok_or(Error::Overflow("daily cumulative"))?;
	let mut cumulative = cumulative.into_iter();

	let total = staged.len();
	let mut rows = Vec::with_capacity(total);
	for r in staged.into_iter() {
		let location_key = match r.location_key {
			Some(k) => k,
			None => continue,
		};
		let (confirmed, deceased) = match cumulative.next() {
			Some(v) => v,
			None => unreachable!("one cumulative value per located row"),
		};
		let (date, country_code) = match (r.date, r.country_code) {
			(Some(date), Some(code)) => (date, code),
			_ => continue,
		};
		rows.push(CombinedRow{
			location_key,
			date,
			country_code,
			country_name: r.country_name,
			population: r.population,
			new_confirmed: r.new_confirmed,
			new_deceased: r.new_deceased,
			cumulative: DailyCumulative{confirmed, deceased},
			attributes: r.attributes,
		});
	}
	info!("combined table has {} rows ({} incomplete rows dropped)", rows.len(), total - rows.len());
	Ok(CombinedTable{attribute_columns, rows})
}
