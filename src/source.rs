use std::fmt;
use std::path::Path;

use log::info;

use super::error::{Error, Result};
use super::ioutil::magic_open;
use super::table::Table;


pub static LOCATION_KEY: &str = "location_key";
pub static DATE: &str = "date";
pub static NEW_CONFIRMED: &str = "new_confirmed";
pub static NEW_DECEASED: &str = "new_deceased";
pub static COUNTRY_CODE: &str = "country_code";
pub static COUNTRY_NAME: &str = "country_name";


#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Source {
	Demographics,
	Epidemiology,
	Health,
	Hospitalizations,
	Index,
	Vaccinations,
}

impl Source {
	pub const ALL: [Source; 6] = [
		Self::Demographics,
		Self::Epidemiology,
		Self::Health,
		Self::Hospitalizations,
		Self::Index,
		Self::Vaccinations,
	];

	pub fn name(&self) -> &'static str {
		match self {
			Self::Demographics => "demographics",
			Self::Epidemiology => "epidemiology",
			Self::Health => "health",
			Self::Hospitalizations => "hospitalizations",
			Self::Index => "index",
			Self::Vaccinations => "vaccinations",
		}
	}

	/// Keys this source is joined on.
	pub fn join_keys(&self) -> &'static [&'static str] {
		match self {
			Self::Hospitalizations | Self::Vaccinations => &["location_key", "date"],
			_ => &["location_key"],
		}
	}

	/// Whether every row of this source is dated. Epidemiology is joined on the
	/// location alone but supplies the date of every combined row.
	pub fn date_indexed(&self) -> bool {
		matches!(self, Self::Epidemiology | Self::Hospitalizations | Self::Vaccinations)
	}

	fn required_columns(&self) -> &'static [&'static str] {
		match self {
			Self::Epidemiology => &["new_confirmed", "new_deceased"],
			_ => &[],
		}
	}
}

impl fmt::Display for Source {
	fn fmt<'f>(&self, f: &'f mut fmt::Formatter) -> fmt::Result {
		f.write_str(self.name())
	}
}


/// The six raw input tables.
#[derive(Debug, Clone, Default)]
pub struct Sources {
	pub demographics: Table,
	pub epidemiology: Table,
	pub health: Table,
	pub hospitalizations: Table,
	pub index: Table,
	pub vaccinations: Table,
}

impl Sources {
	pub fn get(&self, source: Source) -> &Table {
		match source {
			Source::Demographics => &self.demographics,
			Source::Epidemiology => &self.epidemiology,
			Source::Health => &self.health,
			Source::Hospitalizations => &self.hospitalizations,
			Source::Index => &self.index,
			Source::Vaccinations => &self.vaccinations,
		}
	}

	fn get_mut(&mut self, source: Source) -> &mut Table {
		match source {
			Source::Demographics => &mut self.demographics,
			Source::Epidemiology => &mut self.epidemiology,
			Source::Health => &mut self.health,
			Source::Hospitalizations => &mut self.hospitalizations,
			Source::Index => &mut self.index,
			Source::Vaccinations => &mut self.vaccinations,
		}
	}

	/// Check that every source carries the columns it is joined on and the
	/// columns the combiner reads from it.
	pub fn validate(&self) -> Result<()> {
		for source in Source::ALL.iter() {
			let table = self.get(*source);
			for key in source.join_keys().iter() {
				if !table.has_column(key) {
					return Err(Error::JoinKey{source_name: *source, key: *key})
				}
			}
			if source.date_indexed() && !table.has_column(DATE) {
				return Err(Error::MissingColumn{source_name: *source, column: DATE})
			}
			for column in source.required_columns().iter() {
				if !table.has_column(column) {
					return Err(Error::MissingColumn{source_name: *source, column: *column})
				}
			}
		}
		Ok(())
	}
}


/// Read all six sources from `dir`. Each is looked up as `<name>.csv` and then
/// as `<name>.csv.gz`.
pub fn load_sources<P: AsRef<Path>>(dir: P) -> Result<Sources> {
	let dir = dir.as_ref();
	let mut sources = Sources::default();
	for source in Source::ALL.iter() {
		let plain = dir.join(format!("{}.csv", source.name()));
		let gz = dir.join(format!("{}.csv.gz", source.name()));
		let path = if plain.is_file() {
			plain
		} else if gz.is_file() {
			gz
		} else {
			return Err(Error::MissingSource{source_name: *source, path: plain})
		};
		let table = Table::from_reader(magic_open(&path)?)?;
		info!("loaded {} rows from {}", table.len(), path.display());
		*sources.get_mut(*source) = table;
	}
	sources.validate()?;
	Ok(sources)
}
