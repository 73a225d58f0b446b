use std::fmt;

use enum_map::{Enum, EnumMap};

use smartstring::alias::{String as SmartString};

pub type LocationKey = SmartString;
pub type CountryName = SmartString;


/// Demographic population columns, in the order they are reported in the
/// macrotable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Enum)]
pub enum PopulationField {
	Total,
	Male,
	Female,
	Age00To09,
	Age10To19,
	Age20To29,
	Age30To39,
	Age70To79,
	Age60To69,
	Age50To59,
	Age40To49,
	Age80AndOlder,
}

impl PopulationField {
	pub const ALL: [PopulationField; 12] = [
		Self::Total,
		Self::Male,
		Self::Female,
		Self::Age00To09,
		Self::Age10To19,
		Self::Age20To29,
		Self::Age30To39,
		Self::Age70To79,
		Self::Age60To69,
		Self::Age50To59,
		Self::Age40To49,
		Self::Age80AndOlder,
	];

	pub fn column(&self) -> &'static str {
		match self {
			Self::Total => "population",
			Self::Male => "population_male",
			Self::Female => "population_female",
			Self::Age00To09 => "population_age_00_09",
			Self::Age10To19 => "population_age_10_19",
			Self::Age20To29 => "population_age_20_29",
			Self::Age30To39 => "population_age_30_39",
			Self::Age70To79 => "population_age_70_79",
			Self::Age60To69 => "population_age_60_69",
			Self::Age50To59 => "population_age_50_59",
			Self::Age40To49 => "population_age_40_49",
			Self::Age80AndOlder => "population_age_80_and_older",
		}
	}

	/// Whether missing values are imputed with the column mean. The total is
	/// instead derived from the male and female counts.
	pub fn mean_imputed(&self) -> bool {
		!matches!(self, Self::Total)
	}
}

impl fmt::Display for PopulationField {
	fn fmt<'f>(&self, f: &'f mut fmt::Formatter) -> fmt::Result {
		f.write_str(self.column())
	}
}


/// Population breakdown of a location or country. `None` marks a value which
/// is missing in the sources.
pub type Population = EnumMap<PopulationField, Option<f64>>;


/// Sum of daily flows per location, in chronological order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DailyCumulative {
	pub confirmed: u64,
	pub deceased: u64,
}

/// Sum of weekly flows per country, in chronological order of weeks. This is
/// not derived from [`DailyCumulative`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WeeklyCumulative {
	pub confirmed: u64,
	pub deceased: u64,
}
