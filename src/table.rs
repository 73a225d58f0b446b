use std::collections::HashMap;
use std::io;

use chrono::NaiveDate;

use log::debug;

use smartstring::alias::{String as SmartString};

use super::error::{Error, Result};


pub type Cell = Option<SmartString>;

static NULL_MARKERS: &[&str] = &[
	"", "NA", "N/A", "n/a", "NaN", "nan", "-NaN", "-nan", "NULL", "null", "None", "<NA>",
	"#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "1.#IND", "1.#QNAN",
];

fn parse_cell(s: &str) -> Cell {
	if NULL_MARKERS.contains(&s) {
		return None
	}
	Some(s.into())
}


/// A header-addressed table of text cells, as read from the sources.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
	columns: Vec<SmartString>,
	rows: Vec<Vec<Cell>>,
}

impl Table {
	pub fn from_reader<R: io::Read>(r: R) -> Result<Self> {
		let mut r = csv::Reader::from_reader(r);
		let columns: Vec<SmartString> = r.headers()?.iter().map(|h| h.into()).collect();
		let mut rows = Vec::new();
		for record in r.records() {
			let record = record?;
			rows.push(record.iter().map(parse_cell).collect());
		}
		Ok(Self{columns, rows})
	}

	/// Build a table from literal CSV text. Mostly useful in tests.
	pub fn from_csv_str(s: &str) -> Result<Self> {
		Self::from_reader(s.as_bytes())
	}

	#[inline(always)]
	pub fn columns(&self) -> &[SmartString] {
		&self.columns
	}

	#[inline(always)]
	pub fn rows(&self) -> &[Vec<Cell>] {
		&self.rows
	}

	#[inline(always)]
	pub fn len(&self) -> usize {
		self.rows.len()
	}

	#[inline(always)]
	pub fn is_empty(&self) -> bool {
		self.rows.is_empty()
	}

	pub fn column_index(&self, name: &str) -> Option<usize> {
		self.columns.iter().position(|c| c == name)
	}

	pub fn has_column(&self, name: &str) -> bool {
		self.column_index(name).is_some()
	}

	/// Iterate over the cells of one column; yields nothing if the column
	/// does not exist.
	pub fn column_cells<'t>(&'t self, name: &str) -> impl Iterator<Item = Option<&'t str>> + 't {
		let index = self.column_index(name);
		self.rows.iter().filter_map(move |row| {
			Some(row[index?].as_deref())
		})
	}

	pub fn non_missing(&self, index: usize) -> usize {
		self.rows.iter().filter(|row| row[index].is_some()).count()
	}

	/// Left join on the given key columns. Left row order is preserved, a left
	/// row matching several right rows is repeated once per match, and a
	/// missing key never matches. Colliding non-key columns get `_x`/`_y`
	/// suffixes. Both sides must carry every key column.
	pub fn left_join(&self, right: &Table, on: &[&str]) -> Table {
		let lkeys: Vec<usize> = on.iter().map(|k| self.column_index(k).expect("left join key")).collect();
		let rkeys: Vec<usize> = on.iter().map(|k| right.column_index(k).expect("right join key")).collect();

		let mut index: HashMap<Vec<&str>, Vec<usize>> = HashMap::new();
		for (i, row) in right.rows.iter().enumerate() {
			let key: Option<Vec<&str>> = rkeys.iter().map(|k| row[*k].as_deref()).collect();
			if let Some(key) = key {
				index.entry(key).or_default().push(i);
			}
		}

		let rcarry: Vec<usize> = (0..right.columns.len()).filter(|i| !rkeys.contains(i)).collect();
		let mut columns = Vec::with_capacity(self.columns.len() + rcarry.len());
		for (i, name) in self.columns.iter().enumerate() {
			if !lkeys.contains(&i) && rcarry.iter().any(|r| right.columns[*r] == *name) {
				columns.push(format!("{}_x", name).into());
			} else {
				columns.push(name.clone());
			}
		}
		for r in rcarry.iter() {
			let name = &right.columns[*r];
			let collides = self.columns.iter().enumerate().any(|(i, c)| !lkeys.contains(&i) && c == name);
			if collides {
				columns.push(format!("{}_y", name).into());
			} else {
				columns.push(name.clone());
			}
		}

		let mut rows = Vec::with_capacity(self.rows.len());
		for row in self.rows.iter() {
			let key: Option<Vec<&str>> = lkeys.iter().map(|k| row[*k].as_deref()).collect();
			let matches = key.as_ref().and_then(|key| index.get(key));
			match matches {
				Some(matches) => {
					for m in matches.iter() {
						let rrow = &right.rows[*m];
						let mut out = row.clone();
						out.extend(rcarry.iter().map(|r| rrow[*r].clone()));
						rows.push(out);
					}
				},
				None => {
					let mut out = row.clone();
					out.resize(columns.len(), None);
					rows.push(out);
				},
			}
		}
		Table{columns, rows}
	}

	/// Drop every column with fewer than `numerator/denominator` of its rows
	/// filled. Returns the names of the dropped columns.
	pub fn prune_sparse(&mut self, numerator: usize, denominator: usize) -> Vec<SmartString> {
		let n = self.rows.len();
		let keep: Vec<bool> = (0..self.columns.len()).map(|i| {
			self.non_missing(i) * denominator >= n * numerator
		}).collect();
		for (i, keep) in keep.iter().enumerate() {
			if !keep {
				debug!("dropping sparse column {} ({}/{} filled)", self.columns[i], self.non_missing(i), n);
			}
		}
		self.retain_columns(&keep)
	}

	/// Drop the named columns; names which do not exist are ignored.
	pub fn drop_columns(&mut self, names: &[&str]) -> Vec<SmartString> {
		let keep: Vec<bool> = self.columns.iter().map(|c| !names.contains(&c.as_str())).collect();
		self.retain_columns(&keep)
	}

	fn retain_columns(&mut self, keep: &[bool]) -> Vec<SmartString> {
		let mut dropped = Vec::new();
		let mut columns = Vec::with_capacity(self.columns.len());
		for (name, keep) in self.columns.drain(..).zip(keep.iter()) {
			if *keep {
				columns.push(name);
			} else {
				dropped.push(name);
			}
		}
		self.columns = columns;
		for row in self.rows.iter_mut() {
			let mut i = 0;
			row.retain(|_| {
				let k = keep[i];
				i += 1;
				k
			});
		}
		dropped
	}

	pub fn into_parts(self) -> (Vec<SmartString>, Vec<Vec<Cell>>) {
		(self.columns, self.rows)
	}
}


pub fn parse_f64(column: &str, value: &str) -> Result<f64> {
	value.trim().parse::<f64>().map_err(|_| Error::Parse{
		column: column.into(),
		value: value.into(),
	})
}

pub fn parse_date(column: &str, value: &str) -> Result<NaiveDate> {
	NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| Error::Parse{
		column: column.into(),
		value: value.into(),
	})
}


#[cfg(test)]
mod tests {
	use super::*;

	fn names(t: &Table) -> Vec<&str> {
		t.columns().iter().map(|c| c.as_str()).collect()
	}

	#[test]
	fn null_markers_are_missing() {
		let t = Table::from_csv_str("a,b,c\n,NaN,x\n").unwrap();
		assert_eq!(t.rows()[0], vec![None, None, Some(SmartString::from("x"))]);
	}

	#[test]
	fn left_join_keeps_unmatched_left_rows() {
		let left = Table::from_csv_str("location_key,population\nAF,10\nUS,20\n").unwrap();
		let right = Table::from_csv_str("location_key,date,new_confirmed\nUS,2020-01-01,1\nUS,2020-01-02,2\nDE,2020-01-01,3\n").unwrap();
		let joined = left.left_join(&right, &["location_key"]);
		assert_eq!(names(&joined), vec!["location_key", "population", "date", "new_confirmed"]);
		assert_eq!(joined.len(), 3);
		assert_eq!(joined.rows()[0], vec![Some(SmartString::from("AF")), Some(SmartString::from("10")), None, None]);
		assert_eq!(joined.rows()[1][2], Some("2020-01-01".into()));
		assert_eq!(joined.rows()[2][2], Some("2020-01-02".into()));
	}

	#[test]
	fn left_join_on_composite_key() {
		let left = Table::from_csv_str("location_key,date\nUS,2020-01-01\nUS,\n").unwrap();
		let right = Table::from_csv_str("location_key,date,beds\nUS,2020-01-01,5\nUS,2020-01-02,6\n").unwrap();
		let joined = left.left_join(&right, &["location_key", "date"]);
		assert_eq!(joined.len(), 2);
		assert_eq!(joined.rows()[0][2], Some("5".into()));
		// a missing key never matches
		assert_eq!(joined.rows()[1][2], None);
	}

	#[test]
	fn left_join_suffixes_collisions() {
		let left = Table::from_csv_str("location_key,name\nAF,a\n").unwrap();
		let right = Table::from_csv_str("location_key,name\nAF,b\n").unwrap();
		let joined = left.left_join(&right, &["location_key"]);
		assert_eq!(names(&joined), vec!["location_key", "name_x", "name_y"]);
	}

	#[test]
	fn prune_keeps_exactly_sixty_percent() {
		let t = "a,b,c\n1,1,1\n2,2,2\n3,3,3\n4,4,\n5,,\n";
		let mut t = Table::from_csv_str(t).unwrap();
		let dropped = t.prune_sparse(3, 5);
		// b is 4/5 filled, c is 3/5 filled: both stay
		assert!(dropped.is_empty());

		let t = "a,b\n1,1\n2,2\n3,\n4,\n5,\n";
		let mut t = Table::from_csv_str(t).unwrap();
		let dropped = t.prune_sparse(3, 5);
		assert_eq!(dropped, vec![SmartString::from("b")]);
		assert_eq!(names(&t), vec!["a"]);
		assert!(t.rows().iter().all(|r| r.len() == 1));
	}

	#[test]
	fn drop_columns_ignores_unknown_names() {
		let mut t = Table::from_csv_str("a,wikidata_id\n1,Q1\n").unwrap();
		let dropped = t.drop_columns(&["wikidata_id", "place_id"]);
		assert_eq!(dropped, vec![SmartString::from("wikidata_id")]);
		assert_eq!(names(&t), vec!["a"]);
	}
}
