use std::io;
use std::io::{Read, Write};
use std::fs;
use std::path::Path;

use flate2;


pub fn magic_open<P: AsRef<Path>>(path: P) -> io::Result<Box<dyn Read>> {
	let path = path.as_ref();
	match path.extension() {
		Some(x) if x == "gz" => {
			Ok(Box::new(flate2::read::GzDecoder::new(fs::File::open(path)?)))
		},
		_ => Ok(Box::new(fs::File::open(path)?)),
	}
}

/// Output file opened by [`magic_create`]. [`MagicWriter::finish`] must be
/// called once writing is done; dropping the writer swallows errors from the
/// final flush and the gzip trailer.
pub enum MagicWriter {
	Plain(io::BufWriter<fs::File>),
	Gzip(flate2::write::GzEncoder<io::BufWriter<fs::File>>),
}

impl MagicWriter {
	pub fn finish(self) -> io::Result<()> {
		let mut buffered = match self {
			Self::Plain(w) => w,
			Self::Gzip(w) => w.finish()?,
		};
		buffered.flush()?;
		buffered.into_inner().map_err(|e| e.into_error())?.sync_all()
	}
}

impl Write for MagicWriter {
	fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
		match self {
			Self::Plain(w) => w.write(buf),
			Self::Gzip(w) => w.write(buf),
		}
	}

	fn flush(&mut self) -> io::Result<()> {
		match self {
			Self::Plain(w) => w.flush(),
			Self::Gzip(w) => w.flush(),
		}
	}
}

pub fn magic_create<P: AsRef<Path>>(path: P) -> io::Result<MagicWriter> {
	let path = path.as_ref();
	let f = io::BufWriter::new(fs::File::create(path)?);
	match path.extension() {
		Some(x) if x == "gz" => {
			Ok(MagicWriter::Gzip(flate2::write::GzEncoder::new(f, flate2::Compression::default())))
		},
		_ => Ok(MagicWriter::Plain(f)),
	}
}


#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn gz_roundtrip_is_transparent() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("demographics.csv.gz");
		let mut w = magic_create(&path).unwrap();
		assert!(matches!(w, MagicWriter::Gzip(_)));
		w.write_all(b"location_key,population\nAF,100\n").unwrap();
		w.finish().unwrap();
		let mut s = String::new();
		magic_open(&path).unwrap().read_to_string(&mut s).unwrap();
		assert_eq!(s, "location_key,population\nAF,100\n");
	}

	#[test]
	fn finish_completes_the_gzip_stream() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("macrotable.csv.gz");
		let mut w = magic_create(&path).unwrap();
		w.write_all(b"week,country_name\n").unwrap();
		w.finish().unwrap();
		// a complete member ends with the CRC32 and length trailer
		let raw = fs::read(&path).unwrap();
		assert_eq!(&raw[..2], &[0x1f, 0x8b]);
		let len = u32::from_le_bytes([raw[raw.len() - 4], raw[raw.len() - 3], raw[raw.len() - 2], raw[raw.len() - 1]]);
		assert_eq!(len as usize, b"week,country_name\n".len());
	}

	#[test]
	fn plain_output_is_written_on_finish() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("macrotable.csv");
		let mut w = magic_create(&path).unwrap();
		assert!(matches!(w, MagicWriter::Plain(_)));
		w.write_all(b"a,b\n").unwrap();
		w.finish().unwrap();
		assert_eq!(fs::read_to_string(&path).unwrap(), "a,b\n");
	}
}
