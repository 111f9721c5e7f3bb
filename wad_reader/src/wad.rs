//! The WAD container: header, lump directory, and name-based lookup.
//!
//! The file is read into memory once at open; everything downstream decodes
//! from that buffer and owns its results, so the `Wad` can be dropped as soon
//! as processing finishes.

use std::fmt;
use std::io::{self, Cursor};
use std::path::Path;
use log::info;
use crate::{level::{self, Level}, name::Name, read_boxed_slice, readable, Error, Readable, Result};

pub const HEADER_SIZE: usize = 12;
pub const DIRECTORY_RECORD_SIZE: usize = 16;

/// The 4-byte identification tag at the start of the archive.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WadKind {
	/// "IWAD": a full, standalone archive.
	Internal,
	/// "PWAD": a patch archive overriding parts of another.
	Patch,
}

impl fmt::Display for WadKind {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		f.write_str(match self {
			WadKind::Internal => "IWAD",
			WadKind::Patch => "PWAD",
		})
	}
}

/// One 16-byte directory record: a named byte range inside the archive.
/// Names are not unique across the archive; disambiguation is positional.
#[derive(Clone, Copy)]
pub struct LumpInfo {
	pub offset: u32,
	pub size: u32,
	pub name: Name,
}

readable!(LumpInfo { offset, size, name });

/// How far a directory scan may run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Scan {
	/// Level-scoped geometry lookup: stop at the next level marker so a
	/// search never drifts into another level's records.
	Level,
	/// Archive-global lookup (palette, patch tables, textures, flats):
	/// markers do not terminate the scan.
	Global,
}

pub struct Wad {
	kind: WadKind,
	data: Box<[u8]>,
	directory: Box<[LumpInfo]>,
}

impl Wad {
	pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
		Self::from_bytes(std::fs::read(path)?)
	}

	/// Parses the header and reads the full directory table into memory.
	pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
		if data.len() < HEADER_SIZE {
			return Err(Error::Format(format!("{} bytes is too short for a WAD header", data.len())));
		}
		let kind = match &data[..4] {
			b"IWAD" => WadKind::Internal,
			b"PWAD" => WadKind::Patch,
			magic => return Err(Error::Format(format!("unrecognized magic {:?}", magic))),
		};
		let mut cursor = Cursor::new(&data[4..HEADER_SIZE]);
		let num_lumps = u32::read(&mut cursor)? as usize;
		let directory_offset = u32::read(&mut cursor)? as usize;
		let directory_end = directory_offset
			.checked_add(num_lumps * DIRECTORY_RECORD_SIZE)
			.filter(|&end| end <= data.len())
			.ok_or_else(|| Error::Format(format!(
				"directory of {} lumps at offset {} extends past {} bytes",
				num_lumps, directory_offset, data.len(),
			)))?;
		let directory = read_boxed_slice(&mut Cursor::new(&data[directory_offset..directory_end]), num_lumps)?;
		info!("{} archive, {} lumps", kind, num_lumps);
		Ok(Self { kind, data: data.into_boxed_slice(), directory })
	}

	pub fn kind(&self) -> WadKind {
		self.kind
	}

	pub fn directory(&self) -> &[LumpInfo] {
		&self.directory
	}

	/// Linear directory scan for an exact trimmed-name match, starting at
	/// `start_index`. Under `Scan::Level` the scan gives up at the first
	/// level marker at or past `start_index`, so a level with no lumps of
	/// its own never picks up its successor's.
	pub fn find_lump_from(&self, name: &str, start_index: usize, scan: Scan) -> Option<&LumpInfo> {
		for info in self.directory.iter().skip(start_index) {
			if scan == Scan::Level && info.name.is_level_marker() {
				return None;
			}
			if info.name.as_str() == name {
				return Some(info);
			}
		}
		None
	}

	/// Archive-global lookup from the start of the directory.
	pub fn find_lump(&self, name: &str) -> Option<&LumpInfo> {
		self.find_lump_from(name, 0, Scan::Global)
	}

	/// The byte range of a lump. A range reaching past the end of the file
	/// is a short read.
	pub fn read_lump(&self, info: &LumpInfo) -> Result<&[u8]> {
		let start = info.offset as usize;
		let end = start + info.size as usize;
		if end > self.data.len() {
			return Err(Error::Io(io::Error::new(
				io::ErrorKind::UnexpectedEof,
				format!("lump {} spans {}..{} in a {}-byte archive", info.name, start, end, self.data.len()),
			)));
		}
		Ok(&self.data[start..end])
	}

	/// Bytes of a globally-looked-up lump, or `None` when absent. Absence
	/// here is a normal "feature absent" signal, not an error.
	pub fn global_lump_bytes(&self, name: &str) -> Option<&[u8]> {
		let info = self.find_lump(name)?;
		match self.read_lump(info) {
			Ok(bytes) => Some(bytes),
			Err(error) => {
				log::warn!("lump {}: {}", name, error);
				None
			}
		}
	}

	/// Runs the one-shot pipeline: shared texture data once, then one
	/// `Level` per marker, in directory order.
	pub fn process(&self) -> Vec<Level> {
		level::assemble_levels(self)
	}
}


#[cfg(test)]
mod tests {
	use super::{test_support::build_wad, *};

	#[test]
	fn rejects_bad_magic() {
		let data = build_wad(b"WAD2", &[]);
		assert!(matches!(Wad::from_bytes(data), Err(Error::Format(_))));
	}

	#[test]
	fn rejects_truncated_header() {
		assert!(matches!(Wad::from_bytes(b"IWAD\0\0".to_vec()), Err(Error::Format(_))));
	}

	#[test]
	fn rejects_directory_past_end() {
		let mut data = b"PWAD".to_vec();
		data.extend_from_slice(&100u32.to_le_bytes());
		data.extend_from_slice(&12u32.to_le_bytes());
		assert!(matches!(Wad::from_bytes(data), Err(Error::Format(_))));
	}

	#[test]
	fn directory_count_matches_header() {
		let data = build_wad(b"IWAD", &[("A", vec![1]), ("B", vec![2, 3]), ("C", vec![])]);
		let wad = Wad::from_bytes(data).unwrap();
		assert_eq!(wad.kind(), WadKind::Internal);
		assert_eq!(wad.directory().len(), 3);
		assert_eq!(wad.directory()[1].name.as_str(), "B");
		assert_eq!(wad.directory()[1].size, 2);
	}

	#[test]
	fn lump_bytes_round_trip() {
		let data = build_wad(b"PWAD", &[("DATA", vec![9, 8, 7])]);
		let wad = Wad::from_bytes(data).unwrap();
		let info = wad.find_lump("DATA").unwrap();
		assert_eq!(wad.read_lump(info).unwrap(), &[9, 8, 7]);
	}

	#[test]
	fn short_lump_range_is_an_io_error() {
		let mut data = build_wad(b"PWAD", &[("DATA", vec![1, 2, 3])]);
		//corrupt the directory's size field
		let len = data.len();
		data[len - 12] = 0xFF;
		let wad = Wad::from_bytes(data).unwrap();
		let info = *wad.find_lump("DATA").unwrap();
		assert!(matches!(wad.read_lump(&info), Err(Error::Io(_))));
	}

	#[test]
	fn level_scoped_scan_stops_at_next_marker() {
		let data = build_wad(b"IWAD", &[
			("E1M1", vec![]),
			("THINGS", vec![1]),
			("E1M2", vec![]),
			("VERTEXES", vec![2]),
		]);
		let wad = Wad::from_bytes(data).unwrap();
		//VERTEXES exists only under E1M2; a scoped search from E1M1 must miss it
		assert!(wad.find_lump_from("VERTEXES", 1, Scan::Level).is_none());
		assert!(wad.find_lump_from("VERTEXES", 3, Scan::Level).is_some());
		//a global search crosses markers freely
		assert!(wad.find_lump("VERTEXES").is_some());
	}

	#[test]
	fn scan_starting_on_a_marker_finds_nothing() {
		//an empty level's scan begins exactly on the next level's marker
		let data = build_wad(b"IWAD", &[
			("E1M1", vec![]),
			("E1M2", vec![]),
			("VERTEXES", vec![2]),
		]);
		let wad = Wad::from_bytes(data).unwrap();
		assert!(wad.find_lump_from("VERTEXES", 1, Scan::Level).is_none());
		assert!(wad.find_lump_from("VERTEXES", 2, Scan::Level).is_some());
	}

	#[test]
	fn duplicate_names_resolve_positionally() {
		let data = build_wad(b"IWAD", &[
			("E1M1", vec![]),
			("THINGS", vec![1]),
			("E1M2", vec![]),
			("THINGS", vec![2]),
		]);
		let wad = Wad::from_bytes(data).unwrap();
		let first = wad.find_lump_from("THINGS", 1, Scan::Level).unwrap();
		let second = wad.find_lump_from("THINGS", 3, Scan::Level).unwrap();
		assert_eq!(wad.read_lump(first).unwrap(), &[1]);
		assert_eq!(wad.read_lump(second).unwrap(), &[2]);
	}
}
