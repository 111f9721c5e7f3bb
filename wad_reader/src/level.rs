//! Per-level assembly: slicing the directory at level markers and decoding
//! the five geometry lumps scoped to each marker.

use std::sync::Arc;
use log::{info, warn};
use nonmax::NonMaxU16;
use crate::{
	model::{decode_records, Linedef, Sector, Sidedef, Thing, Vertex},
	texture::{decode_palette, decode_patch, decode_patch_names, decode_texture_defs, Palette, Patch, TextureDef},
	wad::{Scan, Wad},
	Error, Name, Readable, Result,
};

/// Texture, patch and palette data decoded once per archive and shared by
/// every level in it. Never copied per level.
#[derive(Default)]
pub struct SharedAssets {
	pub palette: Option<Palette>,
	/// PNAMES order; texture definitions index into this
	pub patch_names: Box<[Name]>,
	/// Aligned with `patch_names`; undecodable entries are empty
	pub patches: Box<[Patch]>,
	/// TEXTURE1 then TEXTURE2
	pub texture_defs: Vec<TextureDef>,
}

/// One playable level: the records between its marker and the next, plus a
/// handle on the archive-wide texture data. Immutable once assembled.
pub struct Level {
	pub name: String,
	pub vertices: Box<[Vertex]>,
	pub linedefs: Box<[Linedef]>,
	pub sidedefs: Box<[Sidedef]>,
	pub sectors: Box<[Sector]>,
	pub things: Box<[Thing]>,
	/// First Thing of type 1, when present
	pub player_start: Option<Thing>,
	pub assets: Arc<SharedAssets>,
}

impl Level {
	/// Bounds-checked sidedef dereference; `None` covers both the 0xFFFF
	/// sentinel and an out-of-range index.
	pub fn sidedef(&self, index: Option<NonMaxU16>) -> Option<&Sidedef> {
		self.sidedefs.get(index?.get() as usize)
	}

	pub fn sector_of(&self, sidedef: &Sidedef) -> Option<&Sector> {
		self.sectors.get(sidedef.sector as usize)
	}
}

/// Trimmed-name level lookup. Padding around the query is ignored, so
/// `" E1M1 "` and `"E1M1"` resolve to the same level.
pub fn find_level<'a>(levels: &'a [Level], name: &str) -> Result<&'a Level> {
	let trimmed = name.trim_matches(|c| c == ' ' || c == '\0');
	levels
		.iter()
		.find(|level| level.name == trimmed)
		.ok_or_else(|| Error::NotFound(format!("level {}", trimmed)))
}

pub fn level_name_by_index(levels: &[Level], index: usize) -> Result<&str> {
	levels
		.get(index)
		.map(|level| level.name.as_str())
		.ok_or_else(|| Error::NotFound(format!("level index {} of {}", index, levels.len())))
}

//absence and decode failure both yield zero records
fn decode_level_lump<T: Readable>(wad: &Wad, name: &str, start_index: usize, record_size: usize) -> Box<[T]> {
	let Some(info) = wad.find_lump_from(name, start_index, Scan::Level) else {
		return Box::new([]);
	};
	let bytes = match wad.read_lump(info) {
		Ok(bytes) => bytes,
		Err(error) => {
			warn!("lump {}: {}", name, error);
			return Box::new([]);
		}
	};
	match decode_records(bytes, record_size, name) {
		Ok(records) => records,
		Err(error) => {
			warn!("{}", error);
			Box::new([])
		}
	}
}

fn decode_shared_assets(wad: &Wad) -> SharedAssets {
	let palette = wad.global_lump_bytes("PLAYPAL").and_then(|bytes| match decode_palette(bytes) {
		Ok(palette) => Some(palette),
		Err(error) => {
			warn!("{}", error);
			None
		}
	});
	if palette.is_none() {
		warn!("no usable PLAYPAL, textures will not be composited");
	}
	let patch_names = wad
		.global_lump_bytes("PNAMES")
		.and_then(|bytes| match decode_patch_names(bytes) {
			Ok(names) => Some(names),
			Err(error) => {
				warn!("{}", error);
				None
			}
		})
		.unwrap_or_default();
	let patches = patch_names
		.iter()
		.map(|&name| {
			let Some(bytes) = wad.global_lump_bytes(name.as_str()) else {
				warn!("patch {} named by PNAMES is missing", name);
				return Patch::missing(name);
			};
			match decode_patch(name, bytes) {
				Ok(patch) => patch,
				Err(error) => {
					warn!("{}", error);
					Patch::missing(name)
				}
			}
		})
		.collect();
	let mut texture_defs = Vec::new();
	for table in ["TEXTURE1", "TEXTURE2"] {
		if let Some(bytes) = wad.global_lump_bytes(table) {
			match decode_texture_defs(bytes) {
				Ok(defs) => texture_defs.extend(defs),
				Err(error) => warn!("{}: {}", table, error),
			}
		}
	}
	SharedAssets { palette, patch_names, patches, texture_defs }
}

/// Walks the directory for level markers and assembles a `Level` per marker.
/// An archive with no markers yields an empty list; that is reported, not
/// fatal.
pub(crate) fn assemble_levels(wad: &Wad) -> Vec<Level> {
	let assets = Arc::new(decode_shared_assets(wad));
	let mut levels = Vec::new();
	for (index, info) in wad.directory().iter().enumerate() {
		if !info.name.is_level_marker() {
			continue;
		}
		//geometry lumps sit just past the marker
		let start = index + 1;
		let vertices: Box<[Vertex]> = decode_level_lump(wad, "VERTEXES", start, Vertex::RECORD_SIZE);
		let linedefs: Box<[Linedef]> = decode_level_lump(wad, "LINEDEFS", start, Linedef::RECORD_SIZE);
		let sidedefs: Box<[Sidedef]> = decode_level_lump(wad, "SIDEDEFS", start, Sidedef::RECORD_SIZE);
		let sectors: Box<[Sector]> = decode_level_lump(wad, "SECTORS", start, Sector::RECORD_SIZE);
		let things: Box<[Thing]> = decode_level_lump(wad, "THINGS", start, Thing::RECORD_SIZE);
		if vertices.is_empty() || linedefs.is_empty() || sidedefs.is_empty() || sectors.is_empty() {
			warn!("level {} is missing required geometry lumps, skipping", info.name);
			continue;
		}
		let player_start = things.iter().copied().find(|thing| thing.thing_type == Thing::PLAYER_START);
		info!(
			"level {}: {} vertices, {} linedefs, {} sidedefs, {} sectors, {} things",
			info.name, vertices.len(), linedefs.len(), sidedefs.len(), sectors.len(), things.len(),
		);
		levels.push(Level {
			name: info.name.as_str().to_owned(),
			vertices,
			linedefs,
			sidedefs,
			sectors,
			things,
			player_start,
			assets: assets.clone(),
		});
	}
	if levels.is_empty() {
		warn!("no level markers found in archive");
	}
	levels
}

#[cfg(test)]
pub(crate) mod test_support {
	use super::*;

	pub fn vertex_bytes(points: &[(i16, i16)]) -> Vec<u8> {
		let mut bytes = Vec::new();
		for &(x, y) in points {
			bytes.extend_from_slice(&x.to_le_bytes());
			bytes.extend_from_slice(&y.to_le_bytes());
		}
		bytes
	}

	//(start, end, right, left); flags/type/tag zero
	pub fn linedef_bytes(lines: &[(u16, u16, u16, u16)]) -> Vec<u8> {
		let mut bytes = Vec::new();
		for &(start, end, right, left) in lines {
			for value in [start, end, 0, 0, 0, right, left] {
				bytes.extend_from_slice(&value.to_le_bytes());
			}
		}
		bytes
	}

	pub fn sidedef_bytes(sides: &[(&str, u16)]) -> Vec<u8> {
		let mut bytes = Vec::new();
		for &(middle, sector) in sides {
			bytes.extend_from_slice(&0i16.to_le_bytes());
			bytes.extend_from_slice(&0i16.to_le_bytes());
			bytes.extend_from_slice(&Name::new("-").0);
			bytes.extend_from_slice(&Name::new("-").0);
			bytes.extend_from_slice(&Name::new(middle).0);
			bytes.extend_from_slice(&sector.to_le_bytes());
		}
		bytes
	}

	pub fn sector_bytes(sectors: &[(i16, i16, &str, &str)]) -> Vec<u8> {
		let mut bytes = Vec::new();
		for &(floor, ceiling, floor_texture, ceiling_texture) in sectors {
			bytes.extend_from_slice(&floor.to_le_bytes());
			bytes.extend_from_slice(&ceiling.to_le_bytes());
			bytes.extend_from_slice(&Name::new(floor_texture).0);
			bytes.extend_from_slice(&Name::new(ceiling_texture).0);
			for value in [160u16, 0, 0] {
				bytes.extend_from_slice(&value.to_le_bytes());
			}
		}
		bytes
	}

	pub fn thing_bytes(things: &[(i16, i16, u16)]) -> Vec<u8> {
		let mut bytes = Vec::new();
		for &(x, y, thing_type) in things {
			bytes.extend_from_slice(&x.to_le_bytes());
			bytes.extend_from_slice(&y.to_le_bytes());
			bytes.extend_from_slice(&0u16.to_le_bytes());
			bytes.extend_from_slice(&thing_type.to_le_bytes());
			bytes.extend_from_slice(&0u16.to_le_bytes());
		}
		bytes
	}

	//unit square: 4 vertices, 4 one-sided linedefs, 1 sector
	pub fn square_level_lumps() -> Vec<(&'static str, Vec<u8>)> {
		let mut lumps: Vec<(&'static str, Vec<u8>)> = Vec::new();
		lumps.push(("THINGS", thing_bytes(&[(32, 32, 1)])));
		lumps.push(("LINEDEFS", linedef_bytes(&[
			(0, 1, 0, 0xFFFF),
			(1, 2, 0, 0xFFFF),
			(2, 3, 0, 0xFFFF),
			(3, 0, 0, 0xFFFF),
		])));
		lumps.push(("SIDEDEFS", sidedef_bytes(&[("STARTAN3", 0)])));
		lumps.push(("VERTEXES", vertex_bytes(&[(0, 0), (0, 64), (64, 64), (64, 0)])));
		lumps.push(("SECTORS", sector_bytes(&[(0, 64, "FLOOR4_8", "CEIL3_5")])));
		lumps
	}
}

#[cfg(test)]
mod tests {
	use super::{test_support::*, *};
	use crate::wad::test_support::build_wad;

	fn wad_with_levels() -> Wad {
		let mut lumps: Vec<(&str, Vec<u8>)> = vec![("E1M1", Vec::new())];
		lumps.extend(square_level_lumps());
		lumps.push(("E1M2", Vec::new()));
		lumps.extend(square_level_lumps());
		Wad::from_bytes(build_wad(b"IWAD", &lumps)).unwrap()
	}

	#[test]
	fn assembles_one_level_per_marker() {
		let levels = wad_with_levels().process();
		assert_eq!(levels.len(), 2);
		assert_eq!(levels[0].name, "E1M1");
		assert_eq!(levels[1].name, "E1M2");
		assert_eq!(levels[0].vertices.len(), 4);
		assert_eq!(levels[0].sectors.len(), 1);
		assert_eq!(levels[0].player_start.map(|thing| thing.thing_type), Some(1));
	}

	#[test]
	fn assets_are_shared_not_copied() {
		let levels = wad_with_levels().process();
		assert!(Arc::ptr_eq(&levels[0].assets, &levels[1].assets));
	}

	#[test]
	fn level_missing_required_lumps_is_skipped() {
		//E1M1 has no geometry of its own; E1M2's lumps must not leak back
		let mut lumps: Vec<(&str, Vec<u8>)> = vec![("E1M1", Vec::new()), ("E1M2", Vec::new())];
		lumps.extend(square_level_lumps());
		let levels = Wad::from_bytes(build_wad(b"IWAD", &lumps)).unwrap().process();
		assert_eq!(levels.len(), 1);
		assert_eq!(levels[0].name, "E1M2");
	}

	#[test]
	fn no_markers_yields_empty_list() {
		let wad = Wad::from_bytes(build_wad(b"PWAD", &[("DATA", vec![0])])).unwrap();
		assert!(wad.process().is_empty());
	}

	#[test]
	fn corrupt_lump_degrades_to_empty() {
		let mut lumps: Vec<(&str, Vec<u8>)> = vec![("MAP01", Vec::new())];
		for (name, mut bytes) in square_level_lumps() {
			if name == "THINGS" {
				bytes.pop();//no longer a multiple of the record size
			}
			lumps.push((name, bytes));
		}
		let levels = Wad::from_bytes(build_wad(b"IWAD", &lumps)).unwrap().process();
		assert_eq!(levels.len(), 1);
		assert!(levels[0].things.is_empty());
		assert_eq!(levels[0].player_start.map(|thing| thing.thing_type), None);
	}

	#[test]
	fn find_level_trims_padding() {
		let levels = wad_with_levels().process();
		let direct = find_level(&levels, "E1M1").unwrap();
		let padded = find_level(&levels, " E1M1 \0").unwrap();
		assert!(std::ptr::eq(direct, padded));
	}

	#[test]
	fn find_level_missing_is_not_found() {
		let levels = wad_with_levels().process();
		assert!(matches!(find_level(&levels, "E9M9"), Err(Error::NotFound(_))));
	}

	#[test]
	fn level_names_by_index() {
		let levels = wad_with_levels().process();
		assert_eq!(level_name_by_index(&levels, 1).unwrap(), "E1M2");
		assert!(matches!(level_name_by_index(&levels, 5), Err(Error::NotFound(_))));
	}
}
