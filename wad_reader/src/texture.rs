//! Texture, patch and palette lumps, and the compositor that turns named
//! references into RGBA rasters.
//!
//! Patches are sparse column-run images; composite textures stack patches at
//! integer offsets against the shared 256-color palette. Flats are dense
//! 64x64 indexed rasters with no transparency.

use std::collections::{BTreeSet, HashMap};
use std::io::Cursor;
use log::warn;
use crate::{level::Level, name::Name, read_boxed_slice, read_list, readable, wad::Wad, Error, Readable, Result};

pub const PALETTE_SIZE: usize = 256;
pub const FLAT_SIZE: usize = 64;
pub const FLAT_PIXELS: usize = FLAT_SIZE * FLAT_SIZE;

/// Gray fill for composite rasters, visible wherever no patch lands.
const PLACEHOLDER_BYTE: u8 = 128;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rgb {
	pub r: u8,
	pub g: u8,
	pub b: u8,
}

readable!(Rgb { r, g, b });

/// The first 256-color table of PLAYPAL. Index 0 conventionally denotes
/// transparency when compositing patches; it is an ordinary color for flats.
pub struct Palette {
	pub colors: Box<[Rgb]>,
}

/// PLAYPAL holds several light-adjusted palettes back to back; only the
/// first is used.
pub fn decode_palette(bytes: &[u8]) -> Result<Palette> {
	if bytes.len() < PALETTE_SIZE * 3 {
		return Err(Error::Format(format!("palette lump holds {} bytes, need {}", bytes.len(), PALETTE_SIZE * 3)));
	}
	let colors = read_boxed_slice(&mut Cursor::new(bytes), PALETTE_SIZE).map_err(Error::Io)?;
	Ok(Palette { colors })
}

/// PNAMES: u32 count, then count 8-byte patch names. Texture definitions
/// refer to patches by index into this table.
pub fn decode_patch_names(bytes: &[u8]) -> Result<Box<[Name]>> {
	read_list::<_, Name, u32>(&mut Cursor::new(bytes))
		.map_err(|_| Error::Format("patch name table truncated".to_owned()))
}

#[derive(Clone, Copy)]
pub struct PatchPlacement {
	/// X offset from the texture's top-left
	pub origin_x: i16,
	/// Y offset from the texture's top-left
	pub origin_y: i16,
	/// Index into the PNAMES table
	pub patch_num: u16,
	pub stepdir: u16,
	pub colormap: u16,
}

readable!(PatchPlacement { origin_x, origin_y, patch_num, stepdir, colormap });

/// A composite raster built by stacking patches at integer offsets.
pub struct TextureDef {
	pub name: Name,
	pub masked: u32,
	pub width: u16,
	pub height: u16,
	pub column_dir: u32,
	pub patches: Box<[PatchPlacement]>,
}

readable!(TextureDef { name, masked, width, height, column_dir, patches });

impl Readable for Box<[PatchPlacement]> {
	fn read<R: std::io::Read>(reader: &mut R) -> std::io::Result<Self> {
		read_list::<_, PatchPlacement, u16>(reader)
	}
}

/// TEXTURE1/TEXTURE2: u32 count, count u32 offsets relative to lump start,
/// each pointing at a texture record. A record with an out-of-range offset is
/// skipped with a warning; a truncated offset table fails the lump.
pub fn decode_texture_defs(bytes: &[u8]) -> Result<Vec<TextureDef>> {
	let offsets: Box<[u32]> = read_list::<_, u32, u32>(&mut Cursor::new(bytes))
		.map_err(|_| Error::Format("texture definition table truncated".to_owned()))?;
	let mut defs = Vec::with_capacity(offsets.len());
	for &offset in offsets.iter() {
		let offset = offset as usize;
		if offset >= bytes.len() {
			warn!("texture definition offset {} outside lump of {} bytes, skipping", offset, bytes.len());
			continue;
		}
		match TextureDef::read(&mut Cursor::new(&bytes[offset..])) {
			Ok(def) => defs.push(def),
			Err(_) => warn!("truncated texture definition at offset {}, skipping", offset),
		}
	}
	Ok(defs)
}

/// A patch decoded to a dense `width * height` raster of palette indices.
/// Index 0 marks pixels no run covered; they stay transparent when
/// compositing. An empty raster stands in for a patch that failed to decode,
/// keeping PNAMES indices aligned.
pub struct Patch {
	pub name: Name,
	pub width: u16,
	pub height: u16,
	pub pixels: Box<[u8]>,
}

impl Patch {
	pub fn missing(name: Name) -> Self {
		Self { name, width: 0, height: 0, pixels: Box::new([]) }
	}

	pub fn is_empty(&self) -> bool {
		self.pixels.is_empty()
	}
}

/// Decodes the column-run patch format: a fixed header, `width` column
/// offsets, then per column a run list of (top delta, length, pad, pixels,
/// pad) terminated by a 0xFF delta. Every derived destination index is
/// bounds-checked; out-of-range pixels are dropped, not fatal.
pub fn decode_patch(name: Name, bytes: &[u8]) -> Result<Patch> {
	let mut cursor = Cursor::new(bytes);
	let truncated = |_| Error::Format(format!("patch {} truncated", name));
	let width = i16::read(&mut cursor).map_err(truncated)?;
	let height = i16::read(&mut cursor).map_err(truncated)?;
	let _left_offset = i16::read(&mut cursor).map_err(truncated)?;
	let _top_offset = i16::read(&mut cursor).map_err(truncated)?;
	if width <= 0 || height <= 0 {
		return Err(Error::Format(format!("patch {} has invalid dimensions {}x{}", name, width, height)));
	}
	let width = width as usize;
	let height = height as usize;
	let column_offsets: Box<[u32]> = read_boxed_slice(&mut cursor, width).map_err(truncated)?;
	let mut pixels = vec![0u8; width * height].into_boxed_slice();
	for (x, &column_offset) in column_offsets.iter().enumerate() {
		let mut offset = column_offset as usize;
		loop {
			let Some(&top_delta) = bytes.get(offset) else { break };
			if top_delta == 0xFF {
				break;
			}
			let Some(&run_length) = bytes.get(offset + 1) else { break };
			let run_length = run_length as usize;
			//one pad byte before the run and one after
			let Some(run) = bytes.get(offset + 3..offset + 3 + run_length) else { break };
			for (i, &index) in run.iter().enumerate() {
				let y = top_delta as usize + i;
				if y < height {
					pixels[y * width + x] = index;
				}
			}
			offset += run_length + 4;
		}
	}
	Ok(Patch { name, width: width as u16, height: height as u16, pixels })
}

/// One RGBA image ready for upload, 4 bytes per pixel, row-major.
pub struct TextureRaster {
	pub width: u32,
	pub height: u32,
	pub data: Box<[u8]>,
}

/// Name-to-raster cache. A name already present is never rebuilt, so every
/// repeated reference across sidedefs and sectors shares one raster.
#[derive(Default)]
pub struct TextureBank {
	rasters: HashMap<String, TextureRaster>,
}

impl TextureBank {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn get(&self, name: &str) -> Option<&TextureRaster> {
		self.rasters.get(name)
	}

	pub fn len(&self) -> usize {
		self.rasters.len()
	}

	pub fn is_empty(&self) -> bool {
		self.rasters.is_empty()
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, &TextureRaster)> {
		self.rasters.iter().map(|(name, raster)| (name.as_str(), raster))
	}

	/// Builds a 64x64 floor/ceiling raster. Flats carry no transparency:
	/// every index maps through the palette at full opacity, index 0
	/// included.
	pub fn build_flat(&mut self, name: &str, pixels: &[u8], palette: &Palette) {
		if self.rasters.contains_key(name) {
			return;
		}
		if pixels.len() != FLAT_PIXELS {
			warn!("flat {} holds {} bytes, expected {}, not building", name, pixels.len(), FLAT_PIXELS);
			return;
		}
		let mut data = vec![0u8; FLAT_PIXELS * 4].into_boxed_slice();
		for (i, &index) in pixels.iter().enumerate() {
			let Rgb { r, g, b } = palette.colors[index as usize];
			data[i * 4..i * 4 + 4].copy_from_slice(&[r, g, b, 255]);
		}
		self.rasters.insert(
			name.to_owned(),
			TextureRaster { width: FLAT_SIZE as u32, height: FLAT_SIZE as u32, data },
		);
	}

	/// Composites a texture definition's patches into one raster. Bad patch
	/// references are skipped; the texture is only created when at least one
	/// patch landed, so a fully-placeholder raster is never emitted.
	pub fn build_from_definition(&mut self, def: &TextureDef, patches: &[Patch], palette: &Palette) {
		let name = def.name.as_str();
		if self.rasters.contains_key(name) {
			return;
		}
		if def.width == 0 || def.height == 0 {
			warn!("texture {} has invalid dimensions {}x{}, not building", name, def.width, def.height);
			return;
		}
		let width = def.width as usize;
		let height = def.height as usize;
		let mut data = vec![PLACEHOLDER_BYTE; width * height * 4].into_boxed_slice();
		let mut composited = 0usize;
		for placement in def.patches.iter() {
			let Some(patch) = patches.get(placement.patch_num as usize) else {
				warn!("texture {} references patch {} outside the patch table, skipping", name, placement.patch_num);
				continue;
			};
			if patch.is_empty() {
				warn!("texture {} references empty patch {}, skipping", name, patch.name);
				continue;
			}
			composite_patch(&mut data, width, height, patch, placement.origin_x as i32, placement.origin_y as i32, palette);
			composited += 1;
		}
		if composited == 0 {
			warn!("no valid patches for texture {}, not building", name);
			return;
		}
		self.rasters.insert(
			name.to_owned(),
			TextureRaster { width: def.width as u32, height: def.height as u32, data },
		);
	}
}

//index 0 is transparent; out-of-range pixels are dropped
fn composite_patch(data: &mut [u8], width: usize, height: usize, patch: &Patch, origin_x: i32, origin_y: i32, palette: &Palette) {
	for y in 0..patch.height as i32 {
		let dest_y = origin_y + y;
		if dest_y < 0 || dest_y >= height as i32 {
			continue;
		}
		for x in 0..patch.width as i32 {
			let dest_x = origin_x + x;
			if dest_x < 0 || dest_x >= width as i32 {
				continue;
			}
			let index = patch.pixels[y as usize * patch.width as usize + x as usize];
			if index == 0 {
				continue;
			}
			let Rgb { r, g, b } = palette.colors[index as usize];
			let dest = (dest_y as usize * width + dest_x as usize) * 4;
			data[dest..dest + 4].copy_from_slice(&[r, g, b, 255]);
		}
	}
}

/// Builds every raster one level references: flats named by its sectors,
/// fetched as archive-global lumps, and composite textures named by its
/// sidedefs. A name already built is never rebuilt, so flats win over a
/// definition with the same name. Missing names degrade to warnings.
pub fn build_level_textures(wad: &Wad, level: &Level) -> TextureBank {
	let mut bank = TextureBank::new();
	let Some(palette) = level.assets.palette.as_ref() else {
		warn!("no palette decoded, textures unavailable for {}", level.name);
		return bank;
	};
	let flat_names: BTreeSet<&str> = level.sectors.iter()
		.flat_map(|sector| [&sector.floor_texture, &sector.ceiling_texture])
		.filter(|name| !name.is_placeholder())
		.map(Name::as_str)
		.collect();
	let wall_names: BTreeSet<&str> = level.sidedefs.iter()
		.flat_map(|sidedef| [&sidedef.upper_texture, &sidedef.lower_texture, &sidedef.middle_texture])
		.filter(|name| !name.is_placeholder())
		.map(Name::as_str)
		.collect();
	for &name in &flat_names {
		if let Some(bytes) = wad.global_lump_bytes(name) {
			bank.build_flat(name, bytes, palette);
		}
	}
	for def in level.assets.texture_defs.iter() {
		let def_name = def.name.as_str();
		if wall_names.contains(def_name) || flat_names.contains(def_name) {
			bank.build_from_definition(def, &level.assets.patches, palette);
		}
	}
	for name in wall_names {
		if bank.get(name).is_none() {
			warn!("no texture definition or flat lump matches {}", name);
		}
	}
	bank
}
