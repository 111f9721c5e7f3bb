//! Fixed-layout map records: the five geometry lump kinds that follow each
//! level marker. All records are value types with no back-references into the
//! archive buffer.

use std::io::Cursor;
use bitfield::bitfield;
use nonmax::NonMaxU16;
use crate::{name::Name, read_boxed_slice, readable, Error, Readable, Result};

/// Decodes a whole lump as `len / record_size` fixed-size records.
///
/// A length that is not a multiple of the record size means the lump is
/// truncated or corrupt; per policy that fails the lump as a whole rather
/// than yielding a partial array.
pub fn decode_records<T: Readable>(bytes: &[u8], record_size: usize, what: &str) -> Result<Box<[T]>> {
	if bytes.len() % record_size != 0 {
		return Err(Error::Format(format!(
			"{} lump length {} is not a multiple of record size {}",
			what, bytes.len(), record_size,
		)));
	}
	read_boxed_slice(&mut Cursor::new(bytes), bytes.len() / record_size).map_err(Error::Io)
}

/// Signed 2D map coordinate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Vertex {
	pub x: i16,
	pub y: i16,
}

impl Vertex {
	pub const RECORD_SIZE: usize = 4;
}

readable!(Vertex { x, y });

bitfield! {
	#[derive(Clone, Copy)]
	pub struct LinedefFlags(u16);
	pub blocking, _: 0;
	pub block_monsters, _: 1;
	pub two_sided, _: 2;
	pub upper_unpegged, _: 3;
	pub lower_unpegged, _: 4;
	pub secret, _: 5;
}

impl Readable for LinedefFlags {
	fn read<R: std::io::Read>(reader: &mut R) -> std::io::Result<Self> {
		Ok(Self(u16::read(reader)?))
	}
}

/// Directed 2D line segment bounding one or two sectors. The right side is
/// present for every valid linedef; a missing left side means the line
/// borders empty space (one-sided).
#[derive(Clone, Copy)]
pub struct Linedef {
	/// Index into VERTEXES
	pub start_vertex: u16,
	/// Index into VERTEXES
	pub end_vertex: u16,
	pub flags: LinedefFlags,
	pub line_type: u16,
	pub sector_tag: u16,
	/// Index into SIDEDEFS
	pub right_sidedef: Option<NonMaxU16>,
	/// Index into SIDEDEFS
	pub left_sidedef: Option<NonMaxU16>,
}

impl Linedef {
	pub const RECORD_SIZE: usize = 14;
}

readable!(Linedef { start_vertex, end_vertex, flags, line_type, sector_tag, right_sidedef, left_sidedef });

/// Per-line, per-facing texture references. Any of the three names may be the
/// "no texture" placeholder.
#[derive(Clone, Copy)]
pub struct Sidedef {
	/// Texel offset applied to wall texture U
	pub x_offset: i16,
	/// Texel offset applied to wall texture V
	pub y_offset: i16,
	pub upper_texture: Name,
	pub lower_texture: Name,
	pub middle_texture: Name,
	/// Index into SECTORS
	pub sector: u16,
}

impl Sidedef {
	pub const RECORD_SIZE: usize = 30;
}

readable!(Sidedef { x_offset, y_offset, upper_texture, lower_texture, middle_texture, sector });

/// An enclosed 2D region; its boundary is the union of linedefs referencing
/// it through sidedefs.
#[derive(Clone, Copy)]
pub struct Sector {
	/// Map units
	pub floor_height: i16,
	/// Map units
	pub ceiling_height: i16,
	pub floor_texture: Name,
	pub ceiling_texture: Name,
	pub light_level: u16,
	pub sector_type: u16,
	pub tag: u16,
}

impl Sector {
	pub const RECORD_SIZE: usize = 26;
}

readable!(Sector { floor_height, ceiling_height, floor_texture, ceiling_texture, light_level, sector_type, tag });

/// Map object placement. Type 1 is the player 1 start.
#[derive(Clone, Copy)]
pub struct Thing {
	pub x: i16,
	pub y: i16,
	/// Degrees, 0 = east
	pub angle: u16,
	pub thing_type: u16,
	pub flags: u16,
}

impl Thing {
	pub const RECORD_SIZE: usize = 10;
	pub const PLAYER_START: u16 = 1;
}

readable!(Thing { x, y, angle, thing_type, flags });
