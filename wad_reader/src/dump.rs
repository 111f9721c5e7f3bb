//! Text exports of a decoded level: pretty JSON, a compact JSON variant with
//! single-letter keys and one record per line, and a plain listing format.

use std::fmt::Write;
use nonmax::NonMaxU16;
use serde_json::{json, Value};
use crate::{level::Level, model::Thing, Error, Result};

/// Absent sidedef references serialize as the on-disk sentinel.
fn side_index(side: Option<NonMaxU16>) -> u16 {
	side.map_or(u16::MAX, |side| side.get())
}

/// Full-name JSON with indentation, one object per record.
pub fn to_json_verbose(level: &Level) -> Result<String> {
	let value = json!({
		"vertices": level.vertices.iter()
			.map(|vertex| json!({ "x": vertex.x, "y": vertex.y }))
			.collect::<Vec<_>>(),
		"linedefs": level.linedefs.iter()
			.map(|linedef| json!({
				"start": linedef.start_vertex,
				"end": linedef.end_vertex,
				"flags": linedef.flags.0,
				"type": linedef.line_type,
				"tag": linedef.sector_tag,
				"right_sidedef": side_index(linedef.right_sidedef),
				"left_sidedef": side_index(linedef.left_sidedef),
			}))
			.collect::<Vec<_>>(),
		"sidedefs": level.sidedefs.iter()
			.map(|sidedef| json!({
				"x_offset": sidedef.x_offset,
				"y_offset": sidedef.y_offset,
				"upper_texture": sidedef.upper_texture.as_str(),
				"lower_texture": sidedef.lower_texture.as_str(),
				"middle_texture": sidedef.middle_texture.as_str(),
				"sector": sidedef.sector,
			}))
			.collect::<Vec<_>>(),
		"sectors": level.sectors.iter()
			.map(|sector| json!({
				"floor_height": sector.floor_height,
				"ceiling_height": sector.ceiling_height,
				"floor_texture": sector.floor_texture.as_str(),
				"ceiling_texture": sector.ceiling_texture.as_str(),
				"light_level": sector.light_level,
				"type": sector.sector_type,
				"tag": sector.tag,
			}))
			.collect::<Vec<_>>(),
		"things": level.things.iter()
			.map(|thing| json!({
				"x": thing.x,
				"y": thing.y,
				"angle": thing.angle,
				"type": thing.thing_type,
				"flags": thing.flags,
			}))
			.collect::<Vec<_>>(),
	});
	serde_json::to_string_pretty(&value).map_err(|error| Error::Format(error.to_string()))
}

/// Compact JSON: single-letter keys and each record on its own line, so the
/// file stays diffable without the verbose format's size.
pub fn to_json(level: &Level) -> Result<String> {
	let sections: [(&str, Vec<Value>); 5] = [
		(
			"v",
			level.vertices.iter()
				.map(|vertex| json!({ "x": vertex.x, "y": vertex.y }))
				.collect(),
		),
		(
			"l",
			level.linedefs.iter()
				.map(|linedef| json!({
					"s": linedef.start_vertex,
					"e": linedef.end_vertex,
					"f": linedef.flags.0,
					"t": linedef.line_type,
					"g": linedef.sector_tag,
					"r": side_index(linedef.right_sidedef),
					"l": side_index(linedef.left_sidedef),
				}))
				.collect(),
		),
		(
			"si",
			level.sidedefs.iter()
				.map(|sidedef| json!({
					"x": sidedef.x_offset,
					"y": sidedef.y_offset,
					"u": sidedef.upper_texture.as_str(),
					"l": sidedef.lower_texture.as_str(),
					"m": sidedef.middle_texture.as_str(),
					"s": sidedef.sector,
				}))
				.collect(),
		),
		(
			"se",
			level.sectors.iter()
				.map(|sector| json!({
					"f": sector.floor_height,
					"c": sector.ceiling_height,
					"t": sector.floor_texture.as_str(),
					"x": sector.ceiling_texture.as_str(),
					"l": sector.light_level,
					"y": sector.sector_type,
					"g": sector.tag,
				}))
				.collect(),
		),
		(
			"t",
			level.things.iter()
				.map(|thing| json!({
					"x": thing.x,
					"y": thing.y,
					"a": thing.angle,
					"t": thing.thing_type,
					"f": thing.flags,
				}))
				.collect(),
		),
	];
	let num_sections = sections.len();
	let mut out = String::from("{\n");
	for (section_index, (key, records)) in sections.into_iter().enumerate() {
		let _ = write!(out, " \"{key}\": [\n");
		let num_records = records.len();
		for (record_index, record) in records.into_iter().enumerate() {
			out.push_str("  ");
			out.push_str(&serde_json::to_string(&record).map_err(|error| Error::Format(error.to_string()))?);
			out.push_str(if record_index + 1 < num_records { ",\n" } else { "\n" });
		}
		out.push_str(" ]");
		out.push_str(if section_index + 1 < num_sections { ",\n" } else { "\n" });
	}
	out.push_str("}\n");
	Ok(out)
}

/// Plain listing: vertices, linedefs, sectors, and things in reading order,
/// with the player start called out by name.
pub fn to_dsl(level: &Level) -> String {
	let mut out = String::from("LEVEL START\n");
	out.push_str("VERTICES:\n");
	for vertex in level.vertices.iter() {
		let _ = writeln!(out, "({}, {})", vertex.x, vertex.y);
	}
	out.push_str("\nLINEDEFS:\n");
	for linedef in level.linedefs.iter() {
		let _ = writeln!(
			out,
			"{} -> {} | flags: {} | type: {} | tag: {} | right: {} | left: {}",
			linedef.start_vertex, linedef.end_vertex, linedef.flags.0, linedef.line_type,
			linedef.sector_tag, side_index(linedef.right_sidedef), side_index(linedef.left_sidedef),
		);
	}
	out.push_str("\nSECTORS:\n");
	for sector in level.sectors.iter() {
		let _ = writeln!(
			out,
			"floor: {} | ceil: {} | light: {} | floor_tex: {} | ceil_tex: {}",
			sector.floor_height, sector.ceiling_height, sector.light_level,
			sector.floor_texture.as_str(), sector.ceiling_texture.as_str(),
		);
	}
	out.push_str("\nTHINGS:\n");
	for thing in level.things.iter() {
		let label = if thing.thing_type == Thing::PLAYER_START { "PlayerStart" } else { "Thing" };
		let _ = writeln!(
			out,
			"{} at ({}, {}) | angle: {} | type: {}",
			label, thing.x, thing.y, thing.angle, thing.thing_type,
		);
	}
	out.push_str("\nLEVEL END\n");
	out
}

#[cfg(test)]
mod tests {
	use std::sync::Arc;
	use super::*;
	use crate::level::SharedAssets;
	use crate::model::{Linedef, LinedefFlags, Sector, Sidedef, Vertex};
	use crate::name::Name;

	fn sample_level() -> Level {
		Level {
			name: "MAP01".to_owned(),
			vertices: Box::new([Vertex { x: 0, y: 0 }, Vertex { x: 64, y: -32 }]),
			linedefs: Box::new([Linedef {
				start_vertex: 0,
				end_vertex: 1,
				flags: LinedefFlags(1),
				line_type: 0,
				sector_tag: 0,
				right_sidedef: NonMaxU16::new(0),
				left_sidedef: None,
			}]),
			sidedefs: Box::new([Sidedef {
				x_offset: 0,
				y_offset: 8,
				upper_texture: Name::new("-"),
				lower_texture: Name::new("-"),
				middle_texture: Name::new("STARTAN3"),
				sector: 0,
			}]),
			sectors: Box::new([Sector {
				floor_height: 0,
				ceiling_height: 128,
				floor_texture: Name::new("FLOOR4_8"),
				ceiling_texture: Name::new("CEIL3_5"),
				light_level: 160,
				sector_type: 0,
				tag: 0,
			}]),
			things: Box::new([
				Thing { x: 32, y: 32, angle: 90, thing_type: 1, flags: 7 },
				Thing { x: 48, y: 16, angle: 0, thing_type: 2001, flags: 7 },
			]),
			player_start: Some(Thing { x: 32, y: 32, angle: 90, thing_type: 1, flags: 7 }),
			assets: Arc::new(SharedAssets::default()),
		}
	}

	#[test]
	fn verbose_json_round_trips_through_serde() {
		let text = to_json_verbose(&sample_level()).unwrap();
		let value: Value = serde_json::from_str(&text).unwrap();
		assert_eq!(value["vertices"].as_array().unwrap().len(), 2);
		assert_eq!(value["vertices"][1]["y"], -32);
		//absent left side keeps the on-disk sentinel
		assert_eq!(value["linedefs"][0]["left_sidedef"], 65535);
		assert_eq!(value["sidedefs"][0]["middle_texture"], "STARTAN3");
		assert_eq!(value["sectors"][0]["ceiling_height"], 128);
		assert_eq!(value["things"].as_array().unwrap().len(), 2);
	}

	#[test]
	fn compact_json_is_valid_and_uses_short_keys() {
		let text = to_json(&sample_level()).unwrap();
		let value: Value = serde_json::from_str(&text).unwrap();
		assert_eq!(value["v"].as_array().unwrap().len(), 2);
		assert_eq!(value["l"][0]["r"], 0);
		assert_eq!(value["l"][0]["l"], 65535);
		assert_eq!(value["si"][0]["m"], "STARTAN3");
		assert_eq!(value["se"][0]["c"], 128);
		assert_eq!(value["t"][1]["t"], 2001);
		//one record per line inside each section
		assert!(text.contains(" \"v\": [\n"));
	}

	#[test]
	fn listing_labels_the_player_start() {
		let text = to_dsl(&sample_level());
		assert!(text.starts_with("LEVEL START\n"));
		assert!(text.ends_with("LEVEL END\n"));
		assert!(text.contains("(64, -32)"));
		assert!(text.contains("0 -> 1 | flags: 1"));
		assert!(text.contains("| right: 0 | left: 65535"));
		assert!(text.contains("PlayerStart at (32, 32) | angle: 90 | type: 1"));
		assert!(text.contains("Thing at (48, 16)"));
	}
}
