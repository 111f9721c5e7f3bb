//! Renderable geometry derived from the 2D sector graph: vertical wall quads
//! where neighboring heights differ, and floor/ceiling fans per sector, all
//! batched by texture name.

use std::collections::BTreeMap;
use glam::{vec2, vec3, Vec2, Vec3};
use itertools::{Itertools, MinMaxResult};
use log::warn;
use crate::{level::Level, model::{Sidedef, Vertex}, name::Name};

pub const WALL_TEXTURE_WIDTH: f32 = 64.0;
pub const WALL_TEXTURE_HEIGHT: f32 = 128.0;
pub const FLAT_TEXTURE_SIZE: f32 = 64.0;
/// Camera height above the enclosing sector's floor.
pub const PLAYER_EYE_HEIGHT: f32 = 41.0;

/// Interleaved vertex layout handed to the renderer unchanged.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TexturedVertex {
	pub pos: Vec3,
	pub uv: Vec2,
}

/// Growing vertex/index pair for one texture name; the unit of render
/// batching. All geometry sharing a texture accumulates into one group.
#[derive(Default)]
pub struct GeometryGroup {
	pub vertices: Vec<TexturedVertex>,
	pub indices: Vec<u32>,
}

/// Recentering frame for one level, computed once from the vertex bounds and
/// passed explicitly into every conversion so geometry cannot depend on
/// build order.
#[derive(Clone, Copy, Debug)]
pub struct LevelFrame {
	pub center: Vec2,
	pub scale: f32,
}

impl LevelFrame {
	pub fn new(vertices: &[Vertex]) -> Self {
		let center_of = |values: MinMaxResult<i16>| match values {
			MinMaxResult::NoElements => 0.0,
			MinMaxResult::OneElement(value) => value as f32,
			MinMaxResult::MinMax(min, max) => (min as f32 + max as f32) / 2.0,
		};
		let center = vec2(
			center_of(vertices.iter().map(|vertex| vertex.x).minmax()),
			center_of(vertices.iter().map(|vertex| vertex.y).minmax()),
		);
		Self { center, scale: 1.0 }
	}

	/// Map position to world space: recentered X, height up, and map Y
	/// negated into depth to keep the winding convention consistent.
	pub fn to_world(&self, x: f32, y: f32, height: f32) -> Vec3 {
		vec3(
			(x - self.center.x) * self.scale,
			height * self.scale,
			-(y - self.center.y) * self.scale,
		)
	}
}

/// Derives all wall and floor/ceiling geometry for one level, grouped by
/// texture name. Records with out-of-range references are skipped with a
/// warning, never fatal.
pub fn build_level_geometry(level: &Level, frame: &LevelFrame) -> BTreeMap<String, GeometryGroup> {
	let mut groups = BTreeMap::new();
	let mut sector_vertices: Vec<Vec<u16>> = vec![Vec::new(); level.sectors.len()];
	for linedef in level.linedefs.iter() {
		let (Some(start), Some(end)) = (
			level.vertices.get(linedef.start_vertex as usize),
			level.vertices.get(linedef.end_vertex as usize),
		) else {
			warn!(
				"linedef references vertex {} or {} outside {} vertices, skipping",
				linedef.start_vertex, linedef.end_vertex, level.vertices.len(),
			);
			continue;
		};
		let Some(right_side) = level.sidedef(linedef.right_sidedef) else {
			continue;
		};
		let Some(right_sector) = level.sector_of(right_side) else {
			warn!("sidedef references sector {} outside {} sectors, skipping", right_side.sector, level.sectors.len());
			continue;
		};
		sector_vertices[right_side.sector as usize].push(linedef.start_vertex);
		sector_vertices[right_side.sector as usize].push(linedef.end_vertex);
		match linedef.left_sidedef {
			//one-sided: full floor-to-ceiling wall facing empty space
			None => add_wall(
				&mut groups, frame, &right_side.middle_texture, start, end,
				right_sector.floor_height as f32, right_sector.ceiling_height as f32, right_side,
			),
			Some(_) => {
				let Some(left_sector) = level.sidedef(linedef.left_sidedef).and_then(|side| level.sector_of(side)) else {
					warn!("two-sided linedef's left side does not resolve to a sector, skipping walls");
					continue;
				};
				if left_sector.ceiling_height > right_sector.ceiling_height {
					add_wall(
						&mut groups, frame, &right_side.upper_texture, start, end,
						right_sector.ceiling_height as f32, left_sector.ceiling_height as f32, right_side,
					);
				}
				if right_sector.floor_height > left_sector.floor_height {
					add_wall(
						&mut groups, frame, &right_side.lower_texture, start, end,
						left_sector.floor_height as f32, right_sector.floor_height as f32, right_side,
					);
				}
				//middle spans the vertical overlap of the two sectors, which
				//collapses to nothing when they do not overlap
				let bottom = left_sector.floor_height.max(right_sector.floor_height) as f32;
				let top = left_sector.ceiling_height.min(right_sector.ceiling_height) as f32;
				add_wall(&mut groups, frame, &right_side.middle_texture, start, end, bottom, top, right_side);
			}
		}
	}
	for (sector_index, sector) in level.sectors.iter().enumerate() {
		let corners = sector_vertices[sector_index]
			.iter()
			.copied()
			.sorted_unstable()
			.dedup()
			.collect::<Vec<_>>();
		if corners.len() < 3 {
			//degenerate boundary, no surface to triangulate
			continue;
		}
		add_flat(&mut groups, frame, level, &sector.floor_texture, &corners, sector.floor_height as f32, true);
		add_flat(&mut groups, frame, level, &sector.ceiling_texture, &corners, sector.ceiling_height as f32, false);
	}
	groups.retain(|_, group| !group.vertices.is_empty() && !group.indices.is_empty());
	groups
}

//placeholder textures and non-positive heights emit nothing
fn add_wall(
	groups: &mut BTreeMap<String, GeometryGroup>,
	frame: &LevelFrame,
	texture: &Name,
	start: &Vertex,
	end: &Vertex,
	bottom: f32,
	top: f32,
	sidedef: &Sidedef,
) {
	if texture.is_placeholder() || top <= bottom {
		return;
	}
	let group = groups.entry(texture.as_str().to_owned()).or_default();
	let height = top - bottom;
	//U repeats with the unscaled wall length; V follows the sidedef's texel offsets
	let length = vec2(end.x as f32 - start.x as f32, end.y as f32 - start.y as f32).length();
	let u1 = sidedef.x_offset as f32 / WALL_TEXTURE_WIDTH;
	let u2 = u1 + length / WALL_TEXTURE_WIDTH;
	let v1 = sidedef.y_offset as f32 / WALL_TEXTURE_HEIGHT;
	let v2 = v1 + height / WALL_TEXTURE_HEIGHT;
	let base = group.vertices.len() as u32;
	group.vertices.push(TexturedVertex { pos: frame.to_world(start.x as f32, start.y as f32, bottom), uv: vec2(u1, v1) });
	group.vertices.push(TexturedVertex { pos: frame.to_world(start.x as f32, start.y as f32, top), uv: vec2(u1, v2) });
	group.vertices.push(TexturedVertex { pos: frame.to_world(end.x as f32, end.y as f32, bottom), uv: vec2(u2, v1) });
	group.vertices.push(TexturedVertex { pos: frame.to_world(end.x as f32, end.y as f32, top), uv: vec2(u2, v2) });
	group.indices.extend_from_slice(&[base, base + 1, base + 2, base + 1, base + 3, base + 2]);
}

//fan from the first vertex; assumes the boundary is star-shaped from there
fn add_flat(
	groups: &mut BTreeMap<String, GeometryGroup>,
	frame: &LevelFrame,
	level: &Level,
	texture: &Name,
	corners: &[u16],
	height: f32,
	is_floor: bool,
) {
	if texture.is_placeholder() {
		return;
	}
	let group = groups.entry(texture.as_str().to_owned()).or_default();
	let base = group.vertices.len() as u32;
	//flat UVs tile from the sector's own minimum corner
	let min_x = corners.iter().map(|&index| level.vertices[index as usize].x).min().unwrap_or(0) as f32;
	let min_y = corners.iter().map(|&index| level.vertices[index as usize].y).min().unwrap_or(0) as f32;
	for &index in corners {
		let vertex = &level.vertices[index as usize];
		let u = ((vertex.x as f32 - min_x) / FLAT_TEXTURE_SIZE).rem_euclid(1.0);
		let v = ((vertex.y as f32 - min_y) / FLAT_TEXTURE_SIZE).rem_euclid(1.0);
		let v = if is_floor { v } else { 1.0 - v };
		group.vertices.push(TexturedVertex { pos: frame.to_world(vertex.x as f32, vertex.y as f32, height), uv: vec2(u, v) });
	}
	for i in 1..corners.len() as u32 - 1 {
		if is_floor {
			group.indices.extend_from_slice(&[base, base + i, base + i + 1]);
		} else {
			//ceiling normals face down: reverse winding
			group.indices.extend_from_slice(&[base, base + i + 1, base + i]);
		}
	}
}

/// Camera spawn position: the player-start thing lifted to its sector's
/// floor plus eye height. The enclosing sector comes from a single-edge
/// half-plane test (the right side of a directed linedef is the negative
/// cross-product half-plane); points near concave boundaries may
/// misclassify. Preserved as a documented approximation.
pub fn player_start_position(level: &Level, frame: &LevelFrame) -> Option<Vec3> {
	let start = level.player_start?;
	let point = vec2(start.x as f32, start.y as f32);
	let mut floor_height = 0.0;
	for linedef in level.linedefs.iter() {
		let Some(sector) = level.sidedef(linedef.right_sidedef).and_then(|side| level.sector_of(side)) else {
			continue;
		};
		let (Some(v1), Some(v2)) = (
			level.vertices.get(linedef.start_vertex as usize),
			level.vertices.get(linedef.end_vertex as usize),
		) else {
			continue;
		};
		let edge = vec2(v2.x as f32 - v1.x as f32, v2.y as f32 - v1.y as f32);
		let to_point = point - vec2(v1.x as f32, v1.y as f32);
		if edge.perp_dot(to_point) < 0.0 {
			floor_height = sector.floor_height as f32;
			break;
		}
	}
	Some(frame.to_world(point.x, point.y, floor_height + PLAYER_EYE_HEIGHT))
}
