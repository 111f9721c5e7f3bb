use std::fmt;
use std::io::{Read, Result};
use crate::Readable;

pub const NAME_LEN: usize = 8;

/// Fixed 8-byte lump name, space or NUL padded, not necessarily terminated.
/// Comparisons go through [`Name::as_str`], which trims the padding; the raw
/// bytes are never compared directly.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Name(pub [u8; NAME_LEN]);

impl Name {
	/// Longer inputs are truncated to the on-disk 8 bytes.
	pub fn new(s: &str) -> Self {
		let mut bytes = [0; NAME_LEN];
		let len = s.len().min(NAME_LEN);
		bytes[..len].copy_from_slice(&s.as_bytes()[..len]);
		Self(bytes)
	}

	/// The name with trailing NULs and spaces removed. Non-ASCII garbage in a
	/// corrupt directory yields the empty string, which matches nothing.
	pub fn as_str(&self) -> &str {
		let end = self.0.iter().position(|&b| b == 0 || b == b' ').unwrap_or(NAME_LEN);
		std::str::from_utf8(&self.0[..end]).unwrap_or("")
	}

	/// "" and "-" both denote "no texture" in sidedef and sector fields.
	pub fn is_placeholder(&self) -> bool {
		matches!(self.as_str(), "" | "-")
	}

	/// Level boundary grammar: `E<digit>M<digit>` (episode/mission) or
	/// `MAP<digit><digit>` (numbered map). Markers delimit the per-level
	/// record block; they carry no data themselves.
	pub fn is_level_marker(&self) -> bool {
		match self.as_str().as_bytes() {
			[b'E', e, b'M', m] => e.is_ascii_digit() && m.is_ascii_digit(),
			[b'M', b'A', b'P', a, b] => a.is_ascii_digit() && b.is_ascii_digit(),
			_ => false,
		}
	}
}

impl Readable for Name {
	fn read<R: Read>(reader: &mut R) -> Result<Self> {
		Ok(Self(<[u8; NAME_LEN]>::read(reader)?))
	}
}

impl fmt::Display for Name {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl fmt::Debug for Name {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(f, "Name({:?})", self.as_str())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn trims_trailing_padding() {
		assert_eq!(Name(*b"E1M1\0\0\0\0").as_str(), "E1M1");
		assert_eq!(Name(*b"FLOOR4_8").as_str(), "FLOOR4_8");
		assert_eq!(Name(*b"DOOR  \0\0").as_str(), "DOOR");
	}

	#[test]
	fn new_truncates_long_input() {
		assert_eq!(Name::new("TOOLONGNAME").as_str(), "TOOLONGN");
		assert_eq!(Name::new("").as_str(), "");
	}

	#[test]
	fn placeholder_names() {
		assert!(Name(*b"-\0\0\0\0\0\0\0").is_placeholder());
		assert!(Name([0; 8]).is_placeholder());
		assert!(!Name(*b"STARTAN3").is_placeholder());
	}

	#[test]
	fn level_marker_grammar() {
		assert!(Name(*b"E1M1\0\0\0\0").is_level_marker());
		assert!(Name(*b"E4M9\0\0\0\0").is_level_marker());
		assert!(Name(*b"MAP01\0\0\0").is_level_marker());
		assert!(Name(*b"MAP32\0\0\0").is_level_marker());
		assert!(!Name(*b"E1M\0\0\0\0\0").is_level_marker());
		assert!(!Name(*b"MAP1\0\0\0\0").is_level_marker());
		assert!(!Name(*b"MAPEL\0\0\0").is_level_marker());
		assert!(!Name(*b"VERTEXES").is_level_marker());
		//data lumps that merely resemble the grammar must not split a level
		assert!(!Name(*b"E1M1X\0\0\0").is_level_marker());
	}
}
