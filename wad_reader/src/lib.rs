pub mod dump;
pub mod geom;
pub mod level;
pub mod model;
pub mod texture;
pub mod wad;

mod error;
mod impls;
mod name;

pub use error::Error;
pub use level::Level;
pub use name::Name;
pub use wad::Wad;

pub type Result<T> = std::result::Result<T, Error>;

use std::io::Read;
use num_traits::AsPrimitive;

/// Fixed-layout little-endian decoding, field by field in declaration order.
pub(crate) trait Readable: Sized {
	fn read<R: Read>(reader: &mut R) -> std::io::Result<Self>;
}

/// Implements `Readable` for a struct by reading each named field in order.
macro_rules! readable {
	($type:ty { $($field:ident),* $(,)? }) => {
		impl $crate::Readable for $type {
			fn read<R: ::std::io::Read>(reader: &mut R) -> ::std::io::Result<Self> {
				Ok(Self { $($field: $crate::Readable::read(reader)?),* })
			}
		}
	};
}
pub(crate) use readable;

pub(crate) fn read_boxed_slice<R: Read, T: Readable>(reader: &mut R, len: usize) -> std::io::Result<Box<[T]>> {
	let mut vec = Vec::with_capacity(len);
	for _ in 0..len {
		vec.push(T::read(reader)?);
	}
	Ok(vec.into_boxed_slice())
}

/// Reads a length prefix of type `L`, then that many `T`s.
pub(crate) fn read_list<R: Read, T: Readable, L: Readable + AsPrimitive<usize>>(reader: &mut R) -> std::io::Result<Box<[T]>> {
	let len = L::read(reader)?.as_();
	read_boxed_slice(reader, len)
}
