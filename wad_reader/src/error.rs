use thiserror::Error;

/// Failure taxonomy for the archive pipeline.
///
/// Out-of-range record references are not represented here. Those degrade
/// gracefully: the offending record is skipped with a warning so a level with
/// cosmetic defects still renders.
#[derive(Debug, Error)]
pub enum Error {
	/// The file could not be opened, or a read fell short of the requested range.
	#[error("io error: {0}")]
	Io(#[from] std::io::Error),
	/// Header magic mismatch, or a lump whose layout cannot be decoded at all.
	#[error("format error: {0}")]
	Format(String),
	/// An explicitly requested named lump or level does not exist.
	#[error("not found: {0}")]
	NotFound(String),
}
