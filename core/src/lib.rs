#[cfg(feature = "io_ext")]
pub mod io_ext;

/// Converts a 2-byte string into a 16-bit big endian integer.
/// Byte strings longer than 2 bytes are truncated.
#[macro_export]
macro_rules! tag2 {
	($b2: literal) => {
		u16::from_be_bytes([$b2[0], $b2[1]])
	}
}
