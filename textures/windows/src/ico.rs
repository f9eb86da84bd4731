use byteorder::{
	LE,
	ReadBytesExt,
	WriteBytesExt
};

use std::io;
use thiserror::Error;
use tracing::debug;

use iconswap_core::io_ext::{
	ReadBinExt,
	ReadError
};

/// Size of the on-disk ICONDIR header
pub const HEADER_SIZE: usize = 6;
/// Size of an on-disk ICONDIRENTRY
pub const ENTRY_SIZE: usize = 16;

#[derive(Clone, Copy, Debug, PartialEq)]
#[repr(u16)]
pub enum ImageType {
	Icon = 1,
	Cursor,
	Unknown = 65535,
}

impl ImageType {
	pub fn from_u16(kind: u16) -> ImageType {
		match kind {
			1 => ImageType::Icon,
			2 => ImageType::Cursor,
			_ => ImageType::Unknown,
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Header {
	reserved: u16,
	pub kind: ImageType,
	pub num_images: u16,
}

impl Header {
	/// Creates an icon header for `num_images` images
	pub fn new(num_images: u16) -> Header {
		Header {
			reserved: 0,
			kind: ImageType::Icon,
			num_images: num_images,
		}
	}

	/// Decodes and validates the header.
	///
	/// Checks run in a fixed order so the error names the most specific
	/// problem: reserved bytes, then cursor files, then any other type, then
	/// the image count.
	#[cfg(feature = "import")]
	fn read<R>(buf: &mut R) -> Result<Header, IcoImportError>
	where
		R: ReadBytesExt,
	{
		let data = buf.read_block(HEADER_SIZE, "ICO header")?;
		let mut data = data.as_slice();

		let reserved = data.read_u16::<LE>()?;
		let kind = data.read_u16::<LE>()?;
		let num_images = data.read_u16::<LE>()?;

		debug!(reserved, kind, num_images, "ICO header");

		if reserved != 0 {
			return Err(IcoImportError::HeaderReserved(reserved));
		}

		match ImageType::from_u16(kind) {
			ImageType::Icon => (),
			ImageType::Cursor => return Err(IcoImportError::Cursor),
			ImageType::Unknown => return Err(IcoImportError::Kind(kind)),
		}

		if num_images == 0 {
			return Err(IcoImportError::NoEntries);
		}

		Ok(Header {
			reserved: reserved,
			kind: ImageType::Icon,
			num_images: num_images,
		})
	}

	#[cfg(feature = "export")]
	pub fn write<W>(&self, buf: &mut W) -> io::Result<()>
	where
		W: WriteBytesExt,
	{
		buf.write_u16::<LE>(self.reserved)?;
		buf.write_u16::<LE>(self.kind as u16)?;
		buf.write_u16::<LE>(self.num_images)
	}
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DirEntry {
	pub width: u8, // 0 means 256
	pub height: u8, // 0 means 256
	pub num_colors: u8, // 0 if no palette
	pub reserved: u8, // should be 0
	pub planes: u16, // should be 0 or 1
	pub bpp: u16,
	pub size: u32,
	pub offset: u32,
}

impl DirEntry {
	#[cfg(feature = "import")]
	fn read<R>(buf: &mut R) -> io::Result<DirEntry>
	where
		R: ReadBytesExt,
	{
		Ok(DirEntry {
			width: buf.read_u8()?,
			height: buf.read_u8()?,
			num_colors: buf.read_u8()?,
			reserved: buf.read_u8()?,
			planes: buf.read_u16::<LE>()?,
			bpp: buf.read_u16::<LE>()?,
			size: buf.read_u32::<LE>()?,
			offset: buf.read_u32::<LE>()?,
		})
	}

	#[cfg(feature = "import")]
	fn validate(&self) -> Result<(), IcoImportError> {
		if self.reserved != 0 {
			return Err(IcoImportError::EntryReserved(self.reserved));
		}

		if self.planes > 1 {
			return Err(IcoImportError::Planes(self.planes));
		}

		Ok(())
	}

	#[cfg(feature = "export")]
	pub fn write<W>(&self, buf: &mut W) -> io::Result<()>
	where
		W: WriteBytesExt,
	{
		buf.write_u8(self.width)?;
		buf.write_u8(self.height)?;
		buf.write_u8(self.num_colors)?;
		buf.write_u8(self.reserved)?;
		buf.write_u16::<LE>(self.planes)?;
		buf.write_u16::<LE>(self.bpp)?;
		buf.write_u32::<LE>(self.size)?;
		buf.write_u32::<LE>(self.offset)
	}
}

/// A parsed ICO container.
///
/// `images[i]` holds the payload described by `entries[i]`. Payloads are
/// read back to back in directory order; the entries' file offsets are kept
/// only for inspection.
#[derive(Clone, Debug, PartialEq)]
pub struct IcoFile {
	pub header: Header,
	pub entries: Vec<DirEntry>,
	pub images: Vec<Vec<u8>>,
}

impl IcoFile {
	#[cfg(feature = "import")]
	pub fn read<R>(buf: &mut R) -> Result<IcoFile, IcoImportError>
	where
		R: ReadBytesExt,
	{
		let header = Header::read(buf)?;

		let records = buf.read_records(header.num_images as usize, ENTRY_SIZE, "ICO entry")?;
		let mut entries = Vec::with_capacity(records.len());
		for rec in records.iter() {
			entries.push(DirEntry::read(&mut rec.as_slice())?);
		}

		let mut images = Vec::with_capacity(entries.len());
		for (i, entry) in entries.iter().enumerate() {
			debug!(
				index = i,
				width = entry.width,
				height = entry.height,
				num_colors = entry.num_colors,
				reserved = entry.reserved,
				planes = entry.planes,
				bpp = entry.bpp,
				size = entry.size,
				offset = entry.offset,
				"ICO entry"
			);

			entry.validate()?;
			images.push(buf.read_block(entry.size as usize, "ICO image")?);
		}

		Ok(IcoFile {
			header: header,
			entries: entries,
			images: images,
		})
	}
}

#[cfg(feature = "import")]
#[derive(Debug, Error)]
pub enum IcoImportError {
	#[error(transparent)]
	Read(#[from] ReadError),
	#[error("I/O error")]
	IO {
		#[from]
		source: io::Error,
	},
	#[error("Header reserved bytes are 0x{0:X}, expecting 0x0!")]
	HeaderReserved(u16),
	#[error("Image is of CUR type, not ICO!")]
	Cursor,
	#[error("Image type 0x{0:X} is invalid!")]
	Kind(u16),
	#[error("Icon does not have image entries!")]
	NoEntries,
	#[error("Entry's reserved byte is 0x{0:X}, expecting 0x0!")]
	EntryReserved(u8),
	#[error("Entry's color planes is 0x{0:X}, expecting 0x0 or 0x1!")]
	Planes(u16),
}

#[cfg(all(test, feature = "import"))]
mod tests {
	use byteorder::{
		LE,
		WriteBytesExt
	};

	use super::*;

	fn header(reserved: u16, kind: u16, count: u16) -> Vec<u8> {
		let mut data = vec![];
		data.write_u16::<LE>(reserved).unwrap();
		data.write_u16::<LE>(kind).unwrap();
		data.write_u16::<LE>(count).unwrap();
		data
	}

	fn entry(data: &mut Vec<u8>, reserved: u8, planes: u16, size: u32, offset: u32) {
		data.write_u8(32).unwrap();
		data.write_u8(32).unwrap();
		data.write_u8(0).unwrap();
		data.write_u8(reserved).unwrap();
		data.write_u16::<LE>(planes).unwrap();
		data.write_u16::<LE>(32).unwrap();
		data.write_u32::<LE>(size).unwrap();
		data.write_u32::<LE>(offset).unwrap();
	}

	fn two_images() -> Vec<u8> {
		let mut data = header(0, 1, 2);
		entry(&mut data, 0, 1, 1128, 38);
		entry(&mut data, 0, 0, 296, 1166);
		data.extend(vec![0xAA; 1128]);
		data.extend(vec![0xBB; 296]);
		data
	}

	fn read_err(data: Vec<u8>) -> String {
		IcoFile::read(&mut data.as_slice()).unwrap_err().to_string()
	}

	#[test]
	fn test_read_ico() {
		let data = two_images();
		let ico = IcoFile::read(&mut data.as_slice()).unwrap();

		assert_eq!(Header::new(2), ico.header);
		assert_eq!(2, ico.entries.len());
		assert_eq!(2, ico.images.len());
		assert_eq!(1128, ico.entries[0].size);
		assert_eq!(1166, ico.entries[1].offset);
		assert_eq!(vec![0xAA; 1128], ico.images[0]);
		assert_eq!(vec![0xBB; 296], ico.images[1]);
	}

	#[test]
	fn test_header_reserved() {
		let msg = read_err(header(0xFFFF, 1, 1));
		assert!(msg.contains("0xFFFF"), "{}", msg);
		assert!(msg.contains("expecting 0x0"), "{}", msg);
	}

	#[test]
	fn test_header_cursor() {
		assert!(read_err(header(0, 2, 1)).contains("CUR"));
	}

	#[test]
	fn test_header_kind() {
		assert_eq!("Image type 0xFFFF is invalid!", read_err(header(0, 0xFFFF, 1)));
	}

	#[test]
	fn test_header_check_order() {
		// reserved bytes are reported before the cursor type
		assert!(read_err(header(1, 2, 0)).starts_with("Header reserved bytes are 0x1"));
		// the cursor type is reported before the missing entries
		assert_eq!("Image is of CUR type, not ICO!", read_err(header(0, 2, 0)));
	}

	#[test]
	fn test_no_entries() {
		assert_eq!("Icon does not have image entries!", read_err(header(0, 1, 0)));
	}

	#[test]
	fn test_entry_reserved() {
		let mut data = header(0, 1, 1);
		entry(&mut data, 0x7F, 1, 4, 22);
		data.extend([0; 4]);
		assert_eq!("Entry's reserved byte is 0x7F, expecting 0x0!", read_err(data));
	}

	#[test]
	fn test_entry_planes() {
		let mut data = header(0, 1, 1);
		entry(&mut data, 0, 2, 4, 22);
		data.extend([0; 4]);
		assert_eq!("Entry's color planes is 0x2, expecting 0x0 or 0x1!", read_err(data));
	}

	#[test]
	fn test_second_entry_invalid() {
		let mut data = header(0, 1, 2);
		entry(&mut data, 0, 1, 4, 38);
		entry(&mut data, 0, 3, 4, 42);
		data.extend([0; 8]);
		assert!(read_err(data).contains("0x3"));
	}

	#[test]
	fn test_short_header() {
		assert_eq!("Failed to read 6 bytes from ICO header!", read_err(vec![0, 0, 1]));
	}

	#[test]
	fn test_short_entries() {
		let mut data = header(0, 1, 2);
		entry(&mut data, 0, 1, 4, 38);
		assert_eq!("Failed to read 32 bytes from ICO entry!", read_err(data));
	}

	#[test]
	fn test_short_image() {
		let mut data = two_images();
		data.truncate(data.len() - 1);
		assert_eq!("Failed to read 296 bytes from ICO image!", read_err(data));
	}

	#[test]
	fn test_oversized_image() {
		let mut data = header(0, 1, 1);
		entry(&mut data, 0, 1, 0xFFFF_FFFF, 22);
		assert_eq!("Failed to read 4294967295 bytes from ICO image!", read_err(data));
	}

	#[test]
	fn test_open_ico() {
		use std::io::Write;

		let mut tmp = tempfile::Builder::new().suffix(".ico").tempfile().unwrap();
		tmp.write_all(&two_images()).unwrap();

		let ico = crate::read_ico(tmp.path()).unwrap();
		assert_eq!(vec![1128, 296], ico.images.iter().map(|i| i.len()).collect::<Vec<_>>());
	}

	#[test]
	fn test_open_missing() {
		let err = crate::read_ico("missing.ico").unwrap_err();
		assert_eq!("Failed to open \"missing.ico\"!", err.to_string());
	}
}
