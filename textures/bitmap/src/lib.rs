use byteorder::{
	BE,
	LE,
	ReadBytesExt,
	WriteBytesExt
};

use std::{
	io,
	path::Path
};

use thiserror::Error;
use tracing::{
	debug,
	warn
};

use iconswap_core::{
	io_ext::{
		open_file,
		ReadBinExt,
		ReadError
	},
	tag2
};

/// Size of the BITMAPFILEHEADER that precedes the DIB
pub const FILE_HEADER_SIZE: usize = 14;
/// Size of a BITMAPINFOHEADER
pub const INFO_HEADER_SIZE: u32 = 40;

#[derive(Clone, Copy, Debug, PartialEq)]
#[repr(u16)]
pub enum Magic {
	OS2BitmapArray = tag2!(b"BA"),
	Windows = tag2!(b"BM"),
	OS2ColorIcon = tag2!(b"CI"),
	OS2ColorPointer = tag2!(b"CP"),
	OS2Icon = tag2!(b"IC"),
	OS2Pointer = tag2!(b"PT"),
}

impl Magic {
	pub fn from_u16(magic: u16) -> Option<Magic> {
		match magic {
			0x4241 => Some(Magic::OS2BitmapArray),
			0x424D => Some(Magic::Windows),
			0x4349 => Some(Magic::OS2ColorIcon),
			0x4350 => Some(Magic::OS2ColorPointer),
			0x4943 => Some(Magic::OS2Icon),
			0x5054 => Some(Magic::OS2Pointer),
			_ => None,
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Header {
	pub magic: u16, // big endian, "BM" for Windows bitmaps
	pub size: u32,
	pub reserved6: u16, // safe to be 0
	pub reserved8: u16, // safe to be 0
	pub pixel_offset: u32,
}

impl Header {
	#[cfg(feature = "import")]
	fn read<R>(buf: &mut R) -> Result<Header, BitmapImportError>
	where
		R: ReadBytesExt,
	{
		let data = buf.read_block(FILE_HEADER_SIZE, "BMP header")?;
		let mut data = data.as_slice();

		Ok(Header {
			magic: data.read_u16::<BE>()?,
			size: data.read_u32::<LE>()?,
			reserved6: data.read_u16::<LE>()?,
			reserved8: data.read_u16::<LE>()?,
			pixel_offset: data.read_u32::<LE>()?,
		})
	}

	#[cfg(feature = "export")]
	pub fn write<W>(&self, buf: &mut W) -> io::Result<()>
	where
		W: WriteBytesExt,
	{
		buf.write_u16::<BE>(self.magic)?;
		buf.write_u32::<LE>(self.size)?;
		buf.write_u16::<LE>(self.reserved6)?;
		buf.write_u16::<LE>(self.reserved8)?;
		buf.write_u32::<LE>(self.pixel_offset)
	}
}

#[derive(Clone, Copy, Debug, PartialEq)]
#[repr(u32)]
pub enum Compression {
	RGB = 0,
	RLE8,
	RLE4,
	Huffman1D,
	JPEG,
	PNG,
	AlphaBitfields,
	CMYK,
	CMYKRLE8,
	CMYKRLE4,
}

impl Compression {
	pub fn from_u32(cmp: u32) -> Option<Compression> {
		match cmp {
			0 => Some(Compression::RGB),
			1 => Some(Compression::RLE8),
			2 => Some(Compression::RLE4),
			3 => Some(Compression::Huffman1D),
			4 => Some(Compression::JPEG),
			5 => Some(Compression::PNG),
			6 => Some(Compression::AlphaBitfields),
			7 => Some(Compression::CMYK),
			8 => Some(Compression::CMYKRLE8),
			9 => Some(Compression::CMYKRLE4),
			_ => None,
		}
	}
}

/// BITMAPINFOHEADER fields, decoded as stored.
///
/// Nothing is validated here; callers decide which layouts they accept.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct InfoHeader {
	pub header_size: u32, // should be 40
	pub width: i32,
	pub height: i32,
	pub num_color_panes: u16, // should be 1
	pub bpp: u16,
	pub compression: u32,
	pub img_size: u32,
	pub h_res: i32,
	pub v_res: i32,
	pub num_colors_used: u32, // defaults to 0 for power of 2
	pub num_important_colors: u32, // ignored, should be 0
}

impl InfoHeader {
	/// Decodes the info header from the front of a DIB
	#[cfg(feature = "import")]
	pub fn read<R>(buf: &mut R) -> Result<InfoHeader, BitmapImportError>
	where
		R: ReadBytesExt,
	{
		let data = buf.read_block(INFO_HEADER_SIZE as usize, "BMP DIB header")?;
		let mut data = data.as_slice();

		let info = InfoHeader {
			header_size: data.read_u32::<LE>()?,
			width: data.read_i32::<LE>()?,
			height: data.read_i32::<LE>()?,
			num_color_panes: data.read_u16::<LE>()?,
			bpp: data.read_u16::<LE>()?,
			compression: data.read_u32::<LE>()?,
			img_size: data.read_u32::<LE>()?,
			h_res: data.read_i32::<LE>()?,
			v_res: data.read_i32::<LE>()?,
			num_colors_used: data.read_u32::<LE>()?,
			num_important_colors: data.read_u32::<LE>()?,
		};

		debug!(
			header_size = info.header_size,
			width = info.width,
			height = info.height,
			planes = info.num_color_panes,
			bpp = info.bpp,
			compression = ?info.compression(),
			img_size = info.img_size,
			h_res = info.h_res,
			v_res = info.v_res,
			num_colors_used = info.num_colors_used,
			num_important_colors = info.num_important_colors,
			"BMP info header"
		);

		Ok(info)
	}

	/// Known compression method, if any
	pub fn compression(&self) -> Option<Compression> {
		Compression::from_u32(self.compression)
	}

	#[cfg(feature = "export")]
	pub fn write<W>(&self, buf: &mut W) -> io::Result<()>
	where
		W: WriteBytesExt,
	{
		buf.write_u32::<LE>(self.header_size)?;
		buf.write_i32::<LE>(self.width)?;
		buf.write_i32::<LE>(self.height)?;
		buf.write_u16::<LE>(self.num_color_panes)?;
		buf.write_u16::<LE>(self.bpp)?;
		buf.write_u32::<LE>(self.compression)?;
		buf.write_u32::<LE>(self.img_size)?;
		buf.write_i32::<LE>(self.h_res)?;
		buf.write_i32::<LE>(self.v_res)?;
		buf.write_u32::<LE>(self.num_colors_used)?;
		buf.write_u32::<LE>(self.num_important_colors)
	}
}

/// A BMP file split into its file header and everything that follows it
/// (the DIB: info header, optional palette and pixel data), kept verbatim.
#[derive(Clone, Debug, PartialEq)]
pub struct BitmapFile {
	pub header: Header,
	pub image: Vec<u8>,
}

impl BitmapFile {
	#[cfg(feature = "import")]
	pub fn read<R>(buf: &mut R) -> Result<BitmapFile, BitmapImportError>
	where
		R: ReadBytesExt,
	{
		let header = Header::read(buf)?;

		debug!(
			magic = header.magic,
			size = header.size,
			reserved6 = header.reserved6,
			reserved8 = header.reserved8,
			pixel_offset = header.pixel_offset,
			"BMP file header"
		);

		if Magic::from_u16(header.magic) != Some(Magic::Windows) {
			warn!("BMP magic is 0x{:X}, not \"BM\"", header.magic);
		}

		let remaining = match (header.size as usize).checked_sub(FILE_HEADER_SIZE) {
			Some(r) => r,
			None => return Err(BitmapImportError::FileSize(header.size)),
		};

		Ok(BitmapFile {
			header: header,
			image: buf.read_block(remaining, "BMP image")?,
		})
	}
}

/// Reads a BMP file from disk
#[cfg(feature = "import")]
pub fn read_bmp<P>(filepath: P) -> Result<BitmapFile, BitmapImportError>
where
	P: AsRef<Path>,
{
	let mut file = open_file(filepath)?;
	BitmapFile::read(&mut file)
}

#[cfg(feature = "import")]
#[derive(Error, Debug)]
pub enum BitmapImportError {
	#[error(transparent)]
	Read(#[from] ReadError),
	#[error("I/O error")]
	IO {
		#[from]
		source: io::Error,
	},
	#[error("BMP file size {0} is smaller than its 14 byte header!")]
	FileSize(u32),
}
