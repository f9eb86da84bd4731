use byteorder::{
	ByteOrder,
	LE,
	ReadBytesExt,
	WriteBytesExt
};

use std::{
	fmt,
	io,
	mem::size_of,
	path::Path
};

use thiserror::Error;
use tracing::debug;

use iconswap_textures_bitmap::{
	BitmapImportError,
	Compression,
	INFO_HEADER_SIZE,
	InfoHeader,
	read_bmp
};

use iconswap_textures_windows::{
	ico::{
		DirEntry,
		HEADER_SIZE,
		Header,
		IcoFile,
		IcoImportError
	},
	read_ico
};

/// Size of a GRPICONDIRENTRY
pub const GROUP_ENTRY_SIZE: usize = 14;
/// Largest width or height an icon entry can describe
pub const MAX_DIMENSION: i32 = 256;
/// Offset of the height field inside a BITMAPINFOHEADER, past `header_size` and `width`
pub const HEIGHT_OFFSET: usize = size_of::<u32>() + size_of::<i32>();

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ImageFormat {
	Ico,
	Bmp,
}

impl ImageFormat {
	/// Picks the parser from the lowercase file extension
	pub fn from_path(path: &Path) -> Result<ImageFormat, IconBuildError> {
		let ext = match path.extension() {
			Some(ext) => format!(".{}", ext.to_string_lossy().to_lowercase()),
			None => String::new(),
		};

		match ext.as_str() {
			".ico" => Ok(ImageFormat::Ico),
			".bmp" => Ok(ImageFormat::Bmp),
			_ => Err(IconBuildError::FileType(ext)),
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Dimension {
	Width,
	Height,
}

impl fmt::Display for Dimension {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Dimension::Width => write!(f, "Width"),
			Dimension::Height => write!(f, "Height"),
		}
	}
}

/// An icon directory entry as stored in an RT_GROUP_ICON resource.
///
/// Same fields as [`DirEntry`] except the trailing 32-bit file offset is
/// replaced by the 16-bit id of the RT_ICON resource holding the image.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GroupEntry {
	pub width: u8,
	pub height: u8,
	pub num_colors: u8,
	pub reserved: u8,
	pub planes: u16,
	pub bpp: u16,
	pub size: u32,
	pub id: u16,
}

impl GroupEntry {
	/// Re-tags an ICO directory entry with a resource id
	pub fn from_dir_entry(entry: &DirEntry, id: u16) -> GroupEntry {
		GroupEntry {
			width: entry.width,
			height: entry.height,
			num_colors: entry.num_colors,
			reserved: entry.reserved,
			planes: entry.planes,
			bpp: entry.bpp,
			size: entry.size,
			id: id,
		}
	}

	/// Describes a bare DIB of `size` bytes as an icon entry.
	///
	/// Only uncompressed BITMAPINFOHEADER images up to 256x256 qualify.
	/// Values are narrowed to the entry's field widths, so 256 becomes 0.
	pub fn from_info_header(info: &InfoHeader, size: u32, id: u16) -> Result<GroupEntry, IconBuildError> {
		if info.header_size != INFO_HEADER_SIZE {
			return Err(IconBuildError::InfoHeader(info.header_size));
		}

		check_dimension(Dimension::Width, info.width)?;
		check_dimension(Dimension::Height, info.height)?;

		if info.compression() != Some(Compression::RGB) {
			return Err(IconBuildError::Compression(info.compression));
		}

		Ok(GroupEntry {
			width: info.width as u8,
			height: info.height as u8,
			num_colors: info.num_colors_used as u8,
			reserved: 0,
			planes: info.num_color_panes,
			bpp: info.bpp,
			size: size,
			id: id,
		})
	}

	pub fn read<R>(buf: &mut R) -> io::Result<GroupEntry>
	where
		R: ReadBytesExt,
	{
		Ok(GroupEntry {
			width: buf.read_u8()?,
			height: buf.read_u8()?,
			num_colors: buf.read_u8()?,
			reserved: buf.read_u8()?,
			planes: buf.read_u16::<LE>()?,
			bpp: buf.read_u16::<LE>()?,
			size: buf.read_u32::<LE>()?,
			id: buf.read_u16::<LE>()?,
		})
	}

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
		buf.write_u16::<LE>(self.id)
	}
}

fn check_dimension(dim: Dimension, value: i32) -> Result<(), IconBuildError> {
	if value > MAX_DIMENSION {
		return Err(IconBuildError::Oversized(dim, value));
	}

	if value <= 0 {
		return Err(IconBuildError::NotPositive(dim, value));
	}

	Ok(())
}

/// Doubles the height field of the BITMAPINFOHEADER at the front of `image`.
///
/// Icon DIBs count the XOR and AND masks together in their height, so a
/// plain bitmap has to be patched before it can be stored as an RT_ICON.
/// Returns the new height, or `None` if `image` is too short to hold it.
pub fn mark_as_icon_payload(image: &mut [u8]) -> Option<i32> {
	let field = image.get_mut(HEIGHT_OFFSET..HEIGHT_OFFSET + size_of::<i32>())?;
	let height = LE::read_i32(field).wrapping_mul(2);
	LE::write_i32(field, height);

	Some(height)
}

/// Icon resources ready to be written into an executable.
///
/// `header` is the RT_GROUP_ICON payload: an icon header followed by one
/// [`GroupEntry`] per image. `images[i]` is the RT_ICON payload with id
/// `i + 1`, which is also the id stored in the `i`-th group entry.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Icon {
	pub header: Vec<u8>,
	pub images: Vec<Vec<u8>>,
}

impl Icon {
	/// Builds the icon resources from an ICO or BMP file
	pub fn build<P>(path: P) -> Result<Icon, IconBuildError>
	where
		P: AsRef<Path>,
	{
		let path = path.as_ref();

		match ImageFormat::from_path(path)? {
			ImageFormat::Ico => Icon::from_ico(read_ico(path)?),
			ImageFormat::Bmp => Icon::from_dib(read_bmp(path)?.image),
		}
	}

	/// Re-tags the directory of a parsed ICO file, ids following directory order
	pub fn from_ico(ico: IcoFile) -> Result<Icon, IconBuildError> {
		let mut header = Vec::with_capacity(HEADER_SIZE + ico.entries.len() * GROUP_ENTRY_SIZE);
		ico.header.write(&mut header)?;

		for (i, entry) in ico.entries.iter().enumerate() {
			let group_entry = GroupEntry::from_dir_entry(entry, (i + 1) as u16);
			debug!(id = group_entry.id, size = group_entry.size, "icon image");
			group_entry.write(&mut header)?;
		}

		Ok(Icon {
			header: header,
			images: ico.images,
		})
	}

	/// Wraps a single DIB (a BMP file minus its file header) as a one image icon
	pub fn from_dib(mut image: Vec<u8>) -> Result<Icon, IconBuildError> {
		let info = InfoHeader::read(&mut image.as_slice())?;
		let entry = GroupEntry::from_info_header(&info, image.len() as u32, 1)?;

		let height = mark_as_icon_payload(&mut image);
		debug!(id = entry.id, size = entry.size, height = ?height, "icon image");

		let mut header = Vec::with_capacity(HEADER_SIZE + GROUP_ENTRY_SIZE);
		Header::new(1).write(&mut header)?;
		entry.write(&mut header)?;

		Ok(Icon {
			header: header,
			images: vec![image],
		})
	}

	/// Decodes the group entries back out of `header`.
	///
	/// Public for inspecting a built icon; [`crate::change_icon`] uses it to
	/// log what is about to be written.
	pub fn entries(&self) -> io::Result<Vec<GroupEntry>> {
		let data = self.header.get(HEADER_SIZE..).unwrap_or(&[]);

		data.chunks(GROUP_ENTRY_SIZE)
			.map(|mut rec| GroupEntry::read(&mut rec))
			.collect()
	}
}

#[derive(Debug, Error)]
pub enum IconBuildError {
	#[error(transparent)]
	Ico(#[from] IcoImportError),
	#[error(transparent)]
	Bitmap(#[from] BitmapImportError),
	#[error("I/O error")]
	IO {
		#[from]
		source: io::Error,
	},
	#[error("BMP header is not BITMAPINFOHEADER! (size: {0})")]
	InfoHeader(u32),
	#[error("{0} {1} is larger than the 256 limit!")]
	Oversized(Dimension, i32),
	#[error("{0} {1} must be positive!")]
	NotPositive(Dimension, i32),
	#[error("{0} compression method is not supported!")]
	Compression(u32),
	#[error("File type \"{0}\" is not supported!")]
	FileType(String),
}
