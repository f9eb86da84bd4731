pub mod group;
pub mod writer;

#[cfg(windows)]
pub mod win32;

use std::path::Path;

use tracing::debug;

use group::{
	Icon,
	IconBuildError
};
use writer::{
	apply_icon,
	PatchError,
	ResourceWriter
};

/// Name of the RT_GROUP_ICON resource Windows uses as the program icon
pub const MAIN_ICON: &str = "MAINICON";

#[derive(Clone, Debug, PartialEq)]
pub struct PatchCfg {
	pub group_name: String,
	pub language: u16,
}

impl Default for PatchCfg {
	fn default() -> Self {
		Self {
			group_name: MAIN_ICON.to_string(),
			language: 0, // LANG_NEUTRAL, SUBLANG_NEUTRAL
		}
	}
}

/// Replaces the icon of `exe_path` with the ICO or BMP image at `icon_path`.
///
/// The icon is fully parsed before the executable is touched, so only
/// failures inside the resource update itself need a rollback.
pub fn change_icon<W>(icon_path: &Path, exe_path: &Path, cfg: &PatchCfg, writer: &mut W)
	-> Result<(), PatchError>
where
	W: ResourceWriter,
{
	for path in [icon_path, exe_path] {
		if !path.exists() {
			return Err(PatchError::Missing(path.to_path_buf()));
		}
	}

	let icon = Icon::build(icon_path)?;
	debug!(header_size = icon.header.len(), images = icon.images.len(), "icon built");

	for entry in icon.entries().map_err(IconBuildError::from)? {
		debug!(
			id = entry.id,
			width = entry.width,
			height = entry.height,
			bpp = entry.bpp,
			size = entry.size,
			"group entry"
		);
	}

	apply_icon(writer, exe_path, &icon, cfg)
}

#[cfg(test)]
mod tests {
	use std::io::Write;

	use crate::writer::tests::{
		Call,
		MockWriter
	};

	use super::*;

	fn ico_file() -> Vec<u8> {
		let mut data = vec![0, 0, 1, 0, 1, 0];
		data.extend([8, 8, 0, 0, 1, 0, 32, 0, 4, 0, 0, 0, 22, 0, 0, 0]);
		data.extend([0xDE, 0xAD, 0xBE, 0xEF]);
		data
	}

	#[test]
	fn test_change_icon() {
		let mut ico = tempfile::Builder::new().suffix(".ico").tempfile().unwrap();
		ico.write_all(&ico_file()).unwrap();
		let exe = tempfile::Builder::new().suffix(".exe").tempfile().unwrap();

		let mut writer = MockWriter::default();
		change_icon(ico.path(), exe.path(), &PatchCfg::default(), &mut writer).unwrap();

		assert_eq!(vec![
			Call::Begin(exe.path().to_path_buf()),
			Call::Image(1, 4),
			Call::Group(MAIN_ICON.to_string(), 6 + 14),
			Call::Commit(false),
		], writer.calls);
	}

	#[test]
	fn test_missing_paths() {
		let exe = tempfile::Builder::new().suffix(".exe").tempfile().unwrap();
		let mut writer = MockWriter::default();

		let err = change_icon(Path::new("inexistent.ico"), exe.path(), &PatchCfg::default(), &mut writer)
			.unwrap_err();
		assert_eq!("\"inexistent.ico\" does not exist!", err.to_string());

		let mut ico = tempfile::Builder::new().suffix(".ico").tempfile().unwrap();
		ico.write_all(&ico_file()).unwrap();

		let err = change_icon(ico.path(), Path::new("inexistent.exe"), &PatchCfg::default(), &mut writer)
			.unwrap_err();
		assert_eq!("\"inexistent.exe\" does not exist!", err.to_string());
		assert!(writer.calls.is_empty());
	}

	#[test]
	fn test_invalid_icon_never_opens_exe() {
		let mut ico = tempfile::Builder::new().suffix(".ico").tempfile().unwrap();
		ico.write_all(&[0, 0, 2, 0, 1, 0]).unwrap();
		let exe = tempfile::Builder::new().suffix(".exe").tempfile().unwrap();

		let mut writer = MockWriter::default();
		let err = change_icon(ico.path(), exe.path(), &PatchCfg::default(), &mut writer).unwrap_err();

		assert_eq!("Image is of CUR type, not ICO!", err.to_string());
		assert!(writer.calls.is_empty());
	}
}
