use std::{
	ffi::OsStr,
	io,
	iter::once,
	os::windows::ffi::OsStrExt,
	path::Path
};

use winapi::{
	shared::{
		basetsd::ULONG_PTR,
		minwindef::{
			DWORD,
			FALSE,
			LPVOID,
			TRUE
		}
	},
	um::{
		winbase::{
			BeginUpdateResourceW,
			EndUpdateResourceW,
			UpdateResourceW
		},
		winnt::{
			HANDLE,
			LPCWSTR
		},
		winuser::{
			RT_GROUP_ICON,
			RT_ICON
		}
	}
};

use crate::writer::ResourceWriter;

fn to_wide(s: &OsStr) -> Vec<u16> {
	s.encode_wide().chain(once(0)).collect()
}

/// Resource updates through `BeginUpdateResourceW`/`EndUpdateResourceW`
#[derive(Clone, Copy, Debug, Default)]
pub struct Win32ResourceWriter {
	pub language: u16,
}

impl Win32ResourceWriter {
	pub fn new(language: u16) -> Win32ResourceWriter {
		Win32ResourceWriter {
			language: language,
		}
	}

	fn update(&self, handle: HANDLE, kind: LPCWSTR, name: LPCWSTR, data: &[u8]) -> io::Result<()> {
		unsafe {
			match UpdateResourceW(handle, kind, name, self.language, data.as_ptr() as LPVOID,
				data.len() as DWORD)
			{
				0 => Err(io::Error::last_os_error()),
				_ => Ok(()),
			}
		}
	}
}

impl ResourceWriter for Win32ResourceWriter {
	type Handle = HANDLE;

	fn begin_update(&mut self, exe: &Path) -> io::Result<HANDLE> {
		let path = to_wide(exe.as_os_str());

		let handle = unsafe { BeginUpdateResourceW(path.as_ptr(), FALSE) };
		if handle.is_null() {
			return Err(io::Error::last_os_error());
		}

		Ok(handle)
	}

	fn write_image_resource(&mut self, handle: &HANDLE, id: u16, data: &[u8]) -> io::Result<()> {
		// integer resource ids are passed in place of the name pointer
		self.update(*handle, RT_ICON, id as ULONG_PTR as LPCWSTR, data)
	}

	fn write_group_resource(&mut self, handle: &HANDLE, name: &str, data: &[u8]) -> io::Result<()> {
		let name = to_wide(OsStr::new(name));
		self.update(*handle, RT_GROUP_ICON, name.as_ptr(), data)
	}

	fn commit(&mut self, handle: &HANDLE, discard: bool) -> io::Result<()> {
		let discard = if discard { TRUE } else { FALSE };

		unsafe {
			match EndUpdateResourceW(*handle, discard) {
				0 => Err(io::Error::last_os_error()),
				_ => Ok(()),
			}
		}
	}
}
