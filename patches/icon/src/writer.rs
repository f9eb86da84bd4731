use std::{
	io,
	path::{
		Path,
		PathBuf
	}
};

use thiserror::Error;
use tracing::{
	info,
	warn
};

use crate::{
	group::{
		Icon,
		IconBuildError
	},
	PatchCfg
};

/// Something that can stage and commit resource updates to an executable.
///
/// Updates between [`begin_update`](ResourceWriter::begin_update) and
/// [`commit`](ResourceWriter::commit) must only become visible when
/// committed with `discard == false`.
pub trait ResourceWriter {
	type Handle;

	fn begin_update(&mut self, exe: &Path) -> io::Result<Self::Handle>;
	fn write_image_resource(&mut self, handle: &Self::Handle, id: u16, data: &[u8]) -> io::Result<()>;
	fn write_group_resource(&mut self, handle: &Self::Handle, name: &str, data: &[u8]) -> io::Result<()>;
	fn commit(&mut self, handle: &Self::Handle, discard: bool) -> io::Result<()>;
}

/// An open resource update. Dropping it without calling
/// [`commit`](Transaction::commit) discards every staged write.
pub struct Transaction<'a, W>
where
	W: ResourceWriter,
{
	writer: &'a mut W,
	handle: W::Handle,
	finished: bool,
}

impl<'a, W> Transaction<'a, W>
where
	W: ResourceWriter,
{
	pub fn begin(writer: &'a mut W, exe: &Path) -> Result<Transaction<'a, W>, PatchError> {
		let handle = match writer.begin_update(exe) {
			Ok(h) => h,
			Err(source) => return Err(PatchError::Begin { source: source }),
		};

		info!(exe = %exe.display(), "resource update started");

		Ok(Transaction {
			writer: writer,
			handle: handle,
			finished: false,
		})
	}

	pub fn write_image(&mut self, id: u16, data: &[u8]) -> Result<(), PatchError> {
		self.writer.write_image_resource(&self.handle, id, data)
			.map_err(|source| PatchError::Image { id: id, source: source })
	}

	pub fn write_group(&mut self, name: &str, data: &[u8]) -> Result<(), PatchError> {
		self.writer.write_group_resource(&self.handle, name, data)
			.map_err(|source| PatchError::Group { source: source })
	}

	pub fn commit(mut self) -> Result<(), PatchError> {
		self.finished = true;
		self.writer.commit(&self.handle, false)
			.map_err(|source| PatchError::Commit { source: source })?;

		info!("resource update committed");
		Ok(())
	}
}

impl<'a, W> Drop for Transaction<'a, W>
where
	W: ResourceWriter,
{
	fn drop(&mut self) {
		if self.finished {
			return;
		}

		warn!("discarding resource update");
		if let Err(e) = self.writer.commit(&self.handle, true) {
			warn!("failed to discard resource update: {}", e);
		}
	}
}

/// Writes every image as an RT_ICON with its 1-based position as id, then the
/// group header under `cfg.group_name`, all in a single transaction.
pub fn apply_icon<W>(writer: &mut W, exe: &Path, icon: &Icon, cfg: &PatchCfg) -> Result<(), PatchError>
where
	W: ResourceWriter,
{
	let mut txn = Transaction::begin(writer, exe)?;

	for (i, image) in icon.images.iter().enumerate() {
		txn.write_image((i + 1) as u16, image)?;
	}

	txn.write_group(&cfg.group_name, &icon.header)?;
	txn.commit()
}

#[derive(Debug, Error)]
pub enum PatchError {
	#[error(transparent)]
	Build(#[from] IconBuildError),
	#[error("\"{}\" does not exist!", .0.display())]
	Missing(PathBuf),
	#[error("Failed to get executable's resource handle!")]
	Begin {
		#[source]
		source: io::Error,
	},
	#[error("Failed to add RT_ICON resource with id {id} to executable!")]
	Image {
		id: u16,
		#[source]
		source: io::Error,
	},
	#[error("Failed to add RT_GROUP_ICON resource to executable!")]
	Group {
		#[source]
		source: io::Error,
	},
	#[error("Failed to commit the changes to the executable!")]
	Commit {
		#[source]
		source: io::Error,
	},
	#[error("Executable resources can only be updated on Windows!")]
	Unsupported,
}
