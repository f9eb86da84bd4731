pub mod ico;

#[cfg(feature = "import")]
use std::path::Path;

#[cfg(feature = "import")]
use ico::{
	IcoFile,
	IcoImportError
};

/// Reads and validates an ICO file from disk
#[cfg(feature = "import")]
pub fn read_ico<P>(filepath: P) -> Result<IcoFile, IcoImportError>
where
	P: AsRef<Path>,
{
	let mut file = iconswap_core::io_ext::open_file(filepath)?;
	IcoFile::read(&mut file)
}
