use std::{
	fs::File,
	io::{
		BufReader,
		self,
		Read
	},
	path::{
		Path,
		PathBuf
	}
};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReadError {
	#[error("Failed to open \"{}\"!", path.display())]
	Open {
		path: PathBuf,
		#[source]
		source: io::Error,
	},
	#[error("Failed to read {size} bytes from {what}!")]
	Read {
		size: usize,
		what: &'static str,
		#[source]
		source: io::Error,
	},
}

/// Opens a file for binary reading.
///
/// Open failures carry the offending path; every later read goes through
/// [`ReadBinExt`] so a short read is reported with its byte count.
pub fn open_file<P>(path: P) -> Result<BufReader<File>, ReadError>
where
	P: AsRef<Path>,
{
	let path = path.as_ref();

	match File::open(path) {
		Ok(file) => Ok(BufReader::new(file)),
		Err(source) => Err(ReadError::Open {
			path: path.to_path_buf(),
			source: source,
		}),
	}
}

pub trait ReadBinExt: Read {
	/// Reads exactly `size` bytes, naming `what` was being read on failure
	#[inline]
	fn read_block(&mut self, size: usize, what: &'static str) -> Result<Vec<u8>, ReadError> {
		// sizes come from untrusted headers, so only grow as bytes arrive
		let mut data = Vec::new();

		let result = match self.take(size as u64).read_to_end(&mut data) {
			Ok(n) if n == size => return Ok(data),
			Ok(n) => io::Error::new(io::ErrorKind::UnexpectedEof,
				format!("got {} of {} bytes", n, size)),
			Err(e) => e,
		};

		Err(ReadError::Read {
			size: size,
			what: what,
			source: result,
		})
	}

	/// Reads `count` fixed-size records of `record_size` bytes as one contiguous block
	#[inline]
	fn read_records(&mut self, count: usize, record_size: usize, what: &'static str)
		-> Result<Vec<Vec<u8>>, ReadError>
	{
		let block = self.read_block(count * record_size, what)?;

		Ok(block.chunks_exact(record_size).map(|r| r.to_vec()).collect())
	}
}

impl<R> ReadBinExt for R
where
	R: Read + ?Sized,
{
}
