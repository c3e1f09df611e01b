use {
	crate::{bucket::Bucket, dir::Dir, util::take_u8, Error, Store},
	core::fmt,
};

pub(crate) const TAG_DIR: u8 = 1;
pub(crate) const TAG_BUCKET: u8 = 2;

/// A fetched page: directories route, buckets hold entries.
///
/// The two are stored on the same byte stream and told apart by a leading
/// tag byte.
#[derive(Debug)]
pub(crate) enum Node {
	Dir(Dir),
	Bucket(Bucket),
}

impl Node {
	pub fn fetch<S: Store>(db: &mut S, id: u64) -> Result<Self, Error<S>> {
		debug_assert!(id != 0, "fetch of absent record");
		let raw = db.fetch(id).map_err(Error::Store)?;
		Self::from_raw(&raw).map_err(Error::Unpack)
	}

	pub fn from_raw(raw: &[u8]) -> Result<Self, UnpackError> {
		let r = &mut &raw[..];
		match take_u8(r).ok_or(UnpackError::Truncated)? {
			TAG_DIR => Dir::from_raw(r).map(Self::Dir),
			TAG_BUCKET => Bucket::from_raw(r).map(Self::Bucket),
			n => Err(UnpackError::UnknownTag(n)),
		}
	}
}

/// Failure to decode a fetched record.
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum UnpackError {
	Truncated,
	UnknownTag(u8),
	BadDepth(u8),
	BadBounds,
	UnknownHashAlgorithm(u8),
}

impl fmt::Debug for UnpackError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Truncated => f.debug_tuple("Truncated").finish(),
			Self::UnknownTag(n) => f.debug_tuple("UnknownTag").field(n).finish(),
			Self::BadDepth(n) => f.debug_tuple("BadDepth").field(n).finish(),
			Self::BadBounds => f.debug_tuple("BadBounds").finish(),
			Self::UnknownHashAlgorithm(n) => {
				f.debug_tuple("UnknownHashAlgorithm").field(n).finish()
			}
		}
	}
}
