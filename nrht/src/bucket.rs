use {
	crate::{
		node::{UnpackError, TAG_BUCKET},
		util::{pack_u64, take, take_u8, unpack_u64},
		BUCKET_CAPACITY, MAX_DEPTH,
	},
	bstr::BStr,
	core::{fmt, mem},
};

/// A leaf page holding the entries whose hashes share this page's prefix.
///
/// Keys and values are parallel lists; entry order carries no meaning.
pub(crate) struct Bucket {
	pub(crate) depth: u8,
	keys: Vec<Box<[u8]>>,
	values: Vec<Box<[u8]>>,
}

impl Bucket {
	pub fn new(depth: u8) -> Self {
		debug_assert!((1..=MAX_DEPTH + 1).contains(&depth));
		Self { depth, keys: Vec::new(), values: Vec::new() }
	}

	pub fn len(&self) -> usize {
		self.keys.len()
	}

	pub fn is_empty(&self) -> bool {
		self.keys.is_empty()
	}

	/// Whether an insert may land here without splitting first.
	///
	/// Bottom-level buckets always report room: colliding entries there
	/// have nowhere left to split to.
	pub fn has_room(&self) -> bool {
		self.depth > MAX_DEPTH || self.keys.len() < BUCKET_CAPACITY
	}

	pub fn get(&self, key: &[u8]) -> Option<&[u8]> {
		let i = self.keys.iter().position(|k| &**k == key)?;
		Some(&self.values[i])
	}

	/// Insert or replace, returning the replaced value.
	///
	/// Does not check capacity; that is the caller's job via
	/// [`Self::has_room`].
	pub fn add(&mut self, key: &[u8], value: &[u8]) -> Option<Box<[u8]>> {
		match self.keys.iter().position(|k| &**k == key) {
			Some(i) => Some(mem::replace(&mut self.values[i], value.into())),
			None => {
				self.keys.push(key.into());
				self.values.push(value.into());
				None
			}
		}
	}

	pub fn remove(&mut self, key: &[u8]) -> Option<Box<[u8]>> {
		let i = self.keys.iter().position(|k| &**k == key)?;
		self.keys.swap_remove(i);
		Some(self.values.swap_remove(i))
	}

	pub fn keys(&self) -> impl Iterator<Item = &[u8]> {
		self.keys.iter().map(|k| &**k)
	}

	pub fn into_entries(self) -> Vec<(Box<[u8]>, Box<[u8]>)> {
		self.keys.into_iter().zip(self.values).collect()
	}

	/// Serialize without the node tag.
	pub fn to_raw(&self) -> Vec<u8> {
		let mut buf = Vec::with_capacity(32);
		buf.push(TAG_BUCKET);
		buf.push(self.depth);
		pack_u64(&mut buf, self.keys.len() as u64);
		for (k, v) in self.keys.iter().zip(&self.values) {
			pack_u64(&mut buf, k.len() as u64);
			buf.extend_from_slice(k);
			pack_u64(&mut buf, v.len() as u64);
			buf.extend_from_slice(v);
		}
		buf
	}

	/// Deserialize, the node tag already consumed.
	pub fn from_raw(r: &mut &[u8]) -> Result<Self, UnpackError> {
		let depth = take_u8(r).ok_or(UnpackError::Truncated)?;
		if !(1..=MAX_DEPTH + 1).contains(&depth) {
			return Err(UnpackError::BadDepth(depth));
		}
		let mut slf = Self::new(depth);
		let count = unpack_u64(r).ok_or(UnpackError::Truncated)?;
		for _ in 0..count {
			let l = unpack_u64(r).ok_or(UnpackError::Truncated)?;
			let l = usize::try_from(l).map_err(|_| UnpackError::Truncated)?;
			let k = take(r, l).ok_or(UnpackError::Truncated)?;
			let l = unpack_u64(r).ok_or(UnpackError::Truncated)?;
			let l = usize::try_from(l).map_err(|_| UnpackError::Truncated)?;
			let v = take(r, l).ok_or(UnpackError::Truncated)?;
			slf.keys.push(k.into());
			slf.values.push(v.into());
		}
		Ok(slf)
	}
}

impl fmt::Debug for Bucket {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		struct Entries<'a>(&'a Bucket);

		impl fmt::Debug for Entries<'_> {
			fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
				f.debug_map()
					.entries(
						(self.0.keys.iter().zip(&self.0.values))
							.map(|(k, v)| (BStr::new(k), BStr::new(v))),
					)
					.finish()
			}
		}

		f.debug_struct(stringify!(Bucket))
			.field("depth", &self.depth)
			.field("entries", &Entries(self))
			.finish()
	}
}
