use {
	crate::{
		bucket::Bucket,
		hasher::Hasher,
		node::{Node, UnpackError, TAG_DIR},
		util::{pack_u64, take_u8, unpack_u64},
		Error, Store, MAX_CHILDREN, MAX_DEPTH,
	},
	core::fmt,
};

/// An interior routing page.
///
/// One slot per value of the 8-bit hash slice consumed at this depth; a
/// non-zero slot references either a bucket or a sub-directory one level
/// down. A directory holds no other state, so every traversal re-fetches
/// children from the store.
pub(crate) struct Dir {
	pub(crate) depth: u8,
	/// Child record-ids. 0 marks an empty slot.
	pub(crate) children: [u64; MAX_CHILDREN],
}

impl Dir {
	pub fn new(depth: u8) -> Self {
		debug_assert!(depth <= MAX_DEPTH);
		Self { depth, children: [0; MAX_CHILDREN] }
	}

	/// The slice of `hash` this directory routes by.
	///
	/// Depth 0 consumes the most significant byte, depth 3 the least.
	fn slot(&self, hash: u32) -> usize {
		((hash >> (8 * u32::from(MAX_DEPTH - self.depth))) & 0xff) as usize
	}

	pub fn is_empty(&self) -> bool {
		self.children.iter().all(|&c| c == 0)
	}

	pub fn get<S: Store>(
		&self,
		db: &mut S,
		hash: u32,
		key: &[u8],
	) -> Result<Option<Box<[u8]>>, Error<S>> {
		trace!("dir::get {} {:#010x}", self.depth, hash);
		match self.children[self.slot(hash)] {
			0 => Ok(None),
			c => match Node::fetch(db, c)? {
				Node::Dir(d) => d.get(db, hash, key),
				Node::Bucket(b) => Ok(b.get(key).map(Box::from)),
			},
		}
	}

	/// Insert an entry below this directory, persisted at `id`.
	///
	/// Returns the value `key` replaced, if any.
	pub fn put<S: Store>(
		&mut self,
		db: &mut S,
		hasher: &Hasher,
		id: u64,
		hash: u32,
		key: &[u8],
		value: &[u8],
	) -> Result<Option<Box<[u8]>>, Error<S>> {
		trace!("dir::put {} {:#010x}", self.depth, hash);
		let s = self.slot(hash);
		match self.children[s] {
			0 => {
				let mut b = Bucket::new(self.depth + 1);
				b.add(key, value);
				self.children[s] = db.insert(&b.to_raw()).map_err(Error::Store)?;
				db.update(id, &self.to_raw()).map_err(Error::Store)?;
				Ok(None)
			}
			c => match Node::fetch(db, c)? {
				Node::Dir(mut d) => d.put(db, hasher, c, hash, key, value),
				Node::Bucket(mut b) => {
					if b.has_room() {
						let prior = b.add(key, value);
						db.update(c, &b.to_raw()).map_err(Error::Store)?;
						return Ok(prior);
					}
					if self.depth >= MAX_DEPTH {
						// Bottom-level buckets report room unconditionally,
						// so a full one here was written under different
						// capacity rules.
						return Err(Error::DepthOverflow);
					}
					// Split: migrate the bucket's entries one level down
					// into a fresh sub-directory, then retry there.
					let mut sub = Dir::new(self.depth + 1);
					let sub_id = db.insert(&sub.to_raw()).map_err(Error::Store)?;
					self.children[s] = sub_id;
					db.update(id, &self.to_raw()).map_err(Error::Store)?;
					db.delete(c).map_err(Error::Store)?;
					for (k, v) in b.into_entries() {
						sub.put(db, hasher, sub_id, hasher.hash(&k), &k, &v)?;
					}
					sub.put(db, hasher, sub_id, hash, key, value)
				}
			},
		}
	}

	/// Remove `key` below this directory, persisted at `id`.
	///
	/// Emptied buckets and sub-directories are deleted on the way out.
	pub fn remove<S: Store>(
		&mut self,
		db: &mut S,
		id: u64,
		hash: u32,
		key: &[u8],
	) -> Result<Option<Box<[u8]>>, Error<S>> {
		trace!("dir::remove {} {:#010x}", self.depth, hash);
		let s = self.slot(hash);
		match self.children[s] {
			0 => Ok(None),
			c => match Node::fetch(db, c)? {
				Node::Dir(mut d) => {
					let prior = d.remove(db, c, hash, key)?;
					if prior.is_some() && d.is_empty() {
						db.delete(c).map_err(Error::Store)?;
						self.children[s] = 0;
						db.update(id, &self.to_raw()).map_err(Error::Store)?;
					}
					Ok(prior)
				}
				Node::Bucket(mut b) => {
					let prior = b.remove(key);
					if prior.is_some() {
						if b.is_empty() {
							db.delete(c).map_err(Error::Store)?;
							self.children[s] = 0;
							db.update(id, &self.to_raw()).map_err(Error::Store)?;
						} else {
							db.update(c, &b.to_raw()).map_err(Error::Store)?;
						}
					}
					Ok(prior)
				}
			},
		}
	}

	/// Serialize without the node tag.
	///
	/// The child array is written as the window from the first used slot to
	/// the last, each id as a variable-length integer; the bytes before the
	/// window say where it starts and ends. Most directories use a handful
	/// of slots, so this stays far below 256 ids.
	pub fn to_raw(&self) -> Vec<u8> {
		let mut buf = Vec::with_capacity(64);
		buf.push(TAG_DIR);
		buf.push(self.depth);
		let Some(start) = self.children.iter().position(|&c| c != 0) else {
			// No used slots. That start index (256) doesn't fit the byte,
			// so readers infer it from the record ending here.
			buf.push(0);
			return buf;
		};
		let end = self.children.iter().rposition(|&c| c != 0).unwrap();
		buf.push(start as u8);
		buf.push(end as u8);
		for &c in &self.children[start..=end] {
			pack_u64(&mut buf, c);
		}
		buf
	}

	/// Deserialize, the node tag already consumed.
	pub fn from_raw(r: &mut &[u8]) -> Result<Self, UnpackError> {
		let depth = take_u8(r).ok_or(UnpackError::Truncated)?;
		if depth > MAX_DEPTH {
			return Err(UnpackError::BadDepth(depth));
		}
		let mut slf = Self::new(depth);
		let start = take_u8(r).ok_or(UnpackError::Truncated)?;
		if r.is_empty() {
			return Ok(slf);
		}
		let end = take_u8(r).ok_or(UnpackError::Truncated)?;
		if start > end {
			return Err(UnpackError::BadBounds);
		}
		for i in usize::from(start)..=usize::from(end) {
			slf.children[i] = unpack_u64(r).ok_or(UnpackError::Truncated)?;
		}
		Ok(slf)
	}
}

impl fmt::Debug for Dir {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		struct Children<'a>(&'a [u64; MAX_CHILDREN]);

		impl fmt::Debug for Children<'_> {
			fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
				f.debug_map()
					.entries(self.0.iter().enumerate().filter(|(_, &c)| c != 0))
					.finish()
			}
		}

		f.debug_struct(stringify!(Dir))
			.field("depth", &self.depth)
			.field("children", &Children(&self.children))
			.finish()
	}
}
