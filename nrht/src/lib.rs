#![deny(unused_must_use)]
#![deny(elided_lifetimes_in_paths)]

#[cfg(feature = "trace")]
macro_rules! trace {
	($($arg:tt)*) => {
		$crate::trace::print_debug(&format_args!($($arg)*));
		let _trace = $crate::trace::Trace::new();
	};
}
#[cfg(not(feature = "trace"))]
macro_rules! trace {
	($($arg:tt)*) => {};
}

mod bucket;
mod cursor;
mod dir;
mod hasher;
mod node;
mod store;
#[cfg(feature = "trace")]
mod trace;
mod util;

pub use {
	cursor::Cursor,
	hasher::Hasher,
	node::UnpackError,
	store::{MemStore, MemStoreError, Store},
};

use {
	core::fmt,
	dir::Dir,
	node::Node,
	rand_core::{CryptoRng, RngCore},
	util::{pack_u64, take, take_u8, unpack_u64},
};

/// Slots per directory page, one per value of the 8-bit hash slice.
///
/// Both constants below are part of the on-disk format.
pub(crate) const MAX_CHILDREN: usize = 256;
/// Deepest directory level. Buckets hanging off it cannot split further.
pub(crate) const MAX_DEPTH: u8 = 3;
/// Entries a bucket holds before an insert splits it into a sub-directory.
pub(crate) const BUCKET_CAPACITY: usize = 8;

/// A persistent hash tree: a map from byte keys to byte values backed by a
/// record store.
///
/// Keys are routed by their 32-bit hash, one byte per directory level, and
/// land in buckets that split into sub-directories as they fill up. The
/// handle itself occupies a single record holding the hasher and the root
/// directory's record-id; [`Self::id`] and [`Self::load`] round-trip it.
pub struct Nrht<S> {
	pub(crate) db: S,
	hasher: Hasher,
	id: u64,
	root: u64,
	pub(crate) modcount: u64,
}

impl<S> Nrht<S> {
	pub fn inner(&self) -> &S {
		&self.db
	}

	pub fn inner_mut(&mut self) -> &mut S {
		&mut self.db
	}

	pub fn into_inner(self) -> S {
		self.db
	}

	/// The record-id of this tree's handle record, for [`Self::load`].
	pub fn id(&self) -> u64 {
		self.id
	}
}

impl<S: Store> Nrht<S> {
	/// Create a new, empty tree with a randomly keyed hasher.
	#[must_use]
	pub fn create<R>(db: S, random: &mut R) -> Result<Self, Error<S>>
	where
		R: RngCore + CryptoRng,
	{
		let mut hash_key = [0; 16];
		random.fill_bytes(&mut hash_key);
		Self::create_with_hasher(db, Hasher::SipHasher13(hash_key))
	}

	#[must_use]
	pub fn create_with_hasher(mut db: S, hasher: Hasher) -> Result<Self, Error<S>> {
		let root = db.insert(&Dir::new(0).to_raw()).map_err(Error::Store)?;
		let mut slf = Self { db, hasher, id: 0, root, modcount: 0 };
		slf.id = slf.db.insert(&slf.to_raw()).map_err(Error::Store)?;
		Ok(slf)
	}

	/// Load a tree from its handle record.
	#[must_use]
	pub fn load(mut db: S, id: u64) -> Result<Self, Error<S>> {
		let raw = db.fetch(id).map_err(Error::Store)?;
		let r = &mut &raw[..];
		let trunc = || Error::Unpack(UnpackError::Truncated);
		let ty = take_u8(r).ok_or_else(trunc)?;
		let key = take(r, 16).ok_or_else(trunc)?;
		let hasher = Hasher::from_raw(ty, key.try_into().unwrap())
			.ok_or(Error::Unpack(UnpackError::UnknownHashAlgorithm(ty)))?;
		let root = unpack_u64(r).ok_or_else(trunc)?;
		Ok(Self { db, hasher, id, root, modcount: 0 })
	}

	fn to_raw(&self) -> Vec<u8> {
		let (ty, key) = self.hasher.to_raw();
		let mut buf = Vec::with_capacity(27);
		buf.push(ty);
		buf.extend_from_slice(&key);
		pack_u64(&mut buf, self.root);
		buf
	}

	pub fn get(&mut self, key: &[u8]) -> Result<Option<Box<[u8]>>, Error<S>> {
		trace!("get {:?}", bstr::BStr::new(key));
		let hash = self.hasher.hash(key);
		let dir = self.root_dir()?;
		dir.get(&mut self.db, hash, key)
	}

	/// Associate `value` with `key`, returning the prior value, if any.
	///
	/// An absent `value` removes the entry instead.
	pub fn put(
		&mut self,
		key: &[u8],
		value: Option<&[u8]>,
	) -> Result<Option<Box<[u8]>>, Error<S>> {
		let Some(value) = value else { return self.remove(key) };
		trace!("put {:?} ({} bytes)", bstr::BStr::new(key), value.len());
		let hash = self.hasher.hash(key);
		let mut dir = self.root_dir()?;
		let prior = dir.put(&mut self.db, &self.hasher, self.root, hash, key, value)?;
		self.modcount += 1;
		Ok(prior)
	}

	pub fn remove(&mut self, key: &[u8]) -> Result<Option<Box<[u8]>>, Error<S>> {
		trace!("remove {:?}", bstr::BStr::new(key));
		let hash = self.hasher.hash(key);
		let mut dir = self.root_dir()?;
		let prior = dir.remove(&mut self.db, self.root, hash, key)?;
		self.modcount += 1;
		Ok(prior)
	}

	/// A cursor over all keys, in hash order.
	pub fn keys(&mut self) -> Result<Cursor, Error<S>> {
		trace!("keys");
		Cursor::keys(self)
	}

	/// A cursor over all values, in the order [`Self::keys`] yields their keys.
	pub fn values(&mut self) -> Result<Cursor, Error<S>> {
		trace!("values");
		Cursor::values(self)
	}

	/// Remove all entries.
	pub fn clear(&mut self) -> Result<(), Error<S>> {
		trace!("clear");
		let mut c = self.keys()?;
		while c.next(self)?.is_some() {
			c.remove(self)?;
		}
		Ok(())
	}

	/// Copy this tree into `dst` record by record.
	///
	/// Every record keeps its id, so the copy is loadable under [`Self::id`].
	pub fn defrag(&mut self, dst: &mut S) -> Result<(), Error<S>> {
		trace!("defrag");
		let raw = self.db.fetch(self.id).map_err(Error::Store)?;
		dst.insert_at(self.id, &raw).map_err(Error::Store)?;
		self.copy_node(dst, self.root)
	}

	fn copy_node(&mut self, dst: &mut S, id: u64) -> Result<(), Error<S>> {
		let raw = self.db.fetch(id).map_err(Error::Store)?;
		dst.insert_at(id, &raw).map_err(Error::Store)?;
		if let Node::Dir(d) = Node::from_raw(&raw).map_err(Error::Unpack)? {
			for &c in d.children.iter().filter(|&&c| c != 0) {
				self.copy_node(dst, c)?;
			}
		}
		Ok(())
	}

	/// Remove all entries and the tree's own records, handing back the store.
	pub fn destroy(mut self) -> Result<S, Error<S>> {
		trace!("destroy");
		self.clear()?;
		self.db.delete(self.root).map_err(Error::Store)?;
		self.db.delete(self.id).map_err(Error::Store)?;
		Ok(self.db)
	}

	pub(crate) fn root_dir(&mut self) -> Result<Dir, Error<S>> {
		match Node::fetch(&mut self.db, self.root)? {
			Node::Dir(d) => Ok(d),
			Node::Bucket(_) => Err(Error::NotADirectory),
		}
	}
}

impl<S> fmt::Debug for Nrht<S> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct(stringify!(Nrht))
			.field("hasher", &self.hasher)
			.field("id", &self.id)
			.field("root", &self.root)
			.field("modcount", &self.modcount)
			.finish_non_exhaustive()
	}
}

pub enum Error<S>
where
	S: Store,
{
	/// The record store failed.
	Store(S::Error),
	/// A fetched record did not decode.
	Unpack(UnpackError),
	/// A record that must be a directory is a bucket.
	NotADirectory,
	/// A full bucket at the deepest level, where no split is possible.
	///
	/// Buckets there are allowed to grow without bound, so this only
	/// surfaces for pages written under different capacity rules.
	DepthOverflow,
	/// The tree was mutated behind a live cursor.
	ConcurrentModification,
	/// Cursor removal without an entry to remove.
	NoCurrentEntry,
}

impl<S> fmt::Debug for Error<S>
where
	S: Store,
	S::Error: fmt::Debug,
{
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Store(e) => f.debug_tuple("Store").field(e).finish(),
			Self::Unpack(e) => f.debug_tuple("Unpack").field(e).finish(),
			Self::NotADirectory => f.debug_tuple("NotADirectory").finish(),
			Self::DepthOverflow => f.debug_tuple("DepthOverflow").finish(),
			Self::ConcurrentModification => {
				f.debug_tuple("ConcurrentModification").finish()
			}
			Self::NoCurrentEntry => f.debug_tuple("NoCurrentEntry").finish(),
		}
	}
}
