use rustc_hash::FxHashMap;

/// A page-granular record store.
///
/// Records are opaque byte blobs addressed by a 64-bit id assigned at
/// insertion; 0 is reserved as "no record". The tree performs no caching of
/// its own, so implementations decide reference locality.
pub trait Store {
	type Error;

	/// Read the raw bytes of a record.
	fn fetch(&mut self, id: u64) -> Result<Vec<u8>, Self::Error>;
	/// Allocate a new record holding `data`.
	fn insert(&mut self, data: &[u8]) -> Result<u64, Self::Error>;
	/// Write a record at a caller-chosen id, allocating it if needed.
	///
	/// Used to keep record-ids stable when copying a tree between stores.
	fn insert_at(&mut self, id: u64, data: &[u8]) -> Result<(), Self::Error>;
	/// Overwrite an existing record.
	fn update(&mut self, id: u64, data: &[u8]) -> Result<(), Self::Error>;
	/// Free a record.
	fn delete(&mut self, id: u64) -> Result<(), Self::Error>;
}

/// A record store entirely in memory. Useful for testing.
#[derive(Debug)]
pub struct MemStore {
	records: FxHashMap<u64, Box<[u8]>>,
	next: u64,
}

impl MemStore {
	pub fn new() -> Self {
		Self { records: Default::default(), next: 1 }
	}

	/// The amount of live records.
	pub fn count(&self) -> usize {
		self.records.len()
	}
}

impl Default for MemStore {
	fn default() -> Self {
		Self::new()
	}
}

impl Store for MemStore {
	type Error = MemStoreError;

	fn fetch(&mut self, id: u64) -> Result<Vec<u8>, Self::Error> {
		self.records
			.get(&id)
			.map(|r| r.to_vec())
			.ok_or(MemStoreError::NotFound(id))
	}

	fn insert(&mut self, data: &[u8]) -> Result<u64, Self::Error> {
		let id = self.next;
		self.next += 1;
		self.records.insert(id, data.into());
		Ok(id)
	}

	fn insert_at(&mut self, id: u64, data: &[u8]) -> Result<(), Self::Error> {
		debug_assert!(id != 0, "0 is reserved");
		self.next = self.next.max(id + 1);
		self.records.insert(id, data.into());
		Ok(())
	}

	fn update(&mut self, id: u64, data: &[u8]) -> Result<(), Self::Error> {
		match self.records.get_mut(&id) {
			Some(r) => Ok(*r = data.into()),
			None => Err(MemStoreError::NotFound(id)),
		}
	}

	fn delete(&mut self, id: u64) -> Result<(), Self::Error> {
		self.records
			.remove(&id)
			.map(|_| ())
			.ok_or(MemStoreError::NotFound(id))
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MemStoreError {
	NotFound(u64),
}
