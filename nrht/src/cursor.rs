use {
	crate::{dir::Dir, node::Node, Error, Nrht, Store, MAX_CHILDREN},
	core::{fmt, mem},
	std::vec,
};

enum Select {
	Key,
	Value,
}

/// A depth-first traversal over a tree, yielding either keys or values.
///
/// The cursor holds no borrow of the tree; each step is handed the tree it
/// was created from. It snapshots the tree's modification counter and fails
/// with [`Error::ConcurrentModification`] once the tree is mutated behind
/// it. [`Cursor::remove`] re-synchronizes the snapshot, so draining a tree
/// through its own cursor is fine.
pub struct Cursor {
	select: Select,
	/// Ancestors of `dir`, each with the slot to resume it at.
	stack: Vec<(Dir, usize)>,
	dir: Dir,
	/// Next slot of `dir` to visit.
	child: usize,
	entries: vec::IntoIter<(Box<[u8]>, Box<[u8]>)>,
	/// Lookahead entry, yielded by the next step.
	next: Option<(Box<[u8]>, Box<[u8]>)>,
	/// Key of the last yielded entry, for [`Self::remove`].
	last: Option<Box<[u8]>>,
	expected: u64,
}

impl Cursor {
	pub(crate) fn keys<S: Store>(tree: &mut Nrht<S>) -> Result<Self, Error<S>> {
		Self::new(tree, Select::Key)
	}

	pub(crate) fn values<S: Store>(tree: &mut Nrht<S>) -> Result<Self, Error<S>> {
		Self::new(tree, Select::Value)
	}

	fn new<S: Store>(tree: &mut Nrht<S>, select: Select) -> Result<Self, Error<S>> {
		let mut slf = Self {
			select,
			stack: Vec::new(),
			dir: tree.root_dir()?,
			child: 0,
			entries: Vec::new().into_iter(),
			next: None,
			last: None,
			expected: tree.modcount,
		};
		slf.fill_next(tree)?;
		Ok(slf)
	}

	/// Yield the next key or value, or `None` past the last entry.
	pub fn next<S: Store>(
		&mut self,
		tree: &mut Nrht<S>,
	) -> Result<Option<Box<[u8]>>, Error<S>> {
		if self.next.is_none() {
			return Ok(None);
		}
		if self.expected != tree.modcount {
			return Err(Error::ConcurrentModification);
		}
		let Some((key, value)) = self.next.take() else { return Ok(None) };
		self.last = Some(key.clone());
		self.fill_next(tree)?;
		Ok(Some(match self.select {
			Select::Key => key,
			Select::Value => value,
		}))
	}

	/// Remove the last yielded entry from the tree.
	pub fn remove<S: Store>(&mut self, tree: &mut Nrht<S>) -> Result<(), Error<S>> {
		if self.last.is_none() {
			return Err(Error::NoCurrentEntry);
		}
		if self.expected != tree.modcount {
			return Err(Error::ConcurrentModification);
		}
		let Some(key) = self.last.take() else { return Ok(()) };
		tree.remove(&key)?;
		self.expected = tree.modcount;
		Ok(())
	}

	fn fill_next<S: Store>(&mut self, tree: &mut Nrht<S>) -> Result<(), Error<S>> {
		if let Some(e) = self.entries.next() {
			self.next = Some(e);
			return Ok(());
		}
		loop {
			if self.child >= MAX_CHILDREN {
				let Some(frame) = self.stack.pop() else {
					self.next = None;
					return Ok(());
				};
				(self.dir, self.child) = frame;
				continue;
			}
			let i = self.child;
			self.child += 1;
			match self.dir.children[i] {
				0 => {}
				c => match Node::fetch(&mut tree.db, c)? {
					Node::Dir(d) => {
						let parent = mem::replace(&mut self.dir, d);
						self.stack.push((parent, self.child));
						self.child = 0;
					}
					Node::Bucket(b) => {
						self.entries = b.into_entries().into_iter();
						// referenced buckets are never empty
						if let Some(e) = self.entries.next() {
							self.next = Some(e);
							return Ok(());
						}
					}
				},
			}
		}
	}
}

impl fmt::Debug for Cursor {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct(stringify!(Cursor))
			.field("depth", &self.stack.len())
			.field("child", &self.child)
			.field("expected", &self.expected)
			.finish_non_exhaustive()
	}
}
