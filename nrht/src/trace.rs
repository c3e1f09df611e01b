use {core::fmt::Arguments, std::cell::Cell};

std::thread_local! {
	static DEPTH: Cell<usize> = Cell::new(0);
}

pub(crate) fn print_debug(args: &Arguments<'_>) {
	DEPTH.with(|d| eprintln!("[nrht]{:>pad$} {}", "", args, pad = d.get() * 2));
}

/// Scope guard indenting trace output of nested calls.
pub(crate) struct Trace;

impl Trace {
	pub fn new() -> Self {
		DEPTH.with(|d| d.set(d.get() + 1));
		Self
	}
}

impl Drop for Trace {
	fn drop(&mut self) {
		DEPTH.with(|d| d.set(d.get() - 1));
	}
}
