#![no_main]

use {
	arbitrary::Arbitrary,
	libfuzzer_sys::fuzz_target,
	nrht::{Hasher, MemStore, Nrht},
	std::collections::BTreeMap,
};

#[derive(Debug, Arbitrary)]
struct Test<'a> {
	raw_hasher: bool,
	ops: Vec<Op<'a>>,
}

#[derive(Clone, Debug, Arbitrary)]
enum Op<'a> {
	Put { key: &'a [u8], value: Option<&'a [u8]> },
	Get { key: &'a [u8] },
	Remove { key: &'a [u8] },
	Keys,
	Values,
	Reload,
	Defrag,
}

fuzz_target!(|test: Test<'_>| {
	let hasher = if test.raw_hasher {
		Hasher::Raw
	} else {
		Hasher::SipHasher13([0xa5; 16])
	};
	let mut tree = Nrht::create_with_hasher(MemStore::new(), hasher).unwrap();
	let mut model = BTreeMap::<Vec<u8>, Vec<u8>>::new();
	for op in test.ops {
		match op {
			Op::Put { key, value } => {
				let prior = tree.put(key, value).unwrap();
				let expect = match value {
					Some(v) => model.insert(key.to_vec(), v.to_vec()),
					None => model.remove(key),
				};
				assert_eq!(prior.as_deref(), expect.as_deref());
			}
			Op::Get { key } => {
				assert_eq!(
					tree.get(key).unwrap().as_deref(),
					model.get(key).map(|v| &**v),
				);
			}
			Op::Remove { key } => {
				assert_eq!(
					tree.remove(key).unwrap().as_deref(),
					model.remove(key).as_deref(),
				);
			}
			Op::Keys => {
				let mut seen = 0;
				let mut c = tree.keys().unwrap();
				while let Some(k) = c.next(&mut tree).unwrap() {
					assert!(model.contains_key(&*k), "stray key {:?}", k);
					seen += 1;
				}
				assert_eq!(seen, model.len());
			}
			Op::Values => {
				let mut seen = 0;
				let mut c = tree.values().unwrap();
				while c.next(&mut tree).unwrap().is_some() {
					seen += 1;
				}
				assert_eq!(seen, model.len());
			}
			Op::Reload => {
				let id = tree.id();
				tree = Nrht::load(tree.into_inner(), id).unwrap();
			}
			Op::Defrag => {
				let id = tree.id();
				let mut dst = MemStore::new();
				tree.defrag(&mut dst).unwrap();
				tree = Nrht::load(dst, id).unwrap();
			}
		}
	}
});
