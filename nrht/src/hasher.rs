use siphasher::sip::SipHasher13;

/// Key hasher, persisted with the tree so a reload routes identically.
#[derive(Clone, Copy, Debug)]
pub enum Hasher {
	/// Keyed SipHash-1-3, truncated to 32 bits.
	SipHasher13([u8; 16]),
	/// The first four key bytes, big-endian, zero-padded.
	///
	/// For keys that are already uniformly distributed.
	Raw,
}

impl Hasher {
	/// Turn this hasher into raw components for storage.
	///
	/// The first element represents the type,
	/// the second element represents the key.
	pub fn to_raw(self) -> (u8, [u8; 16]) {
		match self {
			Self::SipHasher13(h) => (1, h),
			Self::Raw => (2, [0; 16]),
		}
	}

	/// Create a hasher from raw components.
	///
	/// Fails if the hasher type is unknown.
	pub fn from_raw(ty: u8, key: &[u8; 16]) -> Option<Self> {
		Some(match ty {
			1 => Self::SipHasher13(*key),
			2 => Self::Raw,
			_ => return None,
		})
	}

	/// Hash an arbitrary-sized key.
	pub fn hash(&self, data: &[u8]) -> u32 {
		use core::hash::Hasher;
		match self {
			Self::SipHasher13(key) => {
				let mut h = SipHasher13::new_with_key(key);
				h.write(data);
				h.finish() as _
			}
			Self::Raw => {
				let mut b = [0; 4];
				let l = data.len().min(4);
				b[..l].copy_from_slice(&data[..l]);
				u32::from_be_bytes(b)
			}
		}
	}
}
