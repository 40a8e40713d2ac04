//! Collection aliases used by construction and queries.
//!
//! Hash maps and sets use `FxHash`, a fast non-cryptographic hasher. Keys are
//! always internal vertex or cell indices, never caller-controlled data.

use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

/// Fast hash map for internal index keys.
///
/// # Examples
///
/// ```rust
/// use tetra_interp::core::collections::FastHashMap;
///
/// let mut map: FastHashMap<[usize; 3], usize> = FastHashMap::default();
/// map.insert([1, 2, 3], 4);
/// assert_eq!(map.get(&[1, 2, 3]), Some(&4));
/// ```
pub type FastHashMap<K, V> = FxHashMap<K, V>;

/// Fast hash set for internal index keys.
pub type FastHashSet<T> = FxHashSet<T>;

/// Stack-allocated buffer that spills to the heap past `N` elements.
///
/// # Examples
///
/// ```rust
/// use tetra_interp::core::collections::SmallBuffer;
///
/// let mut buffer: SmallBuffer<usize, 8> = SmallBuffer::new();
/// buffer.extend(0..5);
/// assert!(!buffer.spilled());
/// ```
pub type SmallBuffer<T, const N: usize> = SmallVec<[T; N]>;

/// Inline capacity for cavity cell lists. Most cavities excavate a handful of cells.
pub const CAVITY_BUFFER_SIZE: usize = 32;

/// Cells excavated by one insertion.
pub type CavityBuffer = SmallBuffer<usize, CAVITY_BUFFER_SIZE>;
