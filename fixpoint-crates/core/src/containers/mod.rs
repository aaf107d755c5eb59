//! Contains containers which are used by the kernel.
mod key_value_heap;
mod keyed_vec;

use fnv::FnvBuildHasher;
pub use key_value_heap::*;
pub use keyed_vec::*;

/// [`std::collections::HashMap`] that defaults to a deterministic hasher.
#[allow(clippy::disallowed_types, reason = "this is how we define our HashMap")]
pub type HashMap<K, V, Hasher = FnvBuildHasher> = std::collections::HashMap<K, V, Hasher>;
