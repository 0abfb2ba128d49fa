//! Small shared pieces: hasher aliases, typed-index storage, a stopwatch.

mod id_vec;
pub use id_vec::IdVec;

mod timer;
pub use timer::Timer;

// keys here are short strings and small ints, where FxHash does well
pub type Hasher = std::hash::BuildHasherDefault<rustc_hash::FxHasher>;
pub type HashMap<K, V> = std::collections::HashMap<K, V, Hasher>;
pub type HashSet<T> = std::collections::HashSet<T, Hasher>;
