use std::marker::PhantomData;

/// A `Vec` addressed by a dedicated id type instead of a bare `usize`, so
/// an index handed out by one collection cannot stray onto another.
///
/// Ids are dense: `push` returns them in `0..len` order and `fill` makes
/// every id in `0..len` valid up front.
#[derive(Debug)]
pub struct IdVec<K, V> {
    items: Vec<V>,
    _key: PhantomData<K>,
}

impl<K, V> Default for IdVec<K, V> {
    fn default() -> Self {
        Vec::new().into()
    }
}

impl<K, V> From<Vec<V>> for IdVec<K, V> {
    fn from(items: Vec<V>) -> Self {
        Self {
            items,
            _key: PhantomData,
        }
    }
}

impl<K, V> IdVec<K, V> {
    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Values in id order.
    pub fn iter(&self) -> std::slice::Iter<'_, V> {
        self.items.iter()
    }
}

impl<K, V: Clone> IdVec<K, V> {
    /// `len` copies of `val`, one per id in `0..len`.
    pub fn fill(val: V, len: usize) -> Self {
        vec![val; len].into()
    }
}

impl<K: From<usize> + Into<usize>, V> IdVec<K, V> {
    /// Append `v`, returning the id it can be fetched back under.
    #[inline]
    pub fn push(&mut self, v: V) -> K {
        self.items.push(v);
        K::from(self.items.len() - 1)
    }

    #[inline]
    pub fn get(&self, k: K) -> &V {
        &self.items[k.into()]
    }

    #[inline]
    pub fn get_mut(&mut self, k: K) -> &mut V {
        &mut self.items[k.into()]
    }
}
