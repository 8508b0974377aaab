//! Pluggable storage for attribute and connectivity buffers.
//!
//! This trait abstracts how a flat element buffer is stored. The default
//! backend, [`SharedStorage`], is reference counted: cloning it is a
//! shallow copy, and the first mutation through a shared handle detaches
//! a private copy so other holders never observe the change.

use core::fmt::{self, Debug};
use std::sync::Arc;

use crate::pipeline_error::PipelineError;

/// Contiguous, indexable storage for `V` with slice access.
pub trait Storage<V>: Debug {
    /// Current length in elements.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Resize to `new_len`, filling new cells with `fill`.
    fn resize(&mut self, new_len: usize, fill: V)
    where
        V: Clone;

    /// Entire read-only buffer.
    fn as_slice(&self) -> &[V];

    /// Entire mutable buffer.
    fn as_mut_slice(&mut self) -> &mut [V];

    /// Copy `src` into the range `[offset .. offset + src.len())`.
    fn write_at(&mut self, offset: usize, src: &[V]) -> Result<(), PipelineError>
    where
        V: Clone,
    {
        let available = self.len();
        let out_of_range = PipelineError::StorageOutOfRange {
            offset,
            len: src.len(),
            available,
        };
        let end = offset
            .checked_add(src.len())
            .ok_or_else(|| out_of_range.clone())?;
        let buf = self.as_mut_slice();
        let dst = buf.get_mut(offset..end).ok_or(out_of_range)?;
        dst.clone_from_slice(src);
        Ok(())
    }
}

/// Reference-counted, copy-on-write `Vec` storage (default).
#[derive(Clone)]
pub struct SharedStorage<V>(Arc<Vec<V>>);

impl<V> Debug for SharedStorage<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedStorage")
            .field("len", &self.0.len())
            .field("shared", &(Arc::strong_count(&self.0) > 1))
            .finish()
    }
}

impl<V> Default for SharedStorage<V> {
    fn default() -> Self {
        Self(Arc::new(Vec::new()))
    }
}

impl<V: PartialEq> PartialEq for SharedStorage<V> {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.0.as_slice() == other.0.as_slice()
    }
}

impl<V: Clone + Debug> Storage<V> for SharedStorage<V> {
    fn len(&self) -> usize {
        self.0.len()
    }

    fn resize(&mut self, new_len: usize, fill: V) {
        Arc::make_mut(&mut self.0).resize(new_len, fill);
    }

    fn as_slice(&self) -> &[V] {
        &self.0
    }

    fn as_mut_slice(&mut self) -> &mut [V] {
        Arc::make_mut(&mut self.0).as_mut_slice()
    }
}

impl<V> From<Vec<V>> for SharedStorage<V> {
    fn from(v: Vec<V>) -> Self {
        Self(Arc::new(v))
    }
}

impl<V: Clone> SharedStorage<V> {
    /// Append one element, detaching from other holders first.
    pub fn push(&mut self, value: V) {
        Arc::make_mut(&mut self.0).push(value);
    }

    pub fn extend_from_slice(&mut self, values: &[V]) {
        Arc::make_mut(&mut self.0).extend_from_slice(values);
    }

    /// Copy the elements into fresh, unshared storage.
    pub fn deep_copy(&self) -> Self {
        Self(Arc::new(self.0.as_ref().clone()))
    }
}

impl<V> SharedStorage<V> {
    /// True when both handles point at the same buffer.
    pub fn shares_with(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clone_is_shallow_until_written() {
        let a = SharedStorage::from(vec![1, 2, 3]);
        let mut b = a.clone();
        assert!(a.shares_with(&b));
        b.as_mut_slice()[0] = 10;
        assert!(!a.shares_with(&b));
        assert_eq!(a.as_slice(), &[1, 2, 3]);
        assert_eq!(b.as_slice(), &[10, 2, 3]);
    }

    #[test]
    fn writes_stay_in_range() {
        let mut s = SharedStorage::from(vec![0.0f64; 4]);
        s.write_at(1, &[1.5, 2.5]).unwrap();
        assert_eq!(s.as_slice(), &[0.0, 1.5, 2.5, 0.0]);
        assert!(matches!(
            s.write_at(3, &[1.0, 2.0]),
            Err(PipelineError::StorageOutOfRange { offset: 3, len: 2, available: 4 })
        ));
    }

    #[test]
    fn mutable_slice_detaches_from_clones() {
        let a = SharedStorage::from(vec![1.0f32, 2.0]);
        let mut b = a.clone();
        b.as_mut_slice().fill(0.0);
        assert_eq!(a.as_slice(), &[1.0, 2.0]);
        assert_eq!(b.len(), 2);
    }

    #[test]
    fn deep_copy_detaches() {
        let a = SharedStorage::from(vec![7u8; 3]);
        let b = a.deep_copy();
        assert!(!a.shares_with(&b));
        assert_eq!(a, b);
    }
}
