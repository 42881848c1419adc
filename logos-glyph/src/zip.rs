//! Zipped views: parallel slices read as if they were one slice of tuples.
//!
//! Views never copy; they borrow the arrays they were built from.

use std::iter::Zip as IterZip;
use std::slice::Iter;

/// Two equal-length slices viewed together.
pub struct Zip<'a, A, B> {
    a: &'a [A],
    b: &'a [B],
}

impl<A, B> Clone for Zip<'_, A, B> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<A, B> Copy for Zip<'_, A, B> {}

impl<A, B> Default for Zip<'_, A, B> {
    fn default() -> Self {
        Self { a: &[], b: &[] }
    }
}

impl<'a, A, B> Zip<'a, A, B> {
    pub fn new(a: &'a [A], b: &'a [B]) -> Self {
        assert_eq!(a.len(), b.len(), "zipped slices differ in length");
        Self { a, b }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.a.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.a.is_empty()
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<(&'a A, &'a B)> {
        Some((self.a.get(index)?, self.b.get(index)?))
    }

    /// The first `n` entries.
    pub fn first(&self, n: usize) -> Self {
        Self {
            a: &self.a[..n],
            b: &self.b[..n],
        }
    }

    pub fn firsts(&self) -> &'a [A] {
        self.a
    }

    pub fn seconds(&self) -> &'a [B] {
        self.b
    }

    pub fn iter(&self) -> IterZip<Iter<'a, A>, Iter<'a, B>> {
        self.a.iter().zip(self.b.iter())
    }
}

impl<'a, A, B> IntoIterator for Zip<'a, A, B> {
    type Item = (&'a A, &'a B);
    type IntoIter = IterZip<Iter<'a, A>, Iter<'a, B>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Three equal-length slices viewed together.
pub struct Zip3<'a, A, B, C> {
    a: &'a [A],
    b: &'a [B],
    c: &'a [C],
}

impl<A, B, C> Clone for Zip3<'_, A, B, C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<A, B, C> Copy for Zip3<'_, A, B, C> {}

impl<'a, A, B, C> Zip3<'a, A, B, C> {
    pub fn new(a: &'a [A], b: &'a [B], c: &'a [C]) -> Self {
        assert!(
            a.len() == b.len() && b.len() == c.len(),
            "zipped slices differ in length"
        );
        Self { a, b, c }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.a.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.a.is_empty()
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<(&'a A, &'a B, &'a C)> {
        Some((self.a.get(index)?, self.b.get(index)?, self.c.get(index)?))
    }

    /// Drop the third column.
    pub fn pair(&self) -> Zip<'a, A, B> {
        Zip { a: self.a, b: self.b }
    }

    pub fn thirds(&self) -> &'a [C] {
        self.c
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'a A, &'a B, &'a C)> + 'a {
        let (a, b, c) = (self.a, self.b, self.c);
        a.iter().zip(b).zip(c).map(|((a, b), c)| (a, b, c))
    }
}
