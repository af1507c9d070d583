//! Delta-sharing tuple codec.
//!
//! Composite keys sorted by their leading component tend to repeat it many
//! times in a row: `(user, 1) (user, 2) (user, 3)`. [`PrefixSerializer`]
//! writes each run of equal heads once:
//! ```text
//! run_len  head  tail[0] tail[1] ... tail[run_len - 1]
//! ```
//! The tails are handed to the tail codec as one array, so when the tail is
//! itself a `PrefixSerializer` its runs are shared the same way, one level
//! per tuple position. Nesting `(A, (B, (C, ...)))` gives any arity.

use std::cmp::Ordering;

use crate::common::{Error, Result};
use crate::encoding::{ByteReader, ByteWriter};

use super::{bounded_capacity, GroupSerializer, KeySerializer};

/// Codec for `(head, tail)` pairs that stores each run of equal heads once.
///
/// Head equality is decided by the head codec's [`KeySerializer::compare`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PrefixSerializer<H, T> {
    head: H,
    tail: T,
}

impl<H, T> PrefixSerializer<H, T> {
    pub fn new(head: H, tail: T) -> Self {
        Self { head, tail }
    }

    pub fn head(&self) -> &H {
        &self.head
    }

    pub fn tail(&self) -> &T {
        &self.tail
    }
}

impl<H, T> GroupSerializer for PrefixSerializer<H, T>
where
    H: KeySerializer,
    H::Item: Clone,
    T: GroupSerializer,
    T::Item: Clone,
{
    type Item = (H::Item, T::Item);

    fn serialize_array(&self, out: &mut ByteWriter, items: &[Self::Item]) -> Result<()> {
        let mut start = 0;
        while start < items.len() {
            let head = &items[start].0;
            let run = items[start..]
                .iter()
                .take_while(|(h, _)| self.head.compare(head, h) == Ordering::Equal)
                .count();

            out.pack_len(run);
            self.head.serialize_array(out, std::slice::from_ref(head))?;
            let tails: Vec<T::Item> = items[start..start + run]
                .iter()
                .map(|(_, t)| t.clone())
                .collect();
            self.tail.serialize_array(out, &tails)?;

            start += run;
        }
        Ok(())
    }

    fn deserialize_array(
        &self,
        input: &mut ByteReader<'_>,
        count: usize,
    ) -> Result<Vec<Self::Item>> {
        let mut items = Vec::with_capacity(bounded_capacity(input, count, 1));
        while items.len() < count {
            let run = input.unpack_len()?;
            if run == 0 || run > count - items.len() {
                return Err(Error::corruption(format!(
                    "tuple run of {} with {} of {} elements decoded",
                    run,
                    items.len(),
                    count
                )));
            }
            let head = self
                .head
                .deserialize_array(input, 1)?
                .pop()
                .ok_or_else(|| Error::corruption("tuple run without a head"))?;
            for tail in self.tail.deserialize_array(input, run)? {
                items.push((head.clone(), tail));
            }
        }
        Ok(items)
    }
}

impl<H, T> KeySerializer for PrefixSerializer<H, T>
where
    H: KeySerializer,
    H::Item: Clone,
    T: KeySerializer,
    T::Item: Clone,
{
    fn compare(&self, a: &Self::Item, b: &Self::Item) -> Ordering {
        self.head
            .compare(&a.0, &b.0)
            .then_with(|| self.tail.compare(&a.1, &b.1))
    }
}
