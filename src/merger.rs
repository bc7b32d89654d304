//! Binary heap merger.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::error::Error;

/// Binary heap merger implementation.
/// Merges multiple sorted inputs into a single sorted output.
/// Time complexity is *m* \* log(*n*) in worst case where *m* is the number of items,
/// *n* is the number of chunks (inputs).
///
/// At most one item per chunk is buffered at a time. Equal items are emitted in chunk order.
pub struct BinaryHeapMerger<T, E, C>
where
    T: Ord,
    E: Error,
    C: IntoIterator<Item = Result<T, E>>,
{
    // binary heap is max-heap by default so we reverse it to convert it to min-heap,
    // the chunk index is part of the key to make ties resolve to the lowest chunk
    items: BinaryHeap<Reverse<(T, usize)>>,
    chunks: Vec<C::IntoIter>,
    initiated: bool,
    failed: bool,
}

impl<T, E, C> BinaryHeapMerger<T, E, C>
where
    T: Ord,
    E: Error,
    C: IntoIterator<Item = Result<T, E>>,
{
    /// Creates an instance of a binary heap merger using chunks as inputs.
    /// Chunk items should be sorted in ascending order otherwise the result is undefined.
    ///
    /// # Arguments
    /// * `chunks` - Chunks to be merged in a single sorted one
    pub fn new<I>(chunks: I) -> Self
    where
        I: IntoIterator<Item = C>,
    {
        let chunks = Vec::from_iter(chunks.into_iter().map(|c| c.into_iter()));
        let items = BinaryHeap::with_capacity(chunks.len());

        return BinaryHeapMerger {
            chunks,
            items,
            initiated: false,
            failed: false,
        };
    }

    /// Returns the number of merged chunks.
    pub fn fan_in(&self) -> usize {
        self.chunks.len()
    }

    fn advance(&mut self, idx: usize) -> Result<(), E> {
        if let Some(item) = self.chunks[idx].next() {
            self.items.push(Reverse((item?, idx)));
        }

        return Ok(());
    }

    fn prime(&mut self) -> Result<(), E> {
        for idx in 0..self.chunks.len() {
            self.advance(idx)?;
        }

        return Ok(());
    }
}

impl<T, E, C> Iterator for BinaryHeapMerger<T, E, C>
where
    T: Ord,
    E: Error,
    C: IntoIterator<Item = Result<T, E>>,
{
    type Item = Result<T, E>;

    /// Returns the next item from the inputs in ascending order.
    /// After the first error the merger is exhausted.
    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        if !self.initiated {
            self.initiated = true;
            if let Err(err) = self.prime() {
                self.failed = true;
                return Some(Err(err));
            }
        }

        let Reverse((result, idx)) = self.items.pop()?;
        if let Err(err) = self.advance(idx) {
            self.failed = true;
            return Some(Err(err));
        }

        return Some(Ok(result));
    }
}

#[cfg(test)]
mod test {
    use rstest::*;
    use std::cmp::Ordering;
    use std::error::Error;
    use std::io::{self, ErrorKind};

    use super::BinaryHeapMerger;

    #[rstest]
    #[case(
        vec![],
        vec![],
    )]
    #[case(
        vec![
            vec![],
            vec![]
        ],
        vec![],
    )]
    #[case(
        vec![
            vec![Ok(4), Ok(5), Ok(7)],
            vec![Ok(1), Ok(6)],
            vec![Ok(3)],
            vec![],
        ],
        vec![Ok(1), Ok(3), Ok(4), Ok(5), Ok(6), Ok(7)],
    )]
    #[case(
        vec![
            vec![Ok(2), Ok(9)],
            vec![],
            vec![Ok(1), Ok(5), Ok(9)],
        ],
        vec![Ok(1), Ok(2), Ok(5), Ok(9), Ok(9)],
    )]
    #[case(
        vec![
            vec![Result::Err(io::Error::new(ErrorKind::Other, "test error"))]
        ],
        vec![
            Result::Err(io::Error::new(ErrorKind::Other, "test error"))
        ],
    )]
    #[case(
        vec![
            vec![Ok(3), Result::Err(io::Error::new(ErrorKind::Other, "test error"))],
            vec![Ok(1), Ok(2)],
        ],
        vec![
            Ok(1),
            Ok(2),
            Result::Err(io::Error::new(ErrorKind::Other, "test error")),
        ],
    )]
    fn test_merger(
        #[case] chunks: Vec<Vec<Result<i32, io::Error>>>,
        #[case] expected_result: Vec<Result<i32, io::Error>>,
    ) {
        let merger = BinaryHeapMerger::new(chunks);
        let actual_result = merger.collect();
        assert!(
            compare_vectors_of_result::<_, io::Error>(&actual_result, &expected_result),
            "actual={:?}, expected={:?}",
            actual_result,
            expected_result
        );
    }

    #[test]
    fn test_merger_stops_after_error() {
        let chunks = vec![
            vec![Ok(1), Ok(2)],
            vec![Ok(0), Result::Err(io::Error::new(ErrorKind::Other, "test error")), Ok(5)],
        ];
        let mut merger = BinaryHeapMerger::new(chunks);
        assert_eq!(merger.fan_in(), 2);

        assert!(merger.next().unwrap().is_err());
        assert!(merger.next().is_none());
    }

    /// Item compared only by its key, the tag tells which chunk it came from.
    #[derive(Debug, PartialEq, Eq)]
    struct Tagged(u8, &'static str);

    impl Ord for Tagged {
        fn cmp(&self, other: &Self) -> Ordering {
            self.0.cmp(&other.0)
        }
    }

    impl PartialOrd for Tagged {
        fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
            Some(self.cmp(other))
        }
    }

    #[test]
    fn test_merger_ties_prefer_lowest_chunk() {
        let chunks: Vec<Vec<Result<Tagged, io::Error>>> = vec![
            vec![Ok(Tagged(1, "a")), Ok(Tagged(2, "a"))],
            vec![Ok(Tagged(1, "b")), Ok(Tagged(2, "b"))],
            vec![Ok(Tagged(0, "c")), Ok(Tagged(2, "c"))],
        ];

        let actual: Vec<&str> = BinaryHeapMerger::new(chunks).map(|item| item.unwrap().1).collect();
        assert_eq!(actual, vec!["c", "a", "b", "a", "b", "c"]);
    }

    fn compare_vectors_of_result<T: PartialEq, E: Error + 'static>(
        actual: &Vec<Result<T, E>>,
        expected: &Vec<Result<T, E>>,
    ) -> bool {
        actual.len() == expected.len()
            && actual
                .into_iter()
                .zip(expected)
                .all(
                    |(actual_result, expected_result)| match (actual_result, expected_result) {
                        (Ok(actual_result), Ok(expected_result)) if actual_result == expected_result => true,
                        (Err(actual_err), Err(expected_err)) => actual_err.to_string() == expected_err.to_string(),
                        _ => false,
                    },
                )
    }
}
