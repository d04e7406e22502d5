// ============================================================
// Layer 4 — Batch Streams
// ============================================================
// Wraps burn's DataLoaderBuilder for the two orders the system
// needs:
//
//   shuffled   — training; a fresh permutation on every iter()
//   sequential — validation / test; stream order, every call
//
// Loading stays on the calling thread (no worker pool), so one
// batch is fully consumed before the next is built.

use std::sync::Arc;

use burn::{
    data::dataloader::{DataLoader, DataLoaderBuilder},
    prelude::*,
};

use crate::data::{
    batcher::{ClassificationBatch, ClassificationBatcher},
    dataset::ExampleStore,
};

pub type BatchStream<B> = Arc<dyn DataLoader<ClassificationBatch<B>>>;

/// Training order. The seed only fixes the *sequence* of permutations;
/// each epoch still sees a different order.
pub fn shuffled_stream<B: Backend>(
    store:      ExampleStore,
    batch_size: usize,
    seed:       u64,
    device:     B::Device,
) -> BatchStream<B> {
    DataLoaderBuilder::new(ClassificationBatcher::<B>::new(device))
        .batch_size(batch_size)
        .shuffle(seed)
        .build(store)
}

/// Evaluation order: every batch exactly once, no shuffling.
pub fn sequential_stream<B: Backend>(
    store:      ExampleStore,
    batch_size: usize,
    device:     B::Device,
) -> BatchStream<B> {
    DataLoaderBuilder::new(ClassificationBatcher::<B>::new(device))
        .batch_size(batch_size)
        .build(store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::dataset::EncodedExample;
    use burn::backend::NdArray;

    fn store(n: usize) -> ExampleStore {
        let examples = (0..n)
            .map(|i| EncodedExample::new(vec![2, 5, 3], vec![1, 1, 1], i % 10, 3).unwrap())
            .collect();
        ExampleStore::new(examples)
    }

    fn labels_in_order(stream: &BatchStream<NdArray>) -> Vec<i64> {
        stream
            .iter()
            .flat_map(|b| b.labels.into_data().convert::<i64>().to_vec::<i64>().unwrap())
            .collect()
    }

    #[test]
    fn test_last_batch_may_be_smaller() {
        let stream = sequential_stream::<NdArray>(store(70), 32, Default::default());
        let sizes: Vec<usize> = stream.iter().map(|b| b.labels.dims()[0]).collect();
        assert_eq!(sizes, vec![32, 32, 6]);
    }

    #[test]
    fn test_sequential_stream_keeps_store_order() {
        let stream = sequential_stream::<NdArray>(store(12), 5, Default::default());
        let expected: Vec<i64> = (0..12).map(|i| (i % 10) as i64).collect();
        assert_eq!(labels_in_order(&stream), expected);
        assert_eq!(labels_in_order(&stream), expected);
    }

    #[test]
    fn test_shuffled_stream_visits_every_example_once() {
        let stream = shuffled_stream::<NdArray>(store(40), 8, 7, Default::default());
        let mut seen = labels_in_order(&stream);
        seen.sort_unstable();
        let mut expected: Vec<i64> = (0..40).map(|i| (i % 10) as i64).collect();
        expected.sort_unstable();
        assert_eq!(seen, expected);
    }

    #[test]
    fn test_each_pass_is_shuffled_afresh() {
        // ten examples with distinct labels 0..10
        let stream = shuffled_stream::<NdArray>(store(10), 4, 11, Default::default());
        let first = labels_in_order(&stream);
        let second = labels_in_order(&stream);
        assert_ne!(first, second);

        for mut pass in [first, second] {
            pass.sort_unstable();
            assert_eq!(pass, (0..10).collect::<Vec<i64>>());
        }
    }
}
