use eth::{rpc::EthNodeReading, types::Address};
use futures::{
    stream::{self, StreamExt},
    Future,
};
use std::collections::HashSet;

/// Probing always covers at least this many ids when no cap is given.
pub const MIN_PROBE_RANGE: u64 = 10_000;
/// Supply derived ranges above this are skipped without an explicit cap.
pub const MAX_PROBE_RANGE: u64 = 10_000_000;
/// Block range width of a single `eth_getLogs` request.
pub const SCAN_WINDOW: u64 = 1_000;

/// Highest id to probe: an explicit cap wins, otherwise twice the declared
/// supply with a floor of [`MIN_PROBE_RANGE`]. `None` when the supply is too
/// large to enumerate, as for fungible tokens sharing the `Transfer` event.
pub fn probe_upper_bound(declared_supply: u64, max_ids: Option<u64>) -> Option<u64> {
    match max_ids {
        Some(max_ids) => Some(max_ids),
        None => Some(MIN_PROBE_RANGE.max(declared_supply.saturating_mul(2)))
            .filter(|bound| *bound <= MAX_PROBE_RANGE),
    }
}

/// Ids in `[1, upper_bound]` for which `probe` answers true.
///
/// The range is cut into consecutive batches of `batch_size`. A batch is
/// probed with at most `workers` probes in flight and completes before the
/// next one starts, so the result is ordered by batch (but not within one).
pub async fn discover_by_probing<F, Fut>(
    upper_bound: u64,
    batch_size: u64,
    workers: usize,
    probe: F,
) -> Vec<u64>
where
    F: Fn(u64) -> Fut,
    Fut: Future<Output = bool>,
{
    let batch_size = batch_size.max(1);
    let workers = workers.max(1);
    let mut found = Vec::new();
    let mut batch_start = 1u64;
    while batch_start <= upper_bound {
        let batch_end = batch_start.saturating_add(batch_size - 1).min(upper_bound);
        tracing::debug!("probing ids {batch_start}..={batch_end}");
        let existing: Vec<u64> = stream::iter(batch_start..=batch_end)
            .map(|id| {
                let exists = probe(id);
                async move { exists.await.then_some(id) }
            })
            .buffer_unordered(workers)
            .filter_map(|id| async move { id })
            .collect()
            .await;
        found.extend(existing);
        if batch_end == u64::MAX {
            break;
        }
        batch_start = batch_end + 1;
    }
    tracing::debug!("found {} of {upper_bound} probed ids", found.len());
    found
}

/// Contracts that emitted a `Transfer` event within `[start, end]`, in order
/// of first appearance. Windows the node fails to answer are skipped.
pub async fn scan_for_contracts(node: &dyn EthNodeReading, start: u64, end: u64) -> Vec<Address> {
    let mut seen = HashSet::new();
    let mut contracts = Vec::new();
    let mut window_start = start;
    while window_start <= end {
        let window_end = window_start.saturating_add(SCAN_WINDOW - 1).min(end);
        match node.transfer_emitters(window_start, window_end).await {
            Ok(emitters) => {
                let mut emitters: Vec<Address> = emitters.into_iter().collect();
                emitters.sort();
                contracts.extend(emitters.into_iter().filter(|address| seen.insert(*address)));
            }
            Err(err) => {
                tracing::warn!("skipping blocks {window_start}..={window_end}: {err:#}");
            }
        }
        if window_end == u64::MAX {
            break;
        }
        window_start = window_end + 1;
    }
    tracing::info!(
        "found {} contracts with Transfer events in blocks {start}..={end}",
        contracts.len()
    );
    contracts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockNode;
    use maplit::{hashmap, hashset};
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    };
    use tracing_test::traced_test;

    #[test]
    fn upper_bound() {
        assert_eq!(probe_upper_bound(0, None), Some(10_000));
        assert_eq!(probe_upper_bound(4_000, None), Some(10_000));
        assert_eq!(probe_upper_bound(6_000, None), Some(12_000));
        assert_eq!(probe_upper_bound(5_000_000, None), Some(MAX_PROBE_RANGE));
        assert_eq!(probe_upper_bound(5_000_001, None), None);
        assert_eq!(probe_upper_bound(u64::MAX, None), None);
        assert_eq!(probe_upper_bound(6_000, Some(25)), Some(25));
        assert_eq!(probe_upper_bound(u64::MAX, Some(25)), Some(25));
    }

    #[tokio::test]
    async fn finds_existing_ids() {
        let existing = hashset! {3u64, 7};
        let mut found = discover_by_probing(10, 4, 10, |id| {
            let exists = existing.contains(&id);
            async move { exists }
        })
        .await;
        found.sort();
        assert_eq!(found, vec![3, 7]);
    }

    #[tokio::test]
    async fn probes_whole_range_once() {
        let probed = Mutex::new(Vec::new());
        let found = discover_by_probing(10, 3, 2, |id| {
            probed.lock().unwrap().push(id);
            async move { id % 2 == 0 }
        })
        .await;
        let mut probed = probed.into_inner().unwrap();
        probed.sort();
        assert_eq!(probed, (1..=10).collect::<Vec<_>>());
        assert!(found.iter().all(|id| id % 2 == 0));
        assert_eq!(found.len(), 5);
    }

    #[tokio::test]
    async fn default_range_without_cap() {
        let calls = AtomicUsize::new(0);
        let found = discover_by_probing(MIN_PROBE_RANGE, 100, 10, |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { false }
        })
        .await;
        assert!(found.is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 10_000);
    }

    #[tokio::test]
    async fn batches_complete_in_order() {
        let found = discover_by_probing(9, 3, 3, |id| async move {
            // later ids of a batch finish first
            for _ in 0..(10 - id) {
                tokio::task::yield_now().await;
            }
            true
        })
        .await;
        let batches: Vec<Vec<u64>> = found
            .chunks(3)
            .map(|chunk| {
                let mut chunk = chunk.to_vec();
                chunk.sort();
                chunk
            })
            .collect();
        assert_eq!(batches, vec![vec![1, 2, 3], vec![4, 5, 6], vec![7, 8, 9]]);
    }

    #[tokio::test]
    async fn in_flight_probes_are_bounded() {
        let in_flight = AtomicUsize::new(0);
        let peak = AtomicUsize::new(0);
        discover_by_probing(20, 20, 4, |_| {
            let (in_flight, peak) = (&in_flight, &peak);
            async move {
                let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::task::yield_now().await;
                in_flight.fetch_sub(1, Ordering::SeqCst);
                false
            }
        })
        .await;
        assert!(peak.load(Ordering::SeqCst) <= 4);
    }

    #[tokio::test]
    async fn empty_range() {
        let found = discover_by_probing(0, 100, 10, |_| async { true }).await;
        assert!(found.is_empty());
    }

    #[tokio::test]
    #[traced_test]
    async fn scan_collects_emitters_per_window() {
        let node = MockNode {
            emitters: hashmap! {
                0 => vec![Address::from(2), Address::from(1)],
                1_000 => vec![Address::from(1), Address::from(3)],
            },
            failing_windows: hashset! {2_000},
            ..Default::default()
        };
        let found = scan_for_contracts(&node, 0, 2_500).await;
        assert_eq!(
            found,
            vec![Address::from(1), Address::from(2), Address::from(3)]
        );
        assert_eq!(
            node.scanned_windows(),
            vec![(0, 999), (1_000, 1_999), (2_000, 2_500)]
        );
        assert!(logs_contain("skipping blocks 2000..=2500"));
    }
}
