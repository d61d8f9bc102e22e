//! Bounded-concurrency batch fetching of collection items.
//!
//! Refs are split into consecutive chunks of `max_concurrent`. Chunks run one
//! after another; the lookups inside a chunk run concurrently and the chunk is
//! finished only once every lookup has settled. Results are assembled in ref
//! order, never in response arrival order.

use crate::collection::{CollectionError, CollectionItemDetail, CollectionSource, ItemRef};
use futures::future::join_all;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchOptions {
    /// Upper bound on lookups in flight at any instant. Must be positive.
    pub max_concurrent: usize,
    /// Stop once this many valid items are collected.
    pub target: Option<usize>,
}

impl BatchOptions {
    pub fn new(max_concurrent: usize) -> Self {
        Self {
            max_concurrent,
            target: None,
        }
    }

    pub fn with_target(mut self, target: usize) -> Self {
        self.target = Some(target);
        self
    }
}

#[derive(Debug)]
pub enum DropReason {
    /// The lookup settled with an error.
    Lookup(CollectionError),
    /// The lookup succeeded but the item failed the validity check.
    Invalid,
}

#[derive(Debug)]
pub struct DroppedRef {
    pub id: ItemRef,
    pub reason: DropReason,
}

/// Result of one batch fetch.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    /// Valid items, in the relative order of their refs.
    pub items: Vec<CollectionItemDetail>,
    /// Refs that were looked up but did not make it into `items`, in ref order.
    pub dropped: Vec<DroppedRef>,
    /// Refs never looked up because the target was reached first.
    pub unvisited: usize,
}

impl BatchOutcome {
    pub fn dropped_count(&self) -> usize {
        self.dropped.len()
    }
}

/// Resolve `refs` to details, keeping only those that satisfy `is_valid`.
///
/// Individual lookup failures drop the item. The batch fails as a whole only
/// when the source reports it cannot issue requests, or when every attempted
/// lookup failed to connect.
pub async fn fetch_batch<F>(
    source: &dyn CollectionSource,
    refs: &[ItemRef],
    options: BatchOptions,
    is_valid: F,
) -> Result<BatchOutcome, CollectionError>
where
    F: Fn(&CollectionItemDetail) -> bool,
{
    if options.max_concurrent == 0 {
        return Err(CollectionError::InvalidArgument(
            "max_concurrent must be at least 1".to_string(),
        ));
    }

    let mut outcome = BatchOutcome::default();
    if options.target == Some(0) {
        outcome.unvisited = refs.len();
        return Ok(outcome);
    }

    let mut attempted = 0usize;
    let mut connect_failures = 0usize;

    for (chunk_index, chunk) in refs.chunks(options.max_concurrent).enumerate() {
        debug!(
            "Batch chunk {}: looking up {} item(s)",
            chunk_index,
            chunk.len()
        );

        let settled = join_all(chunk.iter().map(|&id| async move {
            let result = source.fetch_detail(id).await;
            (id, result)
        }))
        .await;
        attempted += chunk.len();

        let mut fatal = None;
        for (id, result) in settled {
            match result {
                Ok(detail) if is_valid(&detail) => outcome.items.push(detail),
                Ok(_) => {
                    debug!("Dropping item {}: failed validity check", id);
                    outcome.dropped.push(DroppedRef {
                        id,
                        reason: DropReason::Invalid,
                    });
                }
                Err(e) if e.is_fatal() => {
                    fatal.get_or_insert(e);
                }
                Err(e) => {
                    warn!("Dropping item {}: {}", id, e);
                    if e.is_connect() {
                        connect_failures += 1;
                    }
                    outcome.dropped.push(DroppedRef {
                        id,
                        reason: DropReason::Lookup(e),
                    });
                }
            }
        }

        if let Some(e) = fatal {
            warn!("Batch aborted after chunk {}: {}", chunk_index, e);
            return Err(e);
        }

        if let Some(target) = options.target {
            if outcome.items.len() >= target {
                outcome.items.truncate(target);
                outcome.unvisited = refs.len() - attempted;
                break;
            }
        }
    }

    if attempted > 0 && connect_failures == attempted {
        return Err(CollectionError::Unavailable(format!(
            "all {} lookups failed to connect",
            attempted
        )));
    }

    info!(
        "Batch fetched {} item(s) from {} ref(s) ({} dropped, {} not visited)",
        outcome.items.len(),
        refs.len(),
        outcome.dropped.len(),
        outcome.unvisited
    );

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::test_support::{detail, Event, Fail, MockSource};

    fn ids(outcome: &BatchOutcome) -> Vec<u64> {
        outcome.items.iter().map(|d| d.id.0).collect()
    }

    fn refs(ids: &[u64]) -> Vec<ItemRef> {
        ids.iter().copied().map(ItemRef).collect()
    }

    fn accept_all(_: &CollectionItemDetail) -> bool {
        true
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_refs_returns_empty() {
        let source = MockSource::new();
        let outcome = fetch_batch(&source, &[], BatchOptions::new(4), accept_all)
            .await
            .unwrap();
        assert!(outcome.items.is_empty());
        assert!(outcome.dropped.is_empty());
        assert_eq!(source.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_concurrency_is_rejected() {
        let source = MockSource::new().with_items(&[1]);
        let err = fetch_batch(&source, &refs(&[1]), BatchOptions::new(0), accept_all)
            .await
            .unwrap_err();
        assert!(matches!(err, CollectionError::InvalidArgument(_)));
        assert_eq!(source.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_lookup_is_dropped_and_rest_continue() {
        let source = MockSource::new()
            .with_items(&[1, 3])
            .with_failure(2, Fail::NotFound);

        let outcome = fetch_batch(&source, &refs(&[1, 2, 3]), BatchOptions::new(2), accept_all)
            .await
            .unwrap();

        assert_eq!(ids(&outcome), vec![1, 3]);
        assert_eq!(outcome.dropped.len(), 1);
        assert_eq!(outcome.dropped[0].id, ItemRef(2));
        assert!(matches!(
            outcome.dropped[0].reason,
            DropReason::Lookup(CollectionError::NotFound(ItemRef(2)))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_items_are_dropped() {
        let source = MockSource::new()
            .with_detail(detail(1, "With image", true))
            .with_detail(detail(2, "No image", false))
            .with_detail(detail(3, "Also with image", true));

        let outcome = fetch_batch(
            &source,
            &refs(&[1, 2, 3]),
            BatchOptions::new(3),
            CollectionItemDetail::has_primary_image,
        )
        .await
        .unwrap();

        assert_eq!(ids(&outcome), vec![1, 3]);
        assert!(matches!(outcome.dropped[0].reason, DropReason::Invalid));
    }

    #[tokio::test(start_paused = true)]
    async fn test_output_follows_ref_order_not_arrival_order() {
        // Later refs resolve first.
        let source = MockSource::new()
            .with_items(&[1, 2, 3, 4, 5])
            .with_delay(1, 500)
            .with_delay(2, 400)
            .with_delay(3, 300)
            .with_delay(4, 200)
            .with_delay(5, 100);

        let outcome = fetch_batch(
            &source,
            &refs(&[1, 2, 3, 4, 5]),
            BatchOptions::new(5),
            accept_all,
        )
        .await
        .unwrap();

        assert_eq!(ids(&outcome), vec![1, 2, 3, 4, 5]);
        let finished: Vec<u64> = source
            .events()
            .into_iter()
            .filter_map(|e| match e {
                Event::End(id) => Some(id),
                Event::Start(_) => None,
            })
            .collect();
        assert_eq!(finished, vec![5, 4, 3, 2, 1]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_in_flight_never_exceeds_limit() {
        let all: Vec<u64> = (1..=20).collect();
        let mut source = MockSource::new().with_items(&all);
        for id in &all {
            source = source.with_delay(*id, 10 * (21 - *id));
        }

        let outcome = fetch_batch(&source, &refs(&all), BatchOptions::new(3), accept_all)
            .await
            .unwrap();

        assert_eq!(outcome.items.len(), 20);
        assert_eq!(source.peak_in_flight(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_chunks_run_sequentially() {
        let source = MockSource::new()
            .with_items(&[1, 2, 3, 4])
            .with_delay(1, 50)
            .with_delay(2, 300)
            .with_delay(3, 10)
            .with_delay(4, 10);

        fetch_batch(&source, &refs(&[1, 2, 3, 4]), BatchOptions::new(2), accept_all)
            .await
            .unwrap();

        let events = source.events();
        let first_chunk_done = events
            .iter()
            .position(|e| *e == Event::End(2))
            .unwrap();
        let second_chunk_start = events
            .iter()
            .position(|e| *e == Event::Start(3))
            .unwrap();
        assert!(
            first_chunk_done < second_chunk_start,
            "chunk 2 started before chunk 1 settled: {:?}",
            events
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_target_stops_after_reaching_count() {
        let all: Vec<u64> = (1..=10).collect();
        let source = MockSource::new().with_items(&all);

        let outcome = fetch_batch(
            &source,
            &refs(&all),
            BatchOptions::new(3).with_target(4),
            accept_all,
        )
        .await
        .unwrap();

        // Two chunks of three were needed; the sixth item is trimmed.
        assert_eq!(ids(&outcome), vec![1, 2, 3, 4]);
        assert_eq!(source.calls(), 6);
        assert_eq!(outcome.unvisited, 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_target_keeps_scanning_past_invalid_items() {
        let source = MockSource::new()
            .with_detail(detail(1, "a", false))
            .with_detail(detail(2, "b", false))
            .with_detail(detail(3, "c", true))
            .with_detail(detail(4, "d", true));

        let outcome = fetch_batch(
            &source,
            &refs(&[1, 2, 3, 4]),
            BatchOptions::new(2).with_target(1),
            CollectionItemDetail::has_primary_image,
        )
        .await
        .unwrap();

        assert_eq!(ids(&outcome), vec![3]);
        assert_eq!(outcome.unvisited, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unavailable_transport_fails_whole_batch() {
        let source = MockSource::new()
            .with_items(&[1, 3])
            .with_failure(2, Fail::Unavailable);

        let err = fetch_batch(&source, &refs(&[1, 2, 3]), BatchOptions::new(3), accept_all)
            .await
            .unwrap_err();
        assert!(matches!(err, CollectionError::Unavailable(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_every_lookup_failing_to_connect_is_unavailable() {
        let source = MockSource::new()
            .with_failure(1, Fail::Connect)
            .with_failure(2, Fail::Connect);

        let err = fetch_batch(&source, &refs(&[1, 2]), BatchOptions::new(1), accept_all)
            .await
            .unwrap_err();
        assert!(matches!(err, CollectionError::Unavailable(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_some_connect_failures_are_tolerated() {
        let source = MockSource::new()
            .with_items(&[2])
            .with_failure(1, Fail::Connect)
            .with_failure(3, Fail::Timeout);

        let outcome = fetch_batch(&source, &refs(&[1, 2, 3]), BatchOptions::new(2), accept_all)
            .await
            .unwrap();
        assert_eq!(ids(&outcome), vec![2]);
        assert_eq!(outcome.dropped_count(), 2);
    }
}
