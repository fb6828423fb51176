//! Lazy forward pagination over ascending-id collections.
//!
//! The remote service returns bounded pages ordered by id. A
//! [`ForwardPaginator`] walks them lazily: it fetches the next page only once
//! the previous one has been consumed, and stops at the first short page.

use crate::supplier::{failed_stream, EntityStream};
use async_stream::stream;
use concord_core::{ConcordError, ConcordResult, ConfigError, Snowflake};
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

/// Reusable description of a paginated collection.
///
/// `fetch(cursor, limit)` must return up to `limit` items with ids strictly
/// greater than `cursor` (or from the start when `cursor` is `None`), in
/// ascending id order. `id_of` extracts the id used as the next cursor.
pub struct ForwardPaginator<T, S, F> {
    batch_size: usize,
    id_of: Arc<S>,
    fetch: Arc<F>,
    _item: PhantomData<fn() -> T>,
}

impl<T, S, F, Fut> ForwardPaginator<T, S, F>
where
    T: Send + 'static,
    S: Fn(&T) -> Snowflake + Send + Sync + 'static,
    F: Fn(Option<Snowflake>, usize) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ConcordResult<Vec<T>>> + Send + 'static,
{
    pub fn new(batch_size: usize, id_of: S, fetch: F) -> Self {
        Self {
            batch_size,
            id_of: Arc::new(id_of),
            fetch: Arc::new(fetch),
            _item: PhantomData,
        }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Walk the collection from the beginning.
    pub fn stream(&self) -> EntityStream<T> {
        self.stream_from(None)
    }

    /// Walk the collection starting after `cursor`.
    pub fn stream_after(&self, cursor: Snowflake) -> EntityStream<T> {
        self.stream_from(Some(cursor))
    }

    fn stream_from(&self, start: Option<Snowflake>) -> EntityStream<T> {
        let batch_size = self.batch_size;
        if batch_size == 0 {
            return failed_stream(ConfigError::InvalidBatchSize { batch_size }.into());
        }
        let id_of = Arc::clone(&self.id_of);
        let fetch = Arc::clone(&self.fetch);

        Box::pin(stream! {
            let mut cursor = start;
            loop {
                tracing::debug!(cursor = ?cursor, batch_size, "Fetching page");
                let page = match fetch(cursor, batch_size).await {
                    Ok(page) => page,
                    Err(e) => {
                        yield Err(e);
                        return;
                    }
                };
                let page_len = page.len();

                for item in page {
                    let id = id_of(&item);
                    if let Some(previous) = cursor {
                        if id <= previous {
                            tracing::warn!(
                                cursor = %previous,
                                id = %id,
                                "Page item out of ascending order"
                            );
                            yield Err(ConcordError::PaginationOrder { cursor: previous, id });
                            return;
                        }
                    }
                    cursor = Some(id);
                    yield Ok(item);
                }

                if page_len < batch_size {
                    break;
                }
            }
        })
    }
}

/// One-shot form of [`ForwardPaginator::stream`].
pub fn paginate_forwards<T, S, F, Fut>(batch_size: usize, id_of: S, fetch: F) -> EntityStream<T>
where
    T: Send + 'static,
    S: Fn(&T) -> Snowflake + Send + Sync + 'static,
    F: Fn(Option<Snowflake>, usize) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ConcordResult<Vec<T>>> + Send + 'static,
{
    ForwardPaginator::new(batch_size, id_of, fetch).stream()
}

#[cfg(test)]
mod tests {
    use super::*;
    use concord_core::RequestError;
    use futures::future::Ready;
    use futures::{StreamExt, TryStreamExt};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Serves ids `1..=total` in ascending pages, counting calls.
    fn numbered(
        total: u64,
        calls: Arc<AtomicUsize>,
    ) -> impl Fn(Option<Snowflake>, usize) -> Ready<ConcordResult<Vec<u64>>> + Send + Sync + 'static
    {
        move |cursor, limit| {
            calls.fetch_add(1, Ordering::SeqCst);
            let start = cursor.map(|c| c.value() + 1).unwrap_or(1);
            let page: Vec<u64> = (start..=total).take(limit).collect();
            futures::future::ready(Ok(page))
        }
    }

    #[tokio::test]
    async fn test_two_pages_then_short_page_stops() {
        let calls = Arc::new(AtomicUsize::new(0));
        let items: Vec<u64> = paginate_forwards(100, |id: &u64| Snowflake::new(*id), numbered(150, calls.clone()))
            .try_collect()
            .await
            .unwrap();
        assert_eq!(items, (1..=150).collect::<Vec<_>>());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_single_short_page() {
        let calls = Arc::new(AtomicUsize::new(0));
        let items: Vec<u64> = paginate_forwards(100, |id: &u64| Snowflake::new(*id), numbered(30, calls.clone()))
            .try_collect()
            .await
            .unwrap();
        assert_eq!(items.len(), 30);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_empty_first_page_fetches_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let items: Vec<u64> = paginate_forwards(10, |id: &u64| Snowflake::new(*id), numbered(0, calls.clone()))
            .try_collect()
            .await
            .unwrap();
        assert!(items.is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_exact_multiple_needs_trailing_empty_page() {
        let calls = Arc::new(AtomicUsize::new(0));
        let items: Vec<u64> = paginate_forwards(50, |id: &u64| Snowflake::new(*id), numbered(100, calls.clone()))
            .try_collect()
            .await
            .unwrap();
        assert_eq!(items.len(), 100);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_zero_batch_size_fails_without_fetching() {
        let calls = Arc::new(AtomicUsize::new(0));
        let err = paginate_forwards(0, |id: &u64| Snowflake::new(*id), numbered(10, calls.clone()))
            .try_collect::<Vec<_>>()
            .await
            .unwrap_err();
        assert_eq!(err, ConcordError::Config(ConfigError::InvalidBatchSize { batch_size: 0 }));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_failure_after_items_preserves_emitted() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let fetch = move |cursor: Option<Snowflake>, limit: usize| {
            counter.fetch_add(1, Ordering::SeqCst);
            let result: ConcordResult<Vec<u64>> = match cursor {
                None => Ok((1..=limit as u64).collect()),
                Some(_) => Err(ConcordError::Request(RequestError::Transport {
                    route: "GET /guilds/1/members".to_string(),
                    reason: "connection reset".to_string(),
                })),
            };
            futures::future::ready(result)
        };

        let results: Vec<ConcordResult<u64>> =
            paginate_forwards(5, |id: &u64| Snowflake::new(*id), fetch).collect().await;
        assert_eq!(results.len(), 6);
        assert!(results[..5].iter().all(|r| r.is_ok()));
        assert!(matches!(results[5], Err(ConcordError::Request(RequestError::Transport { .. }))));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_repeated_page_is_order_violation() {
        let fetch = |_cursor: Option<Snowflake>, _limit: usize| futures::future::ready(Ok(vec![1u64, 2]));
        let results: Vec<ConcordResult<u64>> =
            paginate_forwards(2, |id: &u64| Snowflake::new(*id), fetch).collect().await;
        assert_eq!(results.len(), 3);
        assert_eq!(
            results[2],
            Err(ConcordError::PaginationOrder {
                cursor: Snowflake::new(2),
                id: Snowflake::new(1)
            })
        );
    }

    #[tokio::test]
    async fn test_stream_after_resumes_and_restarts() {
        let calls = Arc::new(AtomicUsize::new(0));
        let paginator = ForwardPaginator::new(10, |id: &u64| Snowflake::new(*id), numbered(25, calls.clone()));

        let resumed: Vec<u64> = paginator.stream_after(Snowflake::new(20)).try_collect().await.unwrap();
        assert_eq!(resumed, vec![21, 22, 23, 24, 25]);

        let restarted: Vec<u64> = paginator.stream().try_collect().await.unwrap();
        assert_eq!(restarted.len(), 25);
        assert_eq!(paginator.batch_size(), 10);
    }

    #[tokio::test]
    async fn test_fetch_is_lazy_and_cursor_advances() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let log = seen.clone();
        let fetch = move |cursor: Option<Snowflake>, limit: usize| {
            log.lock().unwrap().push(cursor);
            let start = cursor.map(|c| c.value() + 1).unwrap_or(1);
            futures::future::ready(Ok((start..start + limit as u64).collect::<Vec<u64>>()))
        };
        let mut stream = paginate_forwards(3, |id: &u64| Snowflake::new(*id), fetch);
        assert!(seen.lock().unwrap().is_empty());

        let first_four: Vec<u64> = stream.by_ref().take(4).try_collect().await.unwrap();
        assert_eq!(first_four, vec![1, 2, 3, 4]);
        assert_eq!(*seen.lock().unwrap(), vec![None, Some(Snowflake::new(3))]);
    }
}
