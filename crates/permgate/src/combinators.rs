//! Result combinators built on [`PermissionCoordinator::request`].
//!
//! Each combinator takes the same inputs as `request` and differs only in how
//! a batch of per-capability results is handed to the caller:
//! - [`ensure`] emits `true` when every capability in the batch is granted
//! - [`ensure_each`] emits every result as is
//! - [`ensure_each_combined`] emits one [`Permission::combine`]d result
//!
//! A batch that is cut short (upstream finished before all results arrived)
//! is dropped, so callers never see a verdict for a partial batch.

use tokio_stream::{Stream, StreamExt};
use tracing::debug;

use permgate_core::{Permission, Result};

use crate::coordinator::{BoxStream, PermissionCoordinator, PermissionStream};

/// Emit `true` if every capability in `names` is granted, `false` otherwise.
pub fn ensure<T, N>(
    coordinator: &PermissionCoordinator,
    trigger: T,
    names: &[N],
) -> Result<BoxStream<bool>>
where
    T: Stream + Send + 'static,
    N: AsRef<str>,
{
    let results = coordinator.request(trigger, names)?;
    let batches = batches(results, names.len());
    Ok(Box::pin(batches.map(|batch| batch.iter().all(Permission::granted))))
}

/// Emit one result per capability in `names`, in order.
pub fn ensure_each<T, N>(
    coordinator: &PermissionCoordinator,
    trigger: T,
    names: &[N],
) -> Result<PermissionStream>
where
    T: Stream + Send + 'static,
    N: AsRef<str>,
{
    coordinator.request(trigger, names)
}

/// Emit a single result combining every capability in `names`.
pub fn ensure_each_combined<T, N>(
    coordinator: &PermissionCoordinator,
    trigger: T,
    names: &[N],
) -> Result<BoxStream<Permission>>
where
    T: Stream + Send + 'static,
    N: AsRef<str>,
{
    let results = coordinator.request(trigger, names)?;
    let batches = batches(results, names.len());
    // Batches are never empty, so combining cannot fail.
    Ok(Box::pin(batches.filter_map(|batch| Permission::combine(&batch).ok())))
}

/// Group `results` into full batches of `size`, dropping a trailing partial one.
fn batches(
    mut results: PermissionStream,
    size: usize,
) -> impl Stream<Item = Vec<Permission>> + Send {
    async_stream::stream! {
        let mut batch = Vec::with_capacity(size);
        while let Some(permission) = results.next().await {
            batch.push(permission);
            if batch.len() == size {
                yield std::mem::replace(&mut batch, Vec::with_capacity(size));
            }
        }
        if !batch.is_empty() {
            debug!(
                received = batch.len(),
                expected = size,
                "Dropping incomplete permission batch"
            );
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use permgate_core::Error;
    use permgate_core::config::PlatformConfig;
    use tokio::sync::mpsc;

    use crate::host::PlatformGate;
    use crate::pending::PendingRegistry;
    use crate::testing::RecordingHost;

    fn setup() -> (
        PermissionCoordinator,
        Arc<RecordingHost>,
        mpsc::UnboundedReceiver<Vec<String>>,
    ) {
        let (host, rx) = RecordingHost::with_receiver();
        let gate = PlatformGate::new(host.clone(), PlatformConfig::default());
        (
            PermissionCoordinator::new(gate, PendingRegistry::new()),
            host,
            rx,
        )
    }

    #[tokio::test]
    async fn ensure_all_granted_is_true() {
        let (coordinator, host, _rx) = setup();
        host.grant("a");
        host.grant("b");

        let verdicts: Vec<bool> = ensure(&coordinator, tokio_stream::once(()), &["a", "b"])
            .unwrap()
            .collect()
            .await;

        assert_eq!(verdicts, vec![true]);
    }

    #[tokio::test]
    async fn ensure_any_denied_is_false() {
        let (coordinator, host, mut rx) = setup();
        host.grant("a");

        let task = tokio::spawn(
            ensure(&coordinator, tokio_stream::once(()), &["a", "b"])
                .unwrap()
                .collect::<Vec<_>>(),
        );
        rx.recv().await.unwrap();
        coordinator.on_prompt_result(&["b"], &[false]).await.unwrap();

        assert_eq!(task.await.unwrap(), vec![false]);
    }

    #[tokio::test]
    async fn ensure_drops_batch_cut_short() {
        let (coordinator, host, mut rx) = setup();
        host.grant("a");

        let task = tokio::spawn(
            ensure(&coordinator, tokio_stream::once(()), &["a", "b"])
                .unwrap()
                .collect::<Vec<_>>(),
        );
        rx.recv().await.unwrap();
        coordinator.registry().complete_all().await;

        assert!(task.await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn ensure_with_nothing_received_completes_silently() {
        let (coordinator, _host, mut rx) = setup();

        let first = tokio::spawn(
            ensure(&coordinator, tokio_stream::once(()), &["a"])
                .unwrap()
                .collect::<Vec<_>>(),
        );
        rx.recv().await.unwrap();

        let idle: Vec<bool> = ensure(&coordinator, tokio_stream::empty::<()>(), &["a"])
            .unwrap()
            .collect()
            .await;
        assert!(idle.is_empty());

        coordinator.on_prompt_result(&["a"], &[true]).await.unwrap();
        assert_eq!(first.await.unwrap(), vec![true]);
    }

    #[tokio::test]
    async fn ensure_each_passes_records_through() {
        let (coordinator, host, _rx) = setup();
        host.grant("a");
        host.revoke("b");

        let records: Vec<Permission> =
            ensure_each(&coordinator, tokio_stream::once(()), &["a", "b"])
                .unwrap()
                .collect()
                .await;

        assert_eq!(
            records,
            vec![Permission::new("a", true), Permission::new("b", false)]
        );
    }

    #[tokio::test]
    async fn ensure_each_combined_merges_batch() {
        let (coordinator, host, mut rx) = setup();
        host.grant("x");

        let task = tokio::spawn(
            ensure_each_combined(&coordinator, tokio_stream::once(()), &["x", "y"])
                .unwrap()
                .collect::<Vec<_>>(),
        );
        rx.recv().await.unwrap();
        coordinator.on_prompt_result(&["y"], &[false]).await.unwrap();

        assert_eq!(task.await.unwrap(), vec![Permission::new("x, y", false)]);
    }

    #[tokio::test]
    async fn ensure_each_combined_drops_batch_cut_short() {
        let (coordinator, _host, mut rx) = setup();

        let task = tokio::spawn(
            ensure_each_combined(&coordinator, tokio_stream::once(()), &["x", "y"])
                .unwrap()
                .collect::<Vec<_>>(),
        );
        rx.recv().await.unwrap();
        coordinator.on_prompt_result(&["x"], &[true]).await.unwrap();
        coordinator.registry().complete_all().await;

        assert!(task.await.unwrap().is_empty());
    }

    #[test]
    fn combinators_reject_empty_names() {
        let (coordinator, host, _rx) = setup();
        let names: [&str; 0] = [];

        assert!(matches!(
            ensure(&coordinator, tokio_stream::once(()), &names),
            Err(Error::NoCapabilities)
        ));
        assert!(matches!(
            ensure_each(&coordinator, tokio_stream::once(()), &names),
            Err(Error::NoCapabilities)
        ));
        assert!(matches!(
            ensure_each_combined(&coordinator, tokio_stream::once(()), &names),
            Err(Error::NoCapabilities)
        ));
        assert!(host.dispatched().is_empty());
    }
}
