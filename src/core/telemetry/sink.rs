use std::sync::Arc;

use super::metrics::MetricSnapshot;

/// Consumer of record for finished snapshots.
///
/// Both methods are only ever called from the orchestrator's publisher task,
/// one at a time, so implementations see a strictly serialized stream.
pub trait SnapshotSink: Send + Sync {
    fn publish(&self, snapshot: &MetricSnapshot);

    /// Returns the consumer to its "no data" state after monitoring stops.
    fn reset(&self);
}

impl<T: SnapshotSink + ?Sized> SnapshotSink for Arc<T> {
    fn publish(&self, snapshot: &MetricSnapshot) {
        (**self).publish(snapshot)
    }

    fn reset(&self) {
        (**self).reset()
    }
}
