//! Rotation timing: which member of a rotation is on screen right now.
//!
//! [`RotationCursor`] is the pure index arithmetic. [`RotationTicker`]
//! drives a cursor from a Tokio interval and publishes the current index
//! through a `watch` channel. Each ticker is owned by a single consumer
//! (one `WebSocket` connection); there is no shared clock across consumers.

use std::time::Duration;

use affiliate_types::{BannerId, BannerRotation, RotationId};
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Errors raised when constructing or reading a rotation timer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RotationError {
    /// A rotation needs at least one member to display.
    #[error("rotation has no members")]
    Empty,

    /// A zero display interval would spin.
    #[error("rotation interval must be greater than zero")]
    ZeroInterval,

    /// The ticker task has stopped publishing.
    #[error("rotation ticker stopped")]
    Stopped,
}

/// Index into a rotation's member list, wrapping at the end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RotationCursor {
    len: usize,
    index: usize,
}

impl RotationCursor {
    /// A cursor over `len` members, positioned at the first.
    pub const fn new(len: usize) -> Result<Self, RotationError> {
        if len == 0 {
            return Err(RotationError::Empty);
        }
        Ok(Self { len, index: 0 })
    }

    /// Currently displayed position.
    pub const fn current(&self) -> usize {
        self.index
    }

    /// Number of members cycled through.
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Always false; an empty cursor cannot be constructed.
    pub const fn is_empty(&self) -> bool {
        false
    }

    /// Step to the next member, wrapping to 0 after the last.
    pub const fn advance(&mut self) -> usize {
        self.index = match self.index.checked_add(1) {
            Some(next) if next < self.len => next,
            _ => 0,
        };
        self.index
    }

    /// Position after `ticks` further advances from the current one.
    pub fn position_after(&self, ticks: u64) -> usize {
        let len = u64::try_from(self.len).unwrap_or(u64::MAX);
        let step = usize::try_from(ticks % len).unwrap_or(0);
        self.index.checked_add(step).map_or(0, |sum| sum % self.len)
    }
}

/// One frame of a rotation stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RotationFrame {
    /// The rotation being displayed.
    pub rotation_id: RotationId,
    /// Position within `banner_ids`.
    pub index: usize,
    /// Banner at that position.
    pub banner_id: BannerId,
}

impl RotationFrame {
    /// Frame for `rotation` at `index`, or `None` when out of range.
    pub fn at(rotation: &BannerRotation, index: usize) -> Option<Self> {
        rotation.banner_ids.get(index).map(|&banner_id| Self {
            rotation_id: rotation.id,
            index,
            banner_id,
        })
    }
}

/// A background task that advances a [`RotationCursor`] on a fixed interval.
///
/// Index 0 is current from construction. The task is aborted when the
/// ticker is dropped.
#[derive(Debug)]
pub struct RotationTicker {
    rx: watch::Receiver<usize>,
    handle: JoinHandle<()>,
}

impl RotationTicker {
    /// Start a ticker over `len` members advancing every `period`.
    ///
    /// Must be called inside a Tokio runtime.
    pub fn spawn(len: usize, period: Duration) -> Result<Self, RotationError> {
        if period.is_zero() {
            return Err(RotationError::ZeroInterval);
        }
        let mut cursor = RotationCursor::new(len)?;
        let (tx, rx) = watch::channel(cursor.current());

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately; index 0 is already shown.
            interval.tick().await;
            loop {
                interval.tick().await;
                if tx.send(cursor.advance()).is_err() {
                    break;
                }
            }
        });

        Ok(Self { rx, handle })
    }

    /// Start a ticker for a stored rotation.
    pub fn for_rotation(rotation: &BannerRotation) -> Result<Self, RotationError> {
        Self::spawn(
            rotation.banner_ids.len(),
            Duration::from_millis(rotation.rotation_duration_ms),
        )
    }

    /// The index currently on screen.
    pub fn current(&self) -> usize {
        *self.rx.borrow()
    }

    /// Wait for the next advance and return the new index.
    pub async fn changed(&mut self) -> Result<usize, RotationError> {
        self.rx
            .changed()
            .await
            .map_err(|_closed| RotationError::Stopped)?;
        Ok(*self.rx.borrow_and_update())
    }

    /// An independent receiver of index updates.
    pub fn subscribe(&self) -> watch::Receiver<usize> {
        self.rx.clone()
    }
}

impl Drop for RotationTicker {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::indexing_slicing)]

    use tokio::time::Instant;

    use super::*;

    #[test]
    fn cursor_wraps_for_every_valid_size() {
        for len in 2..=5 {
            let mut cursor = RotationCursor::new(len).unwrap();
            let mut seen = vec![cursor.current()];
            for _ in 1..len {
                seen.push(cursor.advance());
            }
            assert_eq!(seen, (0..len).collect::<Vec<_>>());
            assert_eq!(cursor.advance(), 0);
        }
    }

    #[test]
    fn cursor_rejects_empty() {
        assert_eq!(RotationCursor::new(0), Err(RotationError::Empty));
    }

    #[test]
    fn position_after_matches_repeated_advance() {
        let mut cursor = RotationCursor::new(3).unwrap();
        cursor.advance();
        assert_eq!(cursor.position_after(0), 1);
        assert_eq!(cursor.position_after(2), 0);
        assert_eq!(cursor.position_after(7), 2);
    }

    #[test]
    fn frame_reports_member_at_index() {
        let ids = [BannerId::new(), BannerId::new()];
        let rotation = BannerRotation {
            id: RotationId::new(),
            name: "r".to_owned(),
            banner_ids: ids.to_vec(),
            section: affiliate_types::Section::Top,
            rotation_duration_ms: 1000,
            expires_at: None,
            created_at: chrono::Utc::now(),
        };
        assert_eq!(RotationFrame::at(&rotation, 1).unwrap().banner_id, ids[1]);
        assert!(RotationFrame::at(&rotation, 2).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn ticker_cycles_on_interval() {
        let start = Instant::now();
        let mut ticker = RotationTicker::spawn(3, Duration::from_millis(1000)).unwrap();
        assert_eq!(ticker.current(), 0);

        assert_eq!(ticker.changed().await.unwrap(), 1);
        assert_eq!(ticker.changed().await.unwrap(), 2);
        assert_eq!(ticker.changed().await.unwrap(), 0);
        assert!(start.elapsed() >= Duration::from_millis(3000));
    }

    #[tokio::test(start_paused = true)]
    async fn ticker_rejects_zero_interval() {
        assert!(matches!(
            RotationTicker::spawn(2, Duration::ZERO),
            Err(RotationError::ZeroInterval)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_ticker_stops_updates() {
        let ticker = RotationTicker::spawn(2, Duration::from_millis(500)).unwrap();
        let mut rx = ticker.subscribe();
        drop(ticker);
        assert!(rx.changed().await.is_err());
    }
}
