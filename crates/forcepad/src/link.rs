//! Transport seam and connection bookkeeping
//!
//! The classifier only ever needs two things from the radio: the time since
//! the current connection was opened, and a way to push a record to the
//! peer. [`Link`] is that seam.
//!
//! The radio stack reports connection changes from its own callback context.
//! Those are turned into [`LinkEvent`] values and applied to a
//! [`ConnectionTracker`], which the transport keeps behind whatever lock its
//! platform provides.

/// Fire-and-forget transport to the connected peer
pub trait Link {
    /// Milliseconds since the current connection opened; 0 when idle
    fn elapsed_ms(&self) -> u32;

    /// Push `payload` to the peer
    ///
    /// Dropped silently when nobody is connected or subscribed. There is no
    /// delivery confirmation, queue or backpressure.
    fn send(&self, payload: &[u8]);
}

impl<T: Link + ?Sized> Link for &T {
    fn elapsed_ms(&self) -> u32 {
        (**self).elapsed_ms()
    }

    fn send(&self, payload: &[u8]) {
        (**self).send(payload)
    }
}

/// A link that is never connected
///
/// Used when the radio could not be brought up, so polling can continue.
#[derive(Clone, Copy, Debug, Default)]
pub struct Offline;

impl Link for Offline {
    fn elapsed_ms(&self) -> u32 {
        0
    }

    fn send(&self, _payload: &[u8]) {}
}

/// Connection lifecycle notifications from the radio stack
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LinkEvent {
    /// A central connected; `at_ms` is the monotonic uptime at that moment
    Connected { conn_id: u16, at_ms: u64 },
    /// A central disconnected
    Disconnected { conn_id: u16 },
    /// The central wrote the notification bit of the CCC descriptor
    NotifyChanged { conn_id: u16, enabled: bool },
}

/// What a [`LinkEvent`] did to the tracker
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transition {
    Opened,
    Closed,
    Subscribed,
    Unsubscribed,
    /// The event did not concern the active connection
    Ignored,
}

/// The single active connection
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Connection {
    pub conn_id: u16,
    /// Monotonic uptime when the connection opened
    pub since_ms: u64,
    /// Whether the peer enabled notifications
    pub notify_enabled: bool,
}

/// At most one central at a time
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ConnectionTracker {
    active: Option<Connection>,
}

impl ConnectionTracker {
    pub const fn new() -> Self {
        Self { active: None }
    }

    pub fn apply(&mut self, event: LinkEvent) -> Transition {
        match event {
            LinkEvent::Connected { conn_id, at_ms } => {
                if self.active.is_some() {
                    return Transition::Ignored;
                }
                self.active = Some(Connection {
                    conn_id,
                    since_ms: at_ms,
                    notify_enabled: false,
                });
                Transition::Opened
            }
            LinkEvent::Disconnected { conn_id } => match self.active {
                Some(active) if active.conn_id == conn_id => {
                    self.active = None;
                    Transition::Closed
                }
                _ => Transition::Ignored,
            },
            LinkEvent::NotifyChanged { conn_id, enabled } => match self.active.as_mut() {
                Some(active) if active.conn_id == conn_id => {
                    active.notify_enabled = enabled;
                    if enabled {
                        Transition::Subscribed
                    } else {
                        Transition::Unsubscribed
                    }
                }
                _ => Transition::Ignored,
            },
        }
    }

    pub fn active(&self) -> Option<&Connection> {
        self.active.as_ref()
    }

    pub fn is_connected(&self) -> bool {
        self.active.is_some()
    }

    /// Connection that currently accepts notifications
    pub fn notify_target(&self) -> Option<u16> {
        self.active
            .filter(|conn| conn.notify_enabled)
            .map(|conn| conn.conn_id)
    }

    /// Time since the active connection opened, truncated to `u32`; 0 when idle
    pub fn elapsed_ms(&self, now_ms: u64) -> u32 {
        self.active
            .map(|conn| now_ms.saturating_sub(conn.since_ms) as u32)
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_clock_reads_zero() {
        let tracker = ConnectionTracker::new();
        assert_eq!(tracker.elapsed_ms(123_456), 0);
        assert_eq!(tracker.notify_target(), None);
    }

    #[test]
    fn clock_counts_from_connection() {
        let mut tracker = ConnectionTracker::new();
        assert_eq!(
            tracker.apply(LinkEvent::Connected {
                conn_id: 0,
                at_ms: 10_000
            }),
            Transition::Opened
        );
        assert_eq!(tracker.elapsed_ms(12_345), 2_345);
    }

    #[test]
    fn second_central_is_ignored() {
        let mut tracker = ConnectionTracker::new();
        tracker.apply(LinkEvent::Connected { conn_id: 1, at_ms: 0 });
        assert_eq!(
            tracker.apply(LinkEvent::Connected {
                conn_id: 2,
                at_ms: 50
            }),
            Transition::Ignored
        );
        assert_eq!(
            tracker.apply(LinkEvent::Disconnected { conn_id: 2 }),
            Transition::Ignored
        );
        assert_eq!(tracker.active().map(|c| c.conn_id), Some(1));
    }

    #[test]
    fn notify_needs_subscription() {
        let mut tracker = ConnectionTracker::new();
        tracker.apply(LinkEvent::Connected { conn_id: 3, at_ms: 0 });
        assert_eq!(tracker.notify_target(), None);

        assert_eq!(
            tracker.apply(LinkEvent::NotifyChanged {
                conn_id: 3,
                enabled: true
            }),
            Transition::Subscribed
        );
        assert_eq!(tracker.notify_target(), Some(3));

        tracker.apply(LinkEvent::NotifyChanged {
            conn_id: 3,
            enabled: false,
        });
        assert_eq!(tracker.notify_target(), None);
    }

    #[test]
    fn disconnect_resets_clock_and_subscription() {
        let mut tracker = ConnectionTracker::new();
        tracker.apply(LinkEvent::Connected { conn_id: 0, at_ms: 0 });
        tracker.apply(LinkEvent::NotifyChanged {
            conn_id: 0,
            enabled: true,
        });
        assert_eq!(
            tracker.apply(LinkEvent::Disconnected { conn_id: 0 }),
            Transition::Closed
        );
        assert!(!tracker.is_connected());
        assert_eq!(tracker.elapsed_ms(99_999), 0);

        tracker.apply(LinkEvent::Connected {
            conn_id: 0,
            at_ms: 100_000,
        });
        assert_eq!(tracker.notify_target(), None);
        assert_eq!(tracker.elapsed_ms(100_250), 250);
    }
}
