//! Trigger classification
//!
//! One poll cycle scans the channels in index order:
//!
//! - a momentary channel (0..4) above [`PRESSURE_THRESHOLD`] wins immediately
//!   and ends the scan, so later channels are not even read;
//! - a latched channel (4..6) produces a candidate only when its sample
//!   crosses [`LATCH_THRESHOLD`] to the side opposite its current latch, and
//!   the latch flips right there;
//! - a channel whose sample is unavailable is skipped.
//!
//! The candidate is then checked against the debounce window. A suppressed
//! candidate leaves any latch flip in place.

use crate::config::{
    ButtonKind, CHANNEL_COUNT, DEBOUNCE_INTERVAL_MS, LATCH_THRESHOLD, LATCHED_CHANNELS,
    MOMENTARY_CHANNELS, PRESSURE_THRESHOLD,
};
use crate::packet::{DeviceClass, EventRecord};

/// The channel that won a scan
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Candidate {
    pub channel: usize,
    /// Latched channel going from on to off
    pub release: bool,
}

impl Candidate {
    pub fn kind(&self) -> ButtonKind {
        ButtonKind::of(self.channel)
    }

    /// Value of the record's on/off byte
    pub fn latched_on(&self) -> bool {
        self.kind() == ButtonKind::Latched && !self.release
    }
}

/// Outcome of one poll cycle
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
    /// No channel crossed a threshold
    Idle,
    /// A candidate was found inside the debounce window
    Debounced { candidate: Candidate, now_ms: u32 },
    /// A candidate was accepted and encoded
    Accepted(EventRecord),
}

impl Verdict {
    pub fn record(&self) -> Option<EventRecord> {
        match self {
            Verdict::Accepted(record) => Some(*record),
            _ => None,
        }
    }
}

/// Persistent state of the trigger detector
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TriggerClassifier {
    /// On/off state of each latched channel, indexed by `channel - MOMENTARY_CHANNELS`
    latches: [bool; LATCHED_CHANNELS],
    /// Connection clock value of the last accepted trigger
    last_trigger_ms: Option<u32>,
}

impl TriggerClassifier {
    /// Both latches off, no trigger accepted yet
    pub fn new() -> Self {
        Self::default()
    }

    /// Latch state of a latched channel; `None` for momentary or unknown channels
    pub fn latch(&self, channel: usize) -> Option<bool> {
        channel
            .checked_sub(MOMENTARY_CHANNELS)
            .and_then(|idx| self.latches.get(idx))
            .copied()
    }

    pub fn last_trigger_ms(&self) -> Option<u32> {
        self.last_trigger_ms
    }

    /// Scan the channels in priority order and update latches
    ///
    /// `sample` is called at most once per channel, in index order, and
    /// returns `None` for a failed read.
    pub fn scan<F>(&mut self, mut sample: F) -> Option<Candidate>
    where
        F: FnMut(usize) -> Option<i16>,
    {
        let mut candidate = None;

        for channel in 0..CHANNEL_COUNT {
            let Some(value) = sample(channel) else {
                continue;
            };

            match ButtonKind::of(channel) {
                ButtonKind::Momentary => {
                    if value > PRESSURE_THRESHOLD {
                        return Some(Candidate {
                            channel,
                            release: false,
                        });
                    }
                }
                ButtonKind::Latched => {
                    let latch = &mut self.latches[channel - MOMENTARY_CHANNELS];
                    let above = value > LATCH_THRESHOLD;
                    if above != *latch {
                        *latch = above;
                        candidate = Some(Candidate {
                            channel,
                            release: !above,
                        });
                    }
                }
            }
        }

        candidate
    }

    /// Apply the debounce window to a candidate
    ///
    /// The window is measured with wrapping arithmetic so a connection clock
    /// that restarted at zero never lands inside the previous connection's
    /// window.
    pub fn accept(&mut self, candidate: Candidate, now_ms: u32) -> Option<EventRecord> {
        if let Some(last) = self.last_trigger_ms {
            if now_ms.wrapping_sub(last) < DEBOUNCE_INTERVAL_MS {
                return None;
            }
        }

        self.last_trigger_ms = Some(now_ms);
        Some(EventRecord::new(
            now_ms,
            candidate.channel as u8,
            DeviceClass::Toy,
            candidate.latched_on(),
        ))
    }

    /// Run one full cycle; `clock` is only consulted when a candidate exists
    pub fn poll<F, C>(&mut self, sample: F, clock: C) -> Verdict
    where
        F: FnMut(usize) -> Option<i16>,
        C: FnOnce() -> u32,
    {
        let Some(candidate) = self.scan(sample) else {
            return Verdict::Idle;
        };

        let now_ms = clock();
        match self.accept(candidate, now_ms) {
            Some(record) => Verdict::Accepted(record),
            None => Verdict::Debounced { candidate, now_ms },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn samples(values: [Option<i16>; CHANNEL_COUNT]) -> impl FnMut(usize) -> Option<i16> {
        move |channel| values[channel]
    }

    fn quiet() -> [Option<i16>; CHANNEL_COUNT] {
        [Some(0); CHANNEL_COUNT]
    }

    fn with(channel: usize, value: i16) -> [Option<i16>; CHANNEL_COUNT] {
        let mut values = quiet();
        values[channel] = Some(value);
        values
    }

    #[test]
    fn each_momentary_channel_triggers() {
        for channel in 0..MOMENTARY_CHANNELS {
            let mut classifier = TriggerClassifier::new();
            let record = classifier
                .poll(samples(with(channel, 300)), || 0)
                .record()
                .unwrap();
            assert_eq!(record.as_bytes(), &[0, 0, 0, channel as u8, 0, 0]);
        }
    }

    #[test]
    fn momentary_threshold_is_exclusive() {
        let mut classifier = TriggerClassifier::new();
        assert_eq!(classifier.poll(samples(with(1, 250)), || 0), Verdict::Idle);
        assert!(classifier.poll(samples(with(1, 251)), || 0).record().is_some());
    }

    #[test]
    fn first_momentary_wins_and_stops_scan() {
        let mut classifier = TriggerClassifier::new();
        let mut read = [false; CHANNEL_COUNT];
        let candidate = classifier.scan(|channel| {
            read[channel] = true;
            Some(if channel == 1 || channel == 2 || channel == 4 { 999 } else { 0 })
        });
        assert_eq!(
            candidate,
            Some(Candidate {
                channel: 1,
                release: false
            })
        );
        assert_eq!(read, [true, true, false, false, false, false]);
        assert_eq!(classifier.latch(4), Some(false));
    }

    #[test]
    fn latched_press_and_release() {
        let mut classifier = TriggerClassifier::new();

        let on = classifier.poll(samples(with(5, 401)), || 0).record().unwrap();
        assert_eq!(on.as_bytes(), &[0, 0, 0, 5, 0, 1]);
        assert_eq!(classifier.latch(5), Some(true));

        assert_eq!(classifier.poll(samples(with(5, 900)), || 3000), Verdict::Idle);

        let off = classifier
            .poll(samples(with(5, 400)), || 3000)
            .record()
            .unwrap();
        assert_eq!(off.channel(), 5);
        assert!(!off.latched_on());
        assert_eq!(classifier.latch(5), Some(false));
    }

    #[test]
    fn latch_held_low_is_idle() {
        let mut classifier = TriggerClassifier::new();
        assert_eq!(classifier.poll(samples(quiet()), || 0), Verdict::Idle);
        assert_eq!(classifier.latch(4), Some(false));
    }

    #[test]
    fn debounced_latch_still_flips() {
        let mut classifier = TriggerClassifier::new();
        classifier.poll(samples(with(4, 500)), || 0).record().unwrap();

        let verdict = classifier.poll(samples(with(4, 100)), || 100);
        assert_eq!(
            verdict,
            Verdict::Debounced {
                candidate: Candidate {
                    channel: 4,
                    release: true
                },
                now_ms: 100
            }
        );
        assert_eq!(classifier.latch(4), Some(false));
        assert_eq!(classifier.last_trigger_ms(), Some(0));
    }

    #[test]
    fn failed_read_leaves_latch_alone() {
        let mut classifier = TriggerClassifier::new();
        classifier.poll(samples(with(4, 500)), || 0);

        let mut values = quiet();
        values[4] = None;
        assert_eq!(classifier.poll(samples(values), || 5000), Verdict::Idle);
        assert_eq!(classifier.latch(4), Some(true));
    }

    #[test]
    fn later_latched_channel_is_candidate() {
        let mut classifier = TriggerClassifier::new();
        let mut values = quiet();
        values[4] = Some(500);
        values[5] = Some(500);
        let record = classifier.poll(samples(values), || 0).record().unwrap();
        assert_eq!(record.channel(), 5);
        assert_eq!(classifier.latch(4), Some(true));
        assert_eq!(classifier.latch(5), Some(true));
    }

    #[test]
    fn clock_only_read_with_candidate() {
        let mut classifier = TriggerClassifier::new();
        let verdict = classifier.poll(samples(quiet()), || panic!("clock read while idle"));
        assert_eq!(verdict, Verdict::Idle);
    }

    #[test]
    fn window_edges() {
        let mut classifier = TriggerClassifier::new();
        classifier.poll(samples(with(0, 300)), || 1000);
        assert!(classifier.poll(samples(with(0, 300)), || 2499).record().is_none());
        assert!(classifier.poll(samples(with(0, 300)), || 2500).record().is_some());
    }

    #[test]
    fn restarted_clock_is_outside_window() {
        let mut classifier = TriggerClassifier::new();
        classifier.poll(samples(with(2, 300)), || 60_000);
        let record = classifier.poll(samples(with(2, 300)), || 40).record();
        assert_eq!(record.map(|r| r.timestamp_ms()), Some(40));
    }

    #[test]
    fn latch_query_rejects_momentary() {
        let classifier = TriggerClassifier::new();
        assert_eq!(classifier.latch(0), None);
        assert_eq!(classifier.latch(3), None);
        assert_eq!(classifier.latch(CHANNEL_COUNT), None);
    }
}
