//! One poll cycle: read, classify, send

use log::{debug, info};

use crate::classifier::{TriggerClassifier, Verdict};
use crate::interface::AdcInterface;
use crate::link::Link;
use crate::packet::EventRecord;
use crate::reader::ChannelReader;

/// Owns everything the polling loop mutates
pub struct Poller<A>
where
    A: AdcInterface,
{
    reader: ChannelReader<A>,
    classifier: TriggerClassifier,
}

impl<A> Poller<A>
where
    A: AdcInterface,
{
    /// Wrap a (normally already configured) reader with a fresh classifier
    pub fn new(reader: ChannelReader<A>) -> Self {
        Self {
            reader,
            classifier: TriggerClassifier::new(),
        }
    }

    /// Run one cycle and deliver the record, if any, over `link`
    ///
    /// Channels are read lazily in scan order, so a momentary trigger leaves
    /// the remaining channels unread for this cycle. Failed reads are skipped.
    pub fn poll_once<L>(&mut self, link: &L) -> Option<EventRecord>
    where
        L: Link + ?Sized,
    {
        let reader = &mut self.reader;
        let verdict = self
            .classifier
            .poll(|channel| reader.try_read(channel).ok(), || link.elapsed_ms());

        match verdict {
            Verdict::Idle => None,
            Verdict::Debounced { candidate, now_ms } => {
                debug!(
                    "Channel {} suppressed by debounce at {} ms",
                    candidate.channel, now_ms
                );
                None
            }
            Verdict::Accepted(record) => {
                info!(
                    "Trigger: channel={} t={}ms on={} packet={:02X?}",
                    record.channel(),
                    record.timestamp_ms(),
                    record.latched_on(),
                    record.as_bytes()
                );
                link.send(record.as_bytes());
                Some(record)
            }
        }
    }

    pub fn reader(&self) -> &ChannelReader<A> {
        &self.reader
    }

    pub fn reader_mut(&mut self) -> &mut ChannelReader<A> {
        &mut self.reader
    }

    pub fn classifier(&self) -> &TriggerClassifier {
        &self.classifier
    }
}
