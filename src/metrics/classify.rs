//! Per-endpoint, per-media classification.
//!
//! Each media type of an endpoint lands in exactly one direction bucket.
//! With deep stats enabled the bucket derives from the raw stat records
//! (an outbound record that actually moved bytes, an inbound record that
//! actually received bytes); without them it falls back to the server's
//! flowing-in/flowing-out flags. Audio and video are judged independently:
//! an endpoint can be duplex for audio and stale for video at the same
//! time.

use crate::collectors::endpoint::{
    ChannelSnapshot,
    EndpointSnapshot,
    Protocol,
};
use pipeline_monitor_client::StatKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Inbound,
    Outbound,
    Duplex,
    Stale,
}

/// Loss and jitter samples gathered for one flow (inbound or outbound) of
/// one media type.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlowSamples {
    pub packets_lost: u64,
    pub loss_rates: Vec<f64>,
    pub jitter: Vec<f64>,
}

impl FlowSamples {
    /// Fold one record's counters in. The loss rate needs the matching
    /// transfer counter; a lost count alone only feeds the sum.
    fn absorb(&mut self, lost: Option<u64>, transferred: Option<u64>, jitter: Option<f64>) {
        if let Some(lost) = lost {
            self.packets_lost += lost;
            if let Some(transferred) = transferred {
                if lost + transferred > 0 {
                    self.loss_rates.push(lost as f64 / (lost + transferred) as f64);
                }
            }
        }
        if let Some(jitter) = jitter {
            self.jitter.push(jitter);
        }
    }
}

#[derive(Debug, Clone)]
pub struct ChannelClass {
    pub direction: Direction,
    pub inbound: FlowSamples,
    pub outbound: FlowSamples,
}

#[derive(Debug, Clone)]
pub struct EndpointClass {
    pub protocol: Protocol,
    pub audio: ChannelClass,
    pub video: ChannelClass,
}

impl EndpointClass {
    /// Stale as an endpoint only when both media types are stale.
    pub fn is_stale(&self) -> bool {
        self.audio.direction == Direction::Stale && self.video.direction == Direction::Stale
    }
}

pub fn classify(snapshot: &EndpointSnapshot, deep_stats: bool) -> EndpointClass {
    EndpointClass {
        protocol: snapshot.protocol,
        audio: classify_channel(&snapshot.audio, deep_stats),
        video: classify_channel(&snapshot.video, deep_stats),
    }
}

fn classify_channel(channel: &ChannelSnapshot, deep_stats: bool) -> ChannelClass {
    if !deep_stats {
        return ChannelClass {
            direction: direction_of(channel.flowing_in, channel.flowing_out),
            inbound: FlowSamples::default(),
            outbound: FlowSamples::default(),
        };
    }

    let mut inbound_seen = false;
    let mut outbound_seen = false;
    let mut inbound = FlowSamples::default();
    let mut outbound = FlowSamples::default();

    for record in &channel.stats {
        match record.kind {
            StatKind::OutboundRtp if record.bytes_sent > 0 => {
                outbound_seen = true;
                outbound.absorb(record.packets_lost, record.packets_sent, record.jitter);
            }
            StatKind::InboundRtp if record.bytes_received > 0 => {
                inbound_seen = true;
                inbound.absorb(record.packets_lost, record.packets_received, record.jitter);
            }
            _ => {}
        }
    }

    ChannelClass {
        direction: direction_of(inbound_seen, outbound_seen),
        inbound,
        outbound,
    }
}

fn direction_of(inbound: bool, outbound: bool) -> Direction {
    match (inbound, outbound) {
        (true, true) => Direction::Duplex,
        (true, false) => Direction::Inbound,
        (false, true) => Direction::Outbound,
        (false, false) => Direction::Stale,
    }
}
