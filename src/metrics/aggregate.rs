//! Pure fold of classified endpoint snapshots into the aggregate report.

use crate::{
    collectors::endpoint::Protocol,
    metrics::classify::{
        ChannelClass,
        Direction,
        EndpointClass,
    },
};

/// The classified outcome of one pipeline: its complete endpoints plus the
/// number of endpoints whose query group failed.
pub struct PipelineObservation {
    pub endpoints: Vec<EndpointClass>,
    pub incomplete: u32,
}

/// Per-flow aggregates for one media type. Averages and maxima exist only
/// when samples were gathered; an empty list yields no value at all.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlowStats {
    pub sum_packets_lost: u64,
    pub loss_rates: Vec<f64>,
    pub jitter: Vec<f64>,
}

impl FlowStats {
    pub fn avg_loss_rate(&self) -> Option<f64> {
        mean(&self.loss_rates)
    }

    pub fn max_loss_rate(&self) -> Option<f64> {
        max(&self.loss_rates)
    }

    pub fn avg_jitter(&self) -> Option<f64> {
        mean(&self.jitter)
    }

    pub fn max_jitter(&self) -> Option<f64> {
        max(&self.jitter)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MediaStats {
    pub inbound_endpoints: u32,
    pub outbound_endpoints: u32,
    pub duplex_endpoints: u32,
    pub rtp_endpoints: u32,
    pub webrtc_endpoints: u32,
    pub inbound: FlowStats,
    pub outbound: FlowStats,
}

impl MediaStats {
    /// Endpoints with any flow at all for this media type.
    pub fn active_endpoints(&self) -> u32 {
        self.inbound_endpoints + self.outbound_endpoints + self.duplex_endpoints
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AggregateReport {
    pub pipelines: u32,
    pub endpoints: u32,
    pub stale_pipelines: u32,
    pub stale_endpoints: u32,
    pub stale_endpoints_rtp: u32,
    pub stale_endpoints_webrtc: u32,
    pub incomplete_endpoints: u32,
    /// Whether loss/jitter detail was collected; gates the per-media report
    /// lines.
    pub deep_stats: bool,
    pub audio: MediaStats,
    pub video: MediaStats,
}

/// Fold the classified pipelines into one report. Pure over its inputs:
/// running it twice over the same observations yields the same report.
pub fn aggregate(observations: &[PipelineObservation], endpoints_total: usize, deep_stats: bool) -> AggregateReport {
    let mut report = AggregateReport {
        pipelines: observations.len() as u32,
        endpoints: endpoints_total as u32,
        stale_pipelines: 0,
        stale_endpoints: 0,
        stale_endpoints_rtp: 0,
        stale_endpoints_webrtc: 0,
        incomplete_endpoints: 0,
        deep_stats,
        audio: MediaStats::default(),
        video: MediaStats::default(),
    };

    for pipeline in observations {
        report.incomplete_endpoints += pipeline.incomplete;

        let mut stale_here = 0usize;
        for endpoint in &pipeline.endpoints {
            fold_media(&mut report.audio, &endpoint.audio, endpoint.protocol);
            fold_media(&mut report.video, &endpoint.video, endpoint.protocol);

            if endpoint.is_stale() {
                stale_here += 1;
                report.stale_endpoints += 1;
                match endpoint.protocol {
                    Protocol::Rtp => report.stale_endpoints_rtp += 1,
                    Protocol::WebRtc => report.stale_endpoints_webrtc += 1,
                    Protocol::Unknown => {}
                }
            }
        }

        // "All children stale" holds vacuously for empty pipelines, but an
        // incomplete endpoint is unknown, not stale.
        if pipeline.incomplete == 0 && stale_here == pipeline.endpoints.len() {
            report.stale_pipelines += 1;
        }
    }

    report
}

fn fold_media(stats: &mut MediaStats, channel: &ChannelClass, protocol: Protocol) {
    match channel.direction {
        Direction::Inbound => stats.inbound_endpoints += 1,
        Direction::Outbound => stats.outbound_endpoints += 1,
        Direction::Duplex => stats.duplex_endpoints += 1,
        Direction::Stale => return,
    }

    match protocol {
        Protocol::Rtp => stats.rtp_endpoints += 1,
        Protocol::WebRtc => stats.webrtc_endpoints += 1,
        Protocol::Unknown => {}
    }

    stats.inbound.sum_packets_lost += channel.inbound.packets_lost;
    stats.inbound.loss_rates.extend_from_slice(&channel.inbound.loss_rates);
    stats.inbound.jitter.extend_from_slice(&channel.inbound.jitter);
    stats.outbound.sum_packets_lost += channel.outbound.packets_lost;
    stats.outbound.loss_rates.extend_from_slice(&channel.outbound.loss_rates);
    stats.outbound.jitter.extend_from_slice(&channel.outbound.jitter);
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

fn max(values: &[f64]) -> Option<f64> {
    values.iter().copied().reduce(f64::max)
}
