//! Fixed-field text rendering of the aggregate report, plus the JSON
//! summary for file export.
//!
//! Only measured values appear: a metric whose sample list stayed empty is
//! left out entirely rather than printed as zero.

use crate::metrics::aggregate::{
    AggregateReport,
    MediaStats,
};
use pipeline_monitor_client::MediaType;
use serde_json::{
    json,
    Value,
};
use std::fmt;

/// Round to three decimals for display, dropping trailing zeros (`0.091`,
/// `0.5`, `2`).
fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

fn format_float(value: f64) -> String {
    format!("{}", round3(value))
}

impl fmt::Display for AggregateReport {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "pipelines: {}, endpoints: {}, stale_pipelines: {}, stale_endpoints: {}, \
             stale_endpoints_rtp: {}, stale_endpoints_webrtc: {}, incomplete_endpoints: {}",
            self.pipelines,
            self.endpoints,
            self.stale_pipelines,
            self.stale_endpoints,
            self.stale_endpoints_rtp,
            self.stale_endpoints_webrtc,
            self.incomplete_endpoints,
        )?;

        if !self.deep_stats {
            return Ok(());
        }

        for (media_type, media) in [(MediaType::Audio, &self.audio), (MediaType::Video, &self.video)] {
            let label = media_type.label();
            write!(f, "\n{label}_endpoints: {}", media.active_endpoints())?;
            write!(f, ", {label}_duplex_endpoints: {}", media.duplex_endpoints)?;

            write!(f, ", {label}_inbound_endpoints: {}", media.inbound_endpoints)?;
            if let (Some(avg), Some(max)) = (media.inbound.avg_loss_rate(), media.inbound.max_loss_rate()) {
                write!(f, ", {label}_inbound_avg_packet_loss_rate: {}", format_float(avg))?;
                write!(f, ", {label}_inbound_max_packet_loss_rate: {}", format_float(max))?;
                write!(f, ", {label}_inbound_sum_packet_loss: {}", media.inbound.sum_packets_lost)?;
            }
            if let (Some(avg), Some(max)) = (media.inbound.avg_jitter(), media.inbound.max_jitter()) {
                write!(f, ", {label}_inbound_avg_jitter: {}", format_float(avg))?;
                write!(f, ", {label}_inbound_max_jitter: {}", format_float(max))?;
            }

            write!(f, ", {label}_outbound_endpoints: {}", media.outbound_endpoints)?;
            if let (Some(avg), Some(max)) = (media.outbound.avg_loss_rate(), media.outbound.max_loss_rate()) {
                write!(f, ", {label}_outbound_avg_packet_loss_rate: {}", format_float(avg))?;
                write!(f, ", {label}_outbound_max_packet_loss_rate: {}", format_float(max))?;
                write!(f, ", {label}_outbound_sum_packet_loss: {}", media.outbound.sum_packets_lost)?;
            }
            if let (Some(avg), Some(max)) = (media.outbound.avg_jitter(), media.outbound.max_jitter()) {
                write!(f, ", {label}_outbound_avg_jitter: {}", format_float(avg))?;
                write!(f, ", {label}_outbound_max_jitter: {}", format_float(max))?;
            }

            write!(f, ", {label}_rtp_endpoints: {}", media.rtp_endpoints)?;
            write!(f, ", {label}_webrtc_endpoints: {}", media.webrtc_endpoints)?;
        }

        Ok(())
    }
}

impl AggregateReport {
    /// JSON rendition of the report with the same field names and omission
    /// rules as the text line.
    pub fn summary(&self) -> Value {
        let mut root = json!({
            "pipelines": self.pipelines,
            "endpoints": self.endpoints,
            "stale_pipelines": self.stale_pipelines,
            "stale_endpoints": self.stale_endpoints,
            "stale_endpoints_rtp": self.stale_endpoints_rtp,
            "stale_endpoints_webrtc": self.stale_endpoints_webrtc,
            "incomplete_endpoints": self.incomplete_endpoints,
        });

        if self.deep_stats {
            root["audio"] = media_summary(&self.audio);
            root["video"] = media_summary(&self.video);
        }

        root
    }
}

fn media_summary(media: &MediaStats) -> Value {
    let mut value = json!({
        "endpoints": media.active_endpoints(),
        "duplex_endpoints": media.duplex_endpoints,
        "inbound_endpoints": media.inbound_endpoints,
        "outbound_endpoints": media.outbound_endpoints,
        "rtp_endpoints": media.rtp_endpoints,
        "webrtc_endpoints": media.webrtc_endpoints,
    });

    for (prefix, flow) in [("inbound", &media.inbound), ("outbound", &media.outbound)] {
        if let (Some(avg), Some(max)) = (flow.avg_loss_rate(), flow.max_loss_rate()) {
            value[format!("{prefix}_avg_packet_loss_rate")] = json!(round3(avg));
            value[format!("{prefix}_max_packet_loss_rate")] = json!(round3(max));
            value[format!("{prefix}_sum_packet_loss")] = json!(flow.sum_packets_lost);
        }
        if let (Some(avg), Some(max)) = (flow.avg_jitter(), flow.max_jitter()) {
            value[format!("{prefix}_avg_jitter")] = json!(round3(avg));
            value[format!("{prefix}_max_jitter")] = json!(round3(max));
        }
    }

    value
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::metrics::aggregate::FlowStats;
    use pretty_assertions::assert_eq;

    fn bare_report(deep_stats: bool) -> AggregateReport {
        AggregateReport {
            pipelines: 0,
            endpoints: 0,
            stale_pipelines: 0,
            stale_endpoints: 0,
            stale_endpoints_rtp: 0,
            stale_endpoints_webrtc: 0,
            incomplete_endpoints: 0,
            deep_stats,
            audio: MediaStats::default(),
            video: MediaStats::default(),
        }
    }

    #[test]
    fn empty_report_prints_zero_counts_and_no_measurements() {
        let report = bare_report(true);

        assert_eq!(
            report.to_string(),
            "pipelines: 0, endpoints: 0, stale_pipelines: 0, stale_endpoints: 0, \
             stale_endpoints_rtp: 0, stale_endpoints_webrtc: 0, incomplete_endpoints: 0\n\
             audio_endpoints: 0, audio_duplex_endpoints: 0, audio_inbound_endpoints: 0, \
             audio_outbound_endpoints: 0, audio_rtp_endpoints: 0, audio_webrtc_endpoints: 0\n\
             video_endpoints: 0, video_duplex_endpoints: 0, video_inbound_endpoints: 0, \
             video_outbound_endpoints: 0, video_rtp_endpoints: 0, video_webrtc_endpoints: 0"
        );
    }

    #[test]
    fn measured_loss_and_jitter_round_to_three_decimals() {
        let mut report = bare_report(true);
        report.pipelines = 1;
        report.endpoints = 1;
        report.audio.inbound_endpoints = 1;
        report.audio.webrtc_endpoints = 1;
        report.audio.inbound = FlowStats {
            sum_packets_lost: 5,
            loss_rates: vec![5.0 / 55.0],
            jitter: Vec::new(),
        };

        assert_eq!(
            report.to_string(),
            "pipelines: 1, endpoints: 1, stale_pipelines: 0, stale_endpoints: 0, \
             stale_endpoints_rtp: 0, stale_endpoints_webrtc: 0, incomplete_endpoints: 0\n\
             audio_endpoints: 1, audio_duplex_endpoints: 0, audio_inbound_endpoints: 1, \
             audio_inbound_avg_packet_loss_rate: 0.091, audio_inbound_max_packet_loss_rate: 0.091, \
             audio_inbound_sum_packet_loss: 5, audio_outbound_endpoints: 0, \
             audio_rtp_endpoints: 0, audio_webrtc_endpoints: 1\n\
             video_endpoints: 0, video_duplex_endpoints: 0, video_inbound_endpoints: 0, \
             video_outbound_endpoints: 0, video_rtp_endpoints: 0, video_webrtc_endpoints: 0"
        );
    }

    #[test]
    fn shallow_report_stops_after_the_structural_line() {
        let mut report = bare_report(false);
        report.pipelines = 2;
        report.endpoints = 3;
        report.stale_endpoints = 1;
        report.stale_endpoints_rtp = 1;

        assert_eq!(
            report.to_string(),
            "pipelines: 2, endpoints: 3, stale_pipelines: 0, stale_endpoints: 1, \
             stale_endpoints_rtp: 1, stale_endpoints_webrtc: 0, incomplete_endpoints: 0"
        );
    }

    #[test]
    fn float_display_drops_trailing_zeros() {
        assert_eq!(format_float(5.0 / 55.0), "0.091");
        assert_eq!(format_float(0.5), "0.5");
        assert_eq!(format_float(2.0), "2");
        assert_eq!(format_float(0.0004), "0");
    }

    #[test]
    fn summary_mirrors_the_line_fields() {
        let mut report = bare_report(true);
        report.pipelines = 1;
        report.endpoints = 2;
        report.incomplete_endpoints = 1;
        report.audio.inbound_endpoints = 1;
        report.audio.inbound = FlowStats {
            sum_packets_lost: 5,
            loss_rates: vec![5.0 / 55.0],
            jitter: vec![0.004],
        };

        let summary = report.summary();

        assert_eq!(summary["pipelines"], 1);
        assert_eq!(summary["incomplete_endpoints"], 1);
        assert_eq!(summary["audio"]["inbound_avg_packet_loss_rate"], 0.091);
        assert_eq!(summary["audio"]["inbound_sum_packet_loss"], 5);
        assert_eq!(summary["audio"]["inbound_avg_jitter"], 0.004);
        assert!(summary["audio"].get("outbound_avg_packet_loss_rate").is_none());
        assert!(summary["video"].get("inbound_avg_packet_loss_rate").is_none());
    }

    #[test]
    fn shallow_summary_has_no_media_sections() {
        let summary = bare_report(false).summary();
        assert!(summary.get("audio").is_none());
        assert!(summary.get("video").is_none());
    }
}
