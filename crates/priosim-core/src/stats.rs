//! # priosim-core::stats
//!
//! Per-stream and global statistics, grounded on the source simulator's
//! `get_stream_statistics`/`get_global_statistics`:
//! mean/min/max delay, mean jitter (mean absolute difference between
//! consecutive delays, *not* a true jitter estimator), and throughput in
//! Mbps over the span from the first message's creation to the last
//! message's arrival.

use priosim_types::id::StreamId;
use priosim_types::message::Message;

/// Statistics for a single stream. Mirrors the source's dict shape: a
/// stream with zero delivered messages only carries `total_messages`/
/// `dropped_messages` (plus `priority` when the stream is known), with the
/// delay/jitter/throughput fields left absent rather than defaulted to
/// zero — a silent zero would read as "every message arrived instantly."
#[derive(Debug, Clone, PartialEq)]
pub struct StreamStats {
    pub stream_id: StreamId,
    pub priority: Option<u8>,
    pub total_messages: u64,
    pub dropped_messages: u64,
    pub mean_delay_ms: Option<f64>,
    pub min_delay_ms: Option<f64>,
    pub max_delay_ms: Option<f64>,
    pub mean_jitter_ms: Option<f64>,
    pub throughput_mbps: Option<f64>,
}

impl StreamStats {
    pub fn compute(
        stream_id: StreamId,
        priority: Option<u8>,
        delivered: &[Message],
        dropped_messages: u64,
    ) -> Self {
        if delivered.is_empty() {
            return Self {
                stream_id,
                priority,
                total_messages: 0,
                dropped_messages,
                mean_delay_ms: None,
                min_delay_ms: None,
                max_delay_ms: None,
                mean_jitter_ms: None,
                throughput_mbps: None,
            };
        }

        let delays_ms: Vec<f64> = delivered.iter().filter_map(Message::end_to_end_delay_ms).collect();
        if delays_ms.is_empty() {
            return Self {
                stream_id,
                priority,
                total_messages: delivered.len() as u64,
                dropped_messages,
                mean_delay_ms: None,
                min_delay_ms: None,
                max_delay_ms: None,
                mean_jitter_ms: None,
                throughput_mbps: None,
            };
        }

        let mean_delay_ms = delays_ms.iter().sum::<f64>() / delays_ms.len() as f64;
        let min_delay_ms = delays_ms.iter().cloned().fold(f64::INFINITY, f64::min);
        let max_delay_ms = delays_ms.iter().cloned().fold(f64::NEG_INFINITY, f64::max);

        let mean_jitter_ms = if delays_ms.len() > 1 {
            let sum: f64 = delays_ms.windows(2).map(|w| (w[1] - w[0]).abs()).sum();
            Some(sum / (delays_ms.len() - 1) as f64)
        } else {
            Some(0.0)
        };

        // time_span spans from the first message's creation to the last
        // message's arrival, over delivery order (not sorted), matching
        // the source's `messages[-1].arrival_time - messages[0].creation_time`.
        let first_creation = delivered.first().map(|m| m.creation_time).unwrap_or(0.0);
        let last_arrival = delivered
            .last()
            .and_then(|m| m.arrival_time)
            .unwrap_or(first_creation);
        let time_span = last_arrival - first_creation;
        let total_bytes: u64 = delivered.iter().map(|m| m.size_bytes).sum();
        let throughput_mbps = if time_span > 0.0 {
            (total_bytes as f64 * 8.0) / time_span / 1_000_000.0
        } else {
            0.0
        };

        Self {
            stream_id,
            priority,
            total_messages: delivered.len() as u64,
            dropped_messages,
            mean_delay_ms: Some(mean_delay_ms),
            min_delay_ms: Some(min_delay_ms),
            max_delay_ms: Some(max_delay_ms),
            mean_jitter_ms,
            throughput_mbps: Some(throughput_mbps),
        }
    }
}

/// Totals across all streams, mirroring the source's `get_global_statistics`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GlobalStats {
    pub total_messages_delivered: u64,
    pub total_messages_dropped: u64,
    pub total_streams: usize,
    pub mean_delay_ms: Option<f64>,
    pub min_delay_ms: Option<f64>,
    pub max_delay_ms: Option<f64>,
}

impl GlobalStats {
    pub fn compute(completed: &[Message], total_dropped: u64, total_streams: usize) -> Self {
        let delays_ms: Vec<f64> = completed.iter().filter_map(Message::end_to_end_delay_ms).collect();
        if delays_ms.is_empty() {
            return Self {
                total_messages_delivered: completed.len() as u64,
                total_messages_dropped: total_dropped,
                total_streams,
                ..Default::default()
            };
        }
        Self {
            total_messages_delivered: completed.len() as u64,
            total_messages_dropped: total_dropped,
            total_streams,
            mean_delay_ms: Some(delays_ms.iter().sum::<f64>() / delays_ms.len() as f64),
            min_delay_ms: Some(delays_ms.iter().cloned().fold(f64::INFINITY, f64::min)),
            max_delay_ms: Some(delays_ms.iter().cloned().fold(f64::NEG_INFINITY, f64::max)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn delivered(id: u64, creation: f64, arrival: f64, size: u64) -> Message {
        let mut m = Message::new(id, 1, id, 3, "A".into(), "B".into(), size, creation);
        m.arrival_time = Some(arrival);
        m
    }

    #[test]
    fn empty_stream_has_no_delay_fields() {
        let stats = StreamStats::compute(1, Some(3), &[], 0);
        assert_eq!(stats.total_messages, 0);
        assert!(stats.mean_delay_ms.is_none());
    }

    #[test]
    fn zero_jitter_for_constant_delay() {
        let msgs = vec![
            delivered(0, 0.0, 1.0, 1000),
            delivered(1, 1.0, 2.0, 1000),
            delivered(2, 2.0, 3.0, 1000),
        ];
        let stats = StreamStats::compute(1, Some(0), &msgs, 0);
        assert_eq!(stats.mean_jitter_ms, Some(0.0));
        assert_eq!(stats.mean_delay_ms, Some(1000.0));
    }

    #[test]
    fn throughput_reflects_bytes_over_span() {
        let msgs = vec![delivered(0, 0.0, 1.0, 1_000_000), delivered(1, 1.0, 2.0, 1_000_000)];
        let stats = StreamStats::compute(1, Some(0), &msgs, 0);
        // 2e6 bytes * 8 / 2s / 1e6 = 8 Mbps
        assert!((stats.throughput_mbps.unwrap() - 8.0).abs() < 1e-9);
    }
}
