use super::MetricsCollector;

pub struct PipelineMonitor {
    collector: MetricsCollector,
}

impl PipelineMonitor {
    pub fn new(collector: MetricsCollector) -> Self {
        Self { collector }
    }

    pub fn generate_report(&self) -> String {
        let snapshot = self.collector.snapshot();

        if snapshot.is_empty() {
            return "No cameras registered".to_string();
        }

        let mut report = String::from("=== Sentinel Metrics ===\n");

        for (key, m) in snapshot.iter() {
            report.push_str(&format!(
                "\n[{}]\n  Ticks: {} ({}μs avg)\n  Frames: {} scored, {} pushed, {} dropped, {} placeholder\n  Reconnects: {}\n  Scoring failures: {}\n  Incidents: {}\n  Sink errors: {}\n",
                key,
                m.ticks,
                m.avg_tick_us,
                m.frames_scored,
                m.frames_pushed,
                m.frames_dropped,
                m.placeholder_frames,
                m.reconnect_attempts,
                m.scoring_failures,
                m.incidents,
                if m.sink_errors > 0 {
                    format!("{} error{}", m.sink_errors, if m.sink_errors == 1 { "" } else { "s" })
                } else {
                    "0 errors".to_string()
                },
            ));
        }

        report
    }

    pub fn collector(&self) -> &MetricsCollector {
        &self.collector
    }
}
