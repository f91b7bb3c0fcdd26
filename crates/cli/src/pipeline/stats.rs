//! Pipeline statistics.

use std::time::Duration;

/// Statistics from a pipeline run
#[derive(Debug, Clone, Default)]
pub struct PipelineStats {
    /// Total frame pairs acquired
    pub frames_acquired: u64,

    /// Device outages observed (one per disconnect, however many retries)
    pub outages: u64,

    /// Times the device came online, initial bring-up included
    pub online_events: u64,

    /// Total duration of the pipeline run
    pub duration: Duration,
}

impl PipelineStats {
    /// Calculate frames per second throughput
    pub fn fps(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.frames_acquired as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                    Capture Statistics                        ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");

        println!("📊 Overview");
        println!("   ├─ Duration: {:.2}s", self.duration.as_secs_f64());
        println!("   ├─ Frames acquired: {}", self.frames_acquired);
        println!("   ├─ FPS: {:.2}", self.fps());
        println!("   ├─ Outages: {}", self.outages);
        println!("   └─ Online events: {}", self.online_events);

        println!();
    }
}
