use std::sync::Mutex;
use std::time::{Duration, Instant};
#[cfg(feature = "cli")]
use sysinfo::{Pid, RefreshKind, System};

#[derive(Debug, Clone)]
pub struct PhaseStats {
    pub phase: String,
    pub memory_usage_mb: u64,
    pub peak_memory_mb: u64,
    pub phase_time: Duration,
    pub elapsed_time: Duration,
}

/// 記錄每個階段（解析、分析、輸出）的耗時與記憶體
pub struct RunMonitor {
    enabled: bool,
    start_time: Instant,
    last_mark: Mutex<Instant>,
    #[cfg(feature = "cli")]
    sampler: Option<MemorySampler>,
}

#[cfg(feature = "cli")]
struct MemorySampler {
    system: Mutex<System>,
    pid: Pid,
    peak_mb: Mutex<u64>,
}

#[cfg(feature = "cli")]
impl MemorySampler {
    fn new() -> Option<Self> {
        let pid = sysinfo::get_current_pid().ok()?;
        let mut system = System::new_with_specifics(RefreshKind::everything());
        system.refresh_all();
        Some(Self {
            system: Mutex::new(system),
            pid,
            peak_mb: Mutex::new(0),
        })
    }

    fn sample(&self) -> Option<(u64, u64)> {
        let mut system = self.system.lock().ok()?;
        system.refresh_all();
        let memory_mb = system.process(self.pid)?.memory() / 1024 / 1024;

        let mut peak = self.peak_mb.lock().ok()?;
        if memory_mb > *peak {
            *peak = memory_mb;
        }
        Some((memory_mb, *peak))
    }
}

impl RunMonitor {
    pub fn new(enabled: bool) -> Self {
        let now = Instant::now();
        Self {
            enabled,
            start_time: now,
            last_mark: Mutex::new(now),
            #[cfg(feature = "cli")]
            sampler: if enabled { MemorySampler::new() } else { None },
        }
    }

    /// 結束一個階段並取得統計；未啟用時回傳 None
    pub fn mark(&self, phase: &str) -> Option<PhaseStats> {
        if !self.enabled {
            return None;
        }

        let now = Instant::now();
        let phase_time = {
            let mut last = self.last_mark.lock().ok()?;
            let elapsed = now.duration_since(*last);
            *last = now;
            elapsed
        };

        #[cfg(feature = "cli")]
        let (memory_usage_mb, peak_memory_mb) = self
            .sampler
            .as_ref()
            .and_then(|sampler| sampler.sample())
            .unwrap_or((0, 0));
        #[cfg(not(feature = "cli"))]
        let (memory_usage_mb, peak_memory_mb) = (0, 0);

        Some(PhaseStats {
            phase: phase.to_string(),
            memory_usage_mb,
            peak_memory_mb,
            phase_time,
            elapsed_time: now.duration_since(self.start_time),
        })
    }

    pub fn log_phase(&self, phase: &str) {
        if let Some(stats) = self.mark(phase) {
            tracing::info!(
                "📊 {} - took {:?}, Memory: {}MB, Peak: {}MB, Total: {:?}",
                stats.phase,
                stats.phase_time,
                stats.memory_usage_mb,
                stats.peak_memory_mb,
                stats.elapsed_time
            );
        }
    }

    pub fn log_final_stats(&self) {
        if !self.enabled {
            return;
        }
        tracing::info!(
            "📊 Final Stats - Total Time: {:?}",
            self.start_time.elapsed()
        );
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

impl Default for RunMonitor {
    fn default() -> Self {
        Self::new(false)
    }
}
