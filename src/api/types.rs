// Simulated device telemetry types
// Field order is the JSON key order, so keep declarations in wire order.

use chrono::Local;
use serde::Serialize;

pub const DEVICE_NAME: &str = "/dev/mychardev";
pub const MAJOR_NUMBER: u32 = 250;
pub const MINOR_NUMBER: u32 = 0;
pub const BUFFER_SIZE: usize = 1024;
/// Reported uptime in seconds; the simulator always claims one hour
pub const UPTIME_SECS: u64 = 3600;
pub const SIMULATOR_VERSION: &str = "1.0.0";

/// Current local time as ISO-8601 with microseconds, e.g. `2026-10-18T09:15:02.123456`
pub fn iso_timestamp() -> String {
    Local::now().format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
}

/// Device statistics returned by `/api/stats`
#[derive(Debug, Clone, Serialize)]
pub struct StatsPayload {
    pub timestamp: String,
    pub uptime: u64,
    pub module_loaded: bool,
    pub device_name: &'static str,
    pub major_number: u32,
    pub minor_number: u32,
    pub buffer_size: usize,
    pub buffer_used: usize,
    pub operations: OperationCounters,
    pub performance: PerformanceStats,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct OperationCounters {
    pub read_count: u64,
    pub write_count: u64,
    pub ioctl_count: u64,
    pub open_count: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PerformanceStats {
    pub avg_read_latency_ms: f64,
    pub avg_write_latency_ms: f64,
    pub throughput_bps: u64,
}

impl StatsPayload {
    pub fn now() -> Self {
        Self {
            timestamp: iso_timestamp(),
            uptime: UPTIME_SECS,
            module_loaded: true,
            device_name: DEVICE_NAME,
            major_number: MAJOR_NUMBER,
            minor_number: MINOR_NUMBER,
            buffer_size: BUFFER_SIZE,
            buffer_used: 0,
            operations: OperationCounters::default(),
            performance: PerformanceStats {
                avg_read_latency_ms: 0.5,
                avg_write_latency_ms: 0.3,
                throughput_bps: 0,
            },
        }
    }
}

/// Kernel log severity, serialized upper-case (`INFO`, `DEBUG`, ...)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum KernelLogLevel {
    // The module-load log never reports these two; they complete the level set
    #[allow(dead_code)]
    Error,
    #[allow(dead_code)]
    Warning,
    Info,
    Debug,
}

/// One simulated `dmesg` line returned by `/api/logs`
#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    pub timestamp: String,
    pub level: KernelLogLevel,
    pub message: String,
}

impl LogEntry {
    pub fn now(level: KernelLogLevel, message: impl Into<String>) -> Self {
        Self {
            timestamp: iso_timestamp(),
            level,
            message: message.into(),
        }
    }
}

/// The fixed pair of log lines emitted when the module loads
pub fn module_load_logs() -> Vec<LogEntry> {
    vec![
        LogEntry::now(
            KernelLogLevel::Info,
            "Character device driver module loaded successfully",
        ),
        LogEntry::now(
            KernelLogLevel::Debug,
            format!("Device {DEVICE_NAME} registered with major number {MAJOR_NUMBER}"),
        ),
    ]
}

/// Health check returned by `/api/health`
#[derive(Debug, Clone, Serialize)]
pub struct HealthPayload {
    pub status: &'static str,
    pub timestamp: String,
    pub version: &'static str,
    pub simulator: &'static str,
}

impl HealthPayload {
    pub fn now() -> Self {
        Self {
            status: "healthy",
            timestamp: iso_timestamp(),
            version: SIMULATOR_VERSION,
            simulator: "active",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_shape() {
        let ts = iso_timestamp();
        assert!(chrono::NaiveDateTime::parse_from_str(&ts, "%Y-%m-%dT%H:%M:%S%.f").is_ok());
        assert_eq!(ts.len(), "2026-10-18T09:15:02.123456".len());
    }

    #[test]
    fn test_log_level_serialization() {
        assert_eq!(serde_json::to_string(&KernelLogLevel::Info).unwrap(), "\"INFO\"");
        assert_eq!(serde_json::to_string(&KernelLogLevel::Warning).unwrap(), "\"WARNING\"");
        assert_eq!(serde_json::to_string(&KernelLogLevel::Error).unwrap(), "\"ERROR\"");
        assert_eq!(serde_json::to_string(&KernelLogLevel::Debug).unwrap(), "\"DEBUG\"");
    }

    #[test]
    fn test_module_load_logs() {
        let logs = module_load_logs();
        assert_eq!(logs.len(), 2);
        assert_eq!(logs[0].level, KernelLogLevel::Info);
        assert_eq!(logs[1].level, KernelLogLevel::Debug);
        assert_eq!(
            logs[1].message,
            "Device /dev/mychardev registered with major number 250"
        );
    }

    #[test]
    fn test_stats_key_order() {
        let json = serde_json::to_string_pretty(&StatsPayload::now()).unwrap();
        let keys = [
            "\"timestamp\"",
            "\"uptime\"",
            "\"module_loaded\"",
            "\"device_name\"",
            "\"major_number\"",
            "\"minor_number\"",
            "\"buffer_size\"",
            "\"buffer_used\"",
            "\"operations\"",
            "\"performance\"",
        ];
        let positions: Vec<usize> = keys.iter().map(|k| json.find(k).unwrap()).collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }
}
