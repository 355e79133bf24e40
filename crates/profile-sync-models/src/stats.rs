use serde::Serialize;

/// Outcome counters for one catalog instance's sync pass.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct SyncStats {
    pub updated: usize,
    pub skipped: usize,
    pub total: usize,
}

/// Outcome counters for one catalog instance's audio-tagging pass.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct AudioScanStats {
    pub tagged: usize,
    pub skipped: usize,
    pub total: usize,
}
