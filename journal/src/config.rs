//! Edit log configuration.

/// Configuration for recording an edit log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditLogConfig {
    /// Initial capacity of the instruction stream and operand buffers
    pub initial_capacity: usize,
    /// Log per-operation statistics at debug level when the log is finished
    pub log_stats: bool,
}

impl Default for EditLogConfig {
    fn default() -> Self {
        Self {
            initial_capacity: 16,
            log_stats: false,
        }
    }
}

impl EditLogConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = capacity;
        self
    }

    pub fn with_log_stats(mut self, enabled: bool) -> Self {
        self.log_stats = enabled;
        self
    }
}
