//! Tunable constants for the command-stream engine.

/// Settings that depend on the particular hardware and display in use.
///
/// The defaults are the values that work well for typical EVE panels. Use
/// the builder methods to override them:
///
/// ```
/// # use evecopro::config::Config;
/// const CONFIG: Config = Config::new().space_timeout_ms(500).api_level(2);
/// # assert_eq!(CONFIG.get_space_timeout_ms(), 500);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    space_timeout_ms: u64,
    min_touch_interval_ms: u64,
    api_level: Option<u32>,
}

impl Config {
    pub const DEFAULT_SPACE_TIMEOUT_MS: u64 = 1000;
    pub const DEFAULT_MIN_TOUCH_INTERVAL_MS: u64 = 100;

    pub const fn new() -> Self {
        Self {
            space_timeout_ms: Self::DEFAULT_SPACE_TIMEOUT_MS,
            min_touch_interval_ms: Self::DEFAULT_MIN_TOUCH_INTERVAL_MS,
            api_level: None,
        }
    }

    /// How long to wait for the coprocessor to free space in its command
    /// ring before giving up with a timeout.
    pub const fn space_timeout_ms(self, ms: u64) -> Self {
        Self {
            space_timeout_ms: ms,
            ..self
        }
    }

    /// A release reported sooner than this after the previous touch event
    /// is held back, and only delivered if no new touch arrives within
    /// the same interval.
    pub const fn min_touch_interval_ms(self, ms: u64) -> Self {
        Self {
            min_touch_interval_ms: ms,
            ..self
        }
    }

    /// Selects a coprocessor API level, which is then restored after every
    /// coprocessor reset. Only the BT817 and BT818 understand this.
    pub const fn api_level(self, level: u32) -> Self {
        Self {
            api_level: Some(level),
            ..self
        }
    }

    pub const fn get_space_timeout_ms(&self) -> u64 {
        self.space_timeout_ms
    }

    pub const fn get_min_touch_interval_ms(&self) -> u64 {
        self.min_touch_interval_ms
    }

    pub const fn get_api_level(&self) -> Option<u32> {
        self.api_level
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}
