//! Static device configuration.
//!
//! Both nodes read one [`DeviceConfig`] at start-up. Nothing in it is
//! renegotiated at runtime. Every field has a default matching the reference
//! board, so an empty JSON object is a complete configuration:
//!
//! ```
//! use doorlock_core::DeviceConfig;
//!
//! let config = DeviceConfig::from_json_str("{}").unwrap();
//! assert_eq!(config.hmi.max_attempts, 3);
//! assert_eq!(config.serial.baud_rate, 9600);
//! ```

use crate::{
    Credential, Result,
    constants::*,
    error::Error,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Complete configuration for both nodes.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Serial line settings.
    pub serial: SerialConfig,

    /// Two-wire bus and EEPROM settings.
    pub bus: BusConfig,

    /// Countdown hardware settings.
    pub timer: TimerConfig,

    /// Control node behaviour.
    pub control: ControlConfig,

    /// HMI node behaviour.
    pub hmi: HmiConfig,
}

impl DeviceConfig {
    /// Parse a configuration from JSON and validate it.
    ///
    /// # Errors
    /// Returns `Error::ConfigParse` on malformed JSON and `Error::Config`
    /// if validation fails.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file from disk.
    ///
    /// # Errors
    /// Returns `Error::Io` if the file cannot be read, otherwise the same
    /// errors as [`DeviceConfig::from_json_str`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Check cross-field constraints.
    ///
    /// # Errors
    /// Returns `Error::Config` describing the first violated constraint.
    pub fn validate(&self) -> Result<()> {
        if self.serial.baud_rate == 0 {
            return Err(Error::Config("serial.baud_rate must be non-zero".into()));
        }

        let slot_end = usize::from(self.bus.credential_base) + CREDENTIAL_LEN;
        if slot_end > STORE_CAPACITY {
            return Err(Error::Config(format!(
                "credential slot 0x{:04X}..0x{slot_end:04X} exceeds the 11-bit store",
                self.bus.credential_base
            )));
        }
        if self.bus.device_address & 0x0F != 0 {
            return Err(Error::Config(format!(
                "bus.device_address 0x{:02X} must leave the low nibble clear",
                self.bus.device_address
            )));
        }

        if self.timer.prescaler == 0 || self.timer.ticks_per_ms == 0 {
            return Err(Error::Config("timer prescaler and ticks_per_ms must be non-zero".into()));
        }
        let max_compare = self
            .timer
            .max_countdown_ms
            .checked_mul(u64::from(self.timer.ticks_per_ms));
        if self.timer.max_countdown_ms == 0
            || max_compare.is_none_or(|compare| compare > u64::from(u16::MAX))
        {
            return Err(Error::Config(format!(
                "timer.max_countdown_ms {} does not fit the 16-bit compare register",
                self.timer.max_countdown_ms
            )));
        }

        if self.control.door_open_secs == 0 || self.control.door_close_secs == 0 {
            return Err(Error::Config("door open/close times must be non-zero".into()));
        }

        let hmi = &self.hmi;
        if hmi.max_attempts == 0 {
            return Err(Error::Config("hmi.max_attempts must be at least 1".into()));
        }
        if hmi.max_provisioning_rounds == 0 {
            return Err(Error::Config(
                "hmi.max_provisioning_rounds must be at least 1".into(),
            ));
        }
        if hmi.timeout_tick_ms == 0 || hmi.entry_timeout_secs == 0 {
            return Err(Error::Config("hmi entry timeout and tick must be non-zero".into()));
        }
        if hmi.timeout_tick_ms >= hmi.entry_timeout_secs * 1000 {
            return Err(Error::Config(
                "hmi.timeout_tick_ms must be shorter than the entry timeout".into(),
            ));
        }
        if hmi.lockout_secs == 0 {
            return Err(Error::Config("hmi.lockout_secs must be non-zero".into()));
        }

        Ok(())
    }
}

/// Serial line settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    /// Bit rate in bits per second.
    pub baud_rate: u32,

    /// Device path used by the real serial transport.
    pub port: Option<String>,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            baud_rate: DEFAULT_BAUD_RATE,
            port: None,
        }
    }
}

/// Two-wire bus clock profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BusClock {
    /// 100 kHz standard mode.
    Standard100k,
    /// 400 kHz fast mode.
    #[default]
    Fast400k,
}

impl BusClock {
    /// SCL frequency in hertz.
    #[must_use]
    pub fn hz(&self) -> u32 {
        match self {
            BusClock::Standard100k => 100_000,
            BusClock::Fast400k => 400_000,
        }
    }

    /// Bit-rate register value for a given CPU clock (zero prescaler).
    ///
    /// `SCL = F_CPU / (16 + 2 * TWBR)`
    #[must_use]
    pub fn bit_rate_register(&self, cpu_hz: u32) -> u8 {
        let divider = (cpu_hz / self.hz()).saturating_sub(16) / 2;
        u8::try_from(divider).unwrap_or(u8::MAX)
    }
}

/// Two-wire bus and EEPROM settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BusConfig {
    /// Bus clock profile.
    pub clock: BusClock,

    /// Fixed high nibble of the EEPROM device-select byte.
    pub device_address: u8,

    /// First address of the credential slot.
    pub credential_base: u16,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            clock: BusClock::default(),
            device_address: EEPROM_DEVICE_ADDRESS,
            credential_base: CREDENTIAL_BASE_ADDRESS,
        }
    }
}

/// Countdown hardware settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimerConfig {
    /// CPU clock in hertz.
    pub cpu_hz: u32,

    /// Countdown source divider.
    pub prescaler: u32,

    /// Compare ticks per millisecond.
    pub ticks_per_ms: u32,

    /// Longest single countdown in milliseconds.
    pub max_countdown_ms: u64,
}

impl TimerConfig {
    /// Compare value for a countdown of `ms` milliseconds.
    #[must_use]
    pub fn compare_value(&self, ms: u64) -> u64 {
        ms.saturating_mul(u64::from(self.ticks_per_ms))
    }

    /// Longest single countdown.
    #[must_use]
    pub fn max_countdown(&self) -> Duration {
        Duration::from_millis(self.max_countdown_ms)
    }
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            cpu_hz: DEFAULT_CPU_HZ,
            prescaler: DEFAULT_PRESCALER,
            ticks_per_ms: DEFAULT_TICKS_PER_MS,
            max_countdown_ms: DEFAULT_MAX_COUNTDOWN_MS,
        }
    }
}

/// Which motor pin is driven high for the opening stroke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MotorPolarity {
    /// Pin A high opens the door.
    #[default]
    Normal,
    /// Pin B high opens the door.
    Inverted,
}

/// Control node behaviour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlConfig {
    /// Forward (opening) stroke in seconds.
    pub door_open_secs: u64,

    /// Reverse (closing) stroke in seconds.
    pub door_close_secs: u64,

    /// EEPROM write-cycle settle time in milliseconds.
    pub write_settle_ms: u64,

    /// Motor drive polarity.
    pub motor_polarity: MotorPolarity,
}

impl ControlConfig {
    /// Forward stroke duration.
    #[must_use]
    pub fn door_open(&self) -> Duration {
        Duration::from_secs(self.door_open_secs)
    }

    /// Reverse stroke duration.
    #[must_use]
    pub fn door_close(&self) -> Duration {
        Duration::from_secs(self.door_close_secs)
    }

    /// Settle time after each EEPROM write.
    #[must_use]
    pub fn write_settle(&self) -> Duration {
        Duration::from_millis(self.write_settle_ms)
    }
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            door_open_secs: DEFAULT_DOOR_OPEN_SECS,
            door_close_secs: DEFAULT_DOOR_CLOSE_SECS,
            write_settle_ms: DEFAULT_WRITE_SETTLE_MS,
            motor_polarity: MotorPolarity::default(),
        }
    }
}

/// What the HMI does when the input watchdog fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeoutPolicy {
    /// Hard restart of the node.
    #[default]
    ForceRestart,
    /// Abandon the current entry and show the main menu.
    ReturnToMenu,
}

/// HMI node behaviour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HmiConfig {
    /// Time without a key press before the watchdog fires, in seconds.
    pub entry_timeout_secs: u64,

    /// Watchdog tick period in milliseconds.
    pub timeout_tick_ms: u64,

    /// Consecutive mismatches that trigger a lockout.
    pub max_attempts: u8,

    /// Alarm duration during a lockout, in seconds.
    pub lockout_secs: u64,

    /// How long the root key must stay held, in seconds.
    pub root_hold_secs: u64,

    /// Build-time root credential.
    pub root_credential: Credential,

    /// Watchdog action.
    pub timeout_policy: TimeoutPolicy,

    /// Provisioning prompts before giving up.
    pub max_provisioning_rounds: u8,

    /// Debounce pause after each accepted key during provisioning, in milliseconds.
    pub key_settle_ms: u64,

    /// Debounce pause after each accepted key during verification, in milliseconds.
    pub verify_key_settle_ms: u64,

    /// How long "PASS not matched" stays on screen, in seconds.
    pub mismatch_notice_secs: u64,

    /// Pause after a credential is confirmed, in milliseconds.
    pub confirm_delay_ms: u64,
}

impl HmiConfig {
    /// Number of watchdog ticks that make up the entry timeout.
    ///
    /// Rounded up, so the watchdog never fires before `entry_timeout_secs`.
    /// The defaults give 313 ticks (10.016 s); boards that hard-code a
    /// count of 310 fire at 9.92 s instead. Set `entry_timeout_secs` and
    /// `timeout_tick_ms` to reproduce a specific count.
    #[must_use]
    pub fn timeout_ticks(&self) -> u32 {
        let total = (self.entry_timeout_secs * 1000).div_ceil(self.timeout_tick_ms);
        u32::try_from(total).unwrap_or(u32::MAX)
    }

    /// Watchdog tick period.
    #[must_use]
    pub fn timeout_tick(&self) -> Duration {
        Duration::from_millis(self.timeout_tick_ms)
    }

    /// Lockout duration.
    #[must_use]
    pub fn lockout(&self) -> Duration {
        Duration::from_secs(self.lockout_secs)
    }

    /// Root key hold time.
    #[must_use]
    pub fn root_hold(&self) -> Duration {
        Duration::from_secs(self.root_hold_secs)
    }
}

impl Default for HmiConfig {
    fn default() -> Self {
        Self {
            entry_timeout_secs: DEFAULT_ENTRY_TIMEOUT_SECS,
            timeout_tick_ms: DEFAULT_TIMEOUT_TICK_MS,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            lockout_secs: DEFAULT_LOCKOUT_SECS,
            root_hold_secs: DEFAULT_ROOT_HOLD_SECS,
            root_credential: Credential(ROOT_CREDENTIAL),
            timeout_policy: TimeoutPolicy::default(),
            max_provisioning_rounds: DEFAULT_MAX_PROVISIONING_ROUNDS,
            key_settle_ms: 500,
            verify_key_settle_ms: 350,
            mismatch_notice_secs: 2,
            confirm_delay_ms: 1000,
        }
    }
}
