/// Shared type definitions for rawguard
/// Error taxonomy, apartment options, and release-failure log levels
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Threading model requested from the platform's apartment initializer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ApartmentMode {
    /// Multi-threaded apartment (COINIT_MULTITHREADED)
    #[default]
    Multithreaded,
    /// Single-threaded apartment (COINIT_APARTMENTTHREADED)
    ApartmentThreaded,
}

/// Options consumed by the apartment initializer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ApartmentOptions {
    pub mode: ApartmentMode,
    /// COINIT_DISABLE_OLE1DDE
    pub disable_ole1dde: bool,
    /// COINIT_SPEED_OVER_MEMORY
    pub speed_over_memory: bool,
}

impl ApartmentOptions {
    pub const MULTITHREADED: Self = Self {
        mode: ApartmentMode::Multithreaded,
        disable_ole1dde: false,
        speed_over_memory: false,
    };

    pub const APARTMENT_THREADED: Self = Self {
        mode: ApartmentMode::ApartmentThreaded,
        disable_ole1dde: false,
        speed_over_memory: false,
    };

    /// Flag word in the layout the Windows initializer expects.
    pub fn bits(&self) -> u32 {
        let mut bits = match self.mode {
            ApartmentMode::Multithreaded => 0x0,
            ApartmentMode::ApartmentThreaded => 0x2,
        };
        if self.disable_ole1dde {
            bits |= 0x4;
        }
        if self.speed_over_memory {
            bits |= 0x8;
        }
        bits
    }
}

/// Level at which the platform backend reports a failed release call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReleaseLogLevel {
    Off,
    Debug,
    #[default]
    Warn,
}

impl ReleaseLogLevel {
    pub(crate) fn as_u8(self) -> u8 {
        match self {
            Self::Off => 0,
            Self::Debug => 1,
            Self::Warn => 2,
        }
    }

    pub(crate) fn from_u8(raw: u8) -> Self {
        match raw {
            0 => Self::Off,
            1 => Self::Debug,
            _ => Self::Warn,
        }
    }

    /// Corresponding `log` level, `None` when reporting is off.
    pub fn log_level(self) -> Option<log::Level> {
        match self {
            Self::Off => None,
            Self::Debug => Some(log::Level::Debug),
            Self::Warn => Some(log::Level::Warn),
        }
    }
}

/// Errors raised by acquisition helpers and configuration loading.
///
/// Ownership operations (reset, drop, move) never produce one of these.
#[derive(Error, Debug)]
pub enum GuardError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Module error: {0}")]
    Module(String),

    #[error("Symbol error: {0}")]
    Symbol(String),

    #[error("Process error: {0}")]
    Process(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0} not acquired")]
    NotAcquired(&'static str),
}

pub type Result<T> = std::result::Result<T, GuardError>;

#[cfg(unix)]
impl From<nix::errno::Errno> for GuardError {
    fn from(err: nix::errno::Errno) -> Self {
        GuardError::Io(std::io::Error::from(err))
    }
}
