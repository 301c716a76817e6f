use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

/// Ordering surface a recommendation is rendered on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    App,
    Web,
    Kiosk,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::App => "app",
            Self::Web => "web",
            Self::Kiosk => "kiosk",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Platform {
    type Err = DomainError;

    /// Accepts the channel labels found in order exports as well as the
    /// canonical names: `Digital` is the mobile app, `Website` is web.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "app" | "mobile" | "digital" => Ok(Self::App),
            "web" | "website" => Ok(Self::Web),
            "kiosk" => Ok(Self::Kiosk),
            other => Err(DomainError::InvalidInput(format!(
                "unsupported platform `{other}` (expected app|web|kiosk)"
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CustomerType {
    #[default]
    Guest,
    Registered,
    Special,
}

impl CustomerType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Guest => "guest",
            Self::Registered => "registered",
            Self::Special => "special",
        }
    }

    /// Lenient parse used for exported customer tables: anything unknown is a guest.
    pub fn parse_lenient(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "registered" => Self::Registered,
            "special" | "vip" => Self::Special,
            _ => Self::Guest,
        }
    }
}

impl std::fmt::Display for CustomerType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
