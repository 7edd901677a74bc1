use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize, Serializer};

use crate::error::ObserveError;

/// Output format for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[non_exhaustive]
pub enum LogFormat {
    /// Human-readable text logs (default).
    #[default]
    Text,
    /// Structured JSON logs for collectors.
    Json,
    /// systemd-journald output (Linux only).
    Journald,
}

impl FromStr for LogFormat {
    type Err = ObserveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            "journald" | "journal" => {
                #[cfg(target_os = "linux")]
                {
                    Ok(Self::Journald)
                }
                #[cfg(not(target_os = "linux"))]
                {
                    Err(ObserveError::JournaldNotSupported)
                }
            }
            _ => Err(ObserveError::InvalidFormat(s.to_string())),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LogFormat::Text => "text",
            LogFormat::Json => "json",
            LogFormat::Journald => "journald",
        };
        f.write_str(s)
    }
}

impl Serialize for LogFormat {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for LogFormat {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::from_str(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_text() {
        assert_eq!(LogFormat::default(), LogFormat::Text);
    }

    #[test]
    fn parses_case_insensitive() {
        assert_eq!(LogFormat::from_str("text").unwrap(), LogFormat::Text);
        assert_eq!(LogFormat::from_str("TEXT").unwrap(), LogFormat::Text);
        assert_eq!(LogFormat::from_str("JsOn").unwrap(), LogFormat::Json);
    }

    #[test]
    fn journald_is_platform_specific() {
        #[cfg(target_os = "linux")]
        assert_eq!(
            LogFormat::from_str("journald").unwrap(),
            LogFormat::Journald
        );

        #[cfg(not(target_os = "linux"))]
        assert!(matches!(
            LogFormat::from_str("journald"),
            Err(ObserveError::JournaldNotSupported)
        ));
    }

    #[test]
    fn rejects_unknown_formats() {
        for input in ["", "xml", "logfmt", "text-json"] {
            assert!(
                LogFormat::from_str(input).is_err(),
                "expected error for {input:?}"
            );
        }
    }

    #[test]
    fn serde_roundtrip() {
        for format in [LogFormat::Text, LogFormat::Json] {
            let json = serde_json::to_string(&format).unwrap();
            let parsed: LogFormat = serde_json::from_str(&json).unwrap();
            assert_eq!(format, parsed);
        }
    }
}
