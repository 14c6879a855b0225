use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// RawExport – one uploaded SCADA file, not yet parsed
// ---------------------------------------------------------------------------

/// An unparsed upload: raw bytes plus the name they arrived under.
/// Consumed once by the extractor, then discarded.
#[derive(Debug, Clone)]
pub struct RawExport {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl RawExport {
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            bytes,
        }
    }
}

// ---------------------------------------------------------------------------
// Measurement channels
// ---------------------------------------------------------------------------

/// A named measurement type within the export's `VarName` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Channel {
    Temperature,
    Pressure,
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Channel::Temperature => write!(f, "Temperature"),
            Channel::Pressure => write!(f, "Pressure"),
        }
    }
}

impl Channel {
    /// Unit suffix for axis labels.
    pub fn unit(&self) -> &'static str {
        match self {
            Channel::Temperature => "°C",
            Channel::Pressure => "bar",
        }
    }
}

/// Routes a raw variable name to a channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelMarker {
    pub channel: Channel,
    /// Case-sensitive substring tested against `VarName`.
    pub substring: String,
}

/// The full set of channel markers used by the extractor. Rows whose
/// `VarName` matches none of the markers are filtered out, by design.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelConfig {
    pub markers: Vec<ChannelMarker>,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            markers: vec![
                ChannelMarker {
                    channel: Channel::Temperature,
                    substring: "T1.Output_registro".to_string(),
                },
                ChannelMarker {
                    channel: Channel::Pressure,
                    substring: "P1.Output_registro".to_string(),
                },
            ],
        }
    }
}

impl ChannelConfig {
    /// First marker whose substring occurs in `var_name`, or None.
    pub fn classify(&self, var_name: &str) -> Option<Channel> {
        self.markers
            .iter()
            .find(|m| var_name.contains(&m.substring))
            .map(|m| m.channel)
    }
}

// ---------------------------------------------------------------------------
// SeriesPoint / Batch
// ---------------------------------------------------------------------------

/// One timestamped sensor value. Sequences of these are kept sorted
/// ascending by timestamp; values are always finite (bad rows are dropped
/// during extraction, never coerced).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesPoint {
    pub timestamp: NaiveDateTime,
    pub value: f64,
}

/// One fermentation run: canonical label plus its two extracted series.
#[derive(Debug, Clone)]
pub struct Batch {
    pub label: String,
    pub temperature: Vec<SeriesPoint>,
    pub pressure: Vec<SeriesPoint>,
    pub source_filename: String,
}

impl Batch {
    /// The stored series for one channel.
    pub fn series(&self, channel: Channel) -> &[SeriesPoint] {
        match channel {
            Channel::Temperature => &self.temperature,
            Channel::Pressure => &self.pressure,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_classifies_both_markers() {
        let cfg = ChannelConfig::default();
        assert_eq!(
            cfg.classify("GPF01_T1.Output_registro"),
            Some(Channel::Temperature)
        );
        assert_eq!(
            cfg.classify("GPF01_P1.Output_registro"),
            Some(Channel::Pressure)
        );
        assert_eq!(cfg.classify("GPF01_pH.Output_registro"), None);
    }

    #[test]
    fn classification_is_case_sensitive() {
        let cfg = ChannelConfig::default();
        assert_eq!(cfg.classify("gpf01_t1.output_registro"), None);
    }
}
