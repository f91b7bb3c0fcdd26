//! Connection lifecycle states

use serde::{Deserialize, Serialize};

/// Device connection state
///
/// Transitions:
/// - `Uninitialized -> Online` on successful initialize + connect
/// - `Online -> Offline` on sustained frame-acquisition failure
/// - `Offline -> Reconnecting -> Online` on successful reconnection
/// - `Offline -> Reconnecting -> Offline` on failed reconnection attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    /// Device handle was never created
    #[default]
    Uninitialized,
    /// Device is not delivering frames
    Offline,
    /// Device is connected and capturing
    Online,
    /// A reconnection attempt is in flight
    Reconnecting,
}

impl ConnectionState {
    pub fn is_online(&self) -> bool {
        matches!(self, Self::Online)
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Uninitialized => "uninitialized",
            Self::Offline => "offline",
            Self::Online => "online",
            Self::Reconnecting => "reconnecting",
        };
        f.write_str(s)
    }
}
