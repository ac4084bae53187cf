//! Componenten die de host-graph aanroept, plus hun menu-instellingen.

use std::fmt;

use crate::value::Value;

pub mod extrude_members;
pub mod settings;

pub use settings::{ExtrudeMenu, ExtrudeSettings, MenuSlider, SettingsError};

/// Output-map van een component: pinnickname → waarde.
pub type OutputMap = std::collections::BTreeMap<String, Value>;

/// Ernst van een componentmelding, zoals de host die toont.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageLevel {
    Warning,
    Error,
}

impl fmt::Display for MessageLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Warning => "warning",
            Self::Error => "error",
        })
    }
}

/// Fouttype voor component-evaluaties.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComponentError {
    /// Ongeschikte invoer of mislukte geometrie; de gebruiker kan de invoer
    /// aanpassen en opnieuw evalueren.
    Warning(String),
    /// Invoer van het verkeerde type.
    Error(String),
}

impl ComponentError {
    #[must_use]
    pub fn warning(message: impl Into<String>) -> Self {
        Self::Warning(message.into())
    }

    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error(message.into())
    }

    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Warning(s) | Self::Error(s) => s,
        }
    }

    #[must_use]
    pub fn level(&self) -> MessageLevel {
        match self {
            Self::Warning(_) => MessageLevel::Warning,
            Self::Error(_) => MessageLevel::Error,
        }
    }
}

impl fmt::Display for ComponentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

impl std::error::Error for ComponentError {}

impl From<crate::value::ValueError> for ComponentError {
    fn from(error: crate::value::ValueError) -> Self {
        Self::Error(error.to_string())
    }
}

/// Resultaat van een component-executie.
pub type ComponentResult = Result<OutputMap, ComponentError>;

/// Trait die alle componentimplementaties dienen te implementeren. De
/// instellingen zijn een momentopname die per aanroep wordt meegegeven.
pub trait Component {
    fn evaluate(&self, inputs: &[Value], settings: &ExtrudeSettings) -> ComponentResult;
}
