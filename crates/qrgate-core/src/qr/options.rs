use std::fmt;
use std::str::FromStr;

pub const MIN_SIZE: u32 = 128;
pub const MAX_SIZE: u32 = 512;
pub const DEFAULT_SIZE: u32 = 256;

pub const DEFAULT_FOREGROUND: &str = "#000000";
pub const DEFAULT_BACKGROUND: &str = "#ffffff";

/// Clamps a requested pixel size to `[MIN_SIZE, MAX_SIZE]`.
pub fn clamp_size(requested: i64) -> u32 {
    let clamped = requested.clamp(i64::from(MIN_SIZE), i64::from(MAX_SIZE));
    u32::try_from(clamped).unwrap_or(DEFAULT_SIZE)
}

/// QR error-correction level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EcLevel {
    /// ~7% recovery.
    #[default]
    L,
    /// ~15%.
    M,
    /// ~25%.
    Q,
    /// ~30%.
    H,
}

impl EcLevel {
    pub fn all() -> [EcLevel; 4] {
        [EcLevel::L, EcLevel::M, EcLevel::Q, EcLevel::H]
    }

    pub fn display_name(self) -> &'static str {
        match self {
            EcLevel::L => "Low",
            EcLevel::M => "Medium",
            EcLevel::Q => "Quartile",
            EcLevel::H => "High",
        }
    }

    fn code(self) -> &'static str {
        match self {
            EcLevel::L => "L",
            EcLevel::M => "M",
            EcLevel::Q => "Q",
            EcLevel::H => "H",
        }
    }
}

impl fmt::Display for EcLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown error-correction level '{0}' (expected L, M, Q or H)")]
pub struct ParseLevelError(String);

impl FromStr for EcLevel {
    type Err = ParseLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "l" | "low" => Ok(EcLevel::L),
            "m" | "medium" => Ok(EcLevel::M),
            "q" | "quartile" => Ok(EcLevel::Q),
            "h" | "high" => Ok(EcLevel::H),
            _ => Err(ParseLevelError(s.to_string())),
        }
    }
}

impl From<EcLevel> for qrcode::EcLevel {
    fn from(level: EcLevel) -> Self {
        match level {
            EcLevel::L => qrcode::EcLevel::L,
            EcLevel::M => qrcode::EcLevel::M,
            EcLevel::Q => qrcode::EcLevel::Q,
            EcLevel::H => qrcode::EcLevel::H,
        }
    }
}

/// One field replacement. Exactly one variant per [`QrConfig`] field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigUpdate {
    Content(String),
    /// Requested size, clamped when applied.
    Size(i64),
    Foreground(String),
    Background(String),
    Level(EcLevel),
    IncludeMargin(bool),
}

/// Immutable QR configuration. Updates produce a new value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QrConfig {
    content: String,
    size: u32,
    foreground: String,
    background: String,
    level: EcLevel,
    include_margin: bool,
}

impl Default for QrConfig {
    fn default() -> Self {
        Self {
            content: String::new(),
            size: DEFAULT_SIZE,
            foreground: DEFAULT_FOREGROUND.to_string(),
            background: DEFAULT_BACKGROUND.to_string(),
            level: EcLevel::default(),
            include_margin: true,
        }
    }
}

impl QrConfig {
    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn foreground(&self) -> &str {
        &self.foreground
    }

    pub fn background(&self) -> &str {
        &self.background
    }

    pub fn level(&self) -> EcLevel {
        self.level
    }

    pub fn include_margin(&self) -> bool {
        self.include_margin
    }

    /// True when there is nothing to encode.
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    #[must_use]
    pub fn with_content(self, content: impl Into<String>) -> Self {
        self.apply(ConfigUpdate::Content(content.into()))
    }

    #[must_use]
    pub fn with_size(self, size: i64) -> Self {
        self.apply(ConfigUpdate::Size(size))
    }

    #[must_use]
    pub fn with_foreground(self, color: impl Into<String>) -> Self {
        self.apply(ConfigUpdate::Foreground(color.into()))
    }

    #[must_use]
    pub fn with_background(self, color: impl Into<String>) -> Self {
        self.apply(ConfigUpdate::Background(color.into()))
    }

    #[must_use]
    pub fn with_level(self, level: EcLevel) -> Self {
        self.apply(ConfigUpdate::Level(level))
    }

    #[must_use]
    pub fn with_include_margin(self, include_margin: bool) -> Self {
        self.apply(ConfigUpdate::IncludeMargin(include_margin))
    }

    /// Returns a copy with exactly the updated field replaced.
    #[must_use]
    pub fn apply(self, update: ConfigUpdate) -> Self {
        match update {
            ConfigUpdate::Content(content) => Self { content, ..self },
            ConfigUpdate::Size(size) => Self {
                size: clamp_size(size),
                ..self
            },
            ConfigUpdate::Foreground(foreground) => Self { foreground, ..self },
            ConfigUpdate::Background(background) => Self { background, ..self },
            ConfigUpdate::Level(level) => Self { level, ..self },
            ConfigUpdate::IncludeMargin(include_margin) => Self {
                include_margin,
                ..self
            },
        }
    }
}
