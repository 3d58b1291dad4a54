use std::fmt;

use thiserror::Error;

use crate::library::RecordKind;

/// What a failed lookup was looking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LookupKind {
    Target,
    Instrument,
    Vapp,
    Site,
    CelestialObject,
}

impl fmt::Display for LookupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            LookupKind::Target => "target",
            LookupKind::Instrument => "instrument",
            LookupKind::Vapp => "vAPP",
            LookupKind::Site => "site",
            LookupKind::CelestialObject => "celestial object",
        };
        f.write_str(label)
    }
}

impl From<RecordKind> for LookupKind {
    fn from(kind: RecordKind) -> Self {
        match kind {
            RecordKind::Target => LookupKind::Target,
            RecordKind::Instrument => LookupKind::Instrument,
            RecordKind::Vapp => LookupKind::Vapp,
        }
    }
}

#[derive(Error, Debug)]
pub enum PlannerError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("No {kind} named '{name}' found")]
    NotFound { kind: LookupKind, name: String },

    #[error("Corrupt {kind} record '{name}': {reason}")]
    Corrupt {
        kind: RecordKind,
        name: String,
        reason: String,
    },

    #[error("Degenerate geometry: {0}")]
    DegenerateGeometry(String),

    #[error("Invalid time window: {0}")]
    InvalidTimeWindow(String),

    #[error("Unable to parse time instant '{input}': {reason}")]
    InvalidTime { input: String, reason: String },

    #[error("Unable to perform file operation: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Unable to serialize record: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP ureq error: {0}")]
    UreqHttpError(#[from] ureq::Error),

    #[error("NaN value where a number is required")]
    NaNValue(#[from] ordered_float::FloatIsNan),
}

impl PlannerError {
    pub(crate) fn not_found(kind: impl Into<LookupKind>, name: impl Into<String>) -> Self {
        PlannerError::NotFound {
            kind: kind.into(),
            name: name.into(),
        }
    }
}

impl PartialEq for PlannerError {
    fn eq(&self, other: &Self) -> bool {
        use PlannerError::*;
        match (self, other) {
            (InvalidConfiguration(a), InvalidConfiguration(b)) => a == b,
            (NotFound { kind: k1, name: n1 }, NotFound { kind: k2, name: n2 }) => {
                k1 == k2 && n1 == n2
            }
            (
                Corrupt {
                    kind: k1,
                    name: n1,
                    reason: r1,
                },
                Corrupt {
                    kind: k2,
                    name: n2,
                    reason: r2,
                },
            ) => k1 == k2 && n1 == n2 && r1 == r2,
            (DegenerateGeometry(a), DegenerateGeometry(b)) => a == b,
            (InvalidTimeWindow(a), InvalidTimeWindow(b)) => a == b,
            (
                InvalidTime {
                    input: i1,
                    reason: r1,
                },
                InvalidTime {
                    input: i2,
                    reason: r2,
                },
            ) => i1 == i2 && r1 == r2,

            // Wrapped foreign errors only compare by variant
            (IoError(_), IoError(_)) => true,
            (Serialization(_), Serialization(_)) => true,
            (UreqHttpError(_), UreqHttpError(_)) => true,
            (NaNValue(_), NaNValue(_)) => true,

            _ => false,
        }
    }
}
