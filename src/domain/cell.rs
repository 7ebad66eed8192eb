// ============================================================
// Recurrent Cell Type
// ============================================================
// Models are configured with a cell type identifier such as
// "LSTM". Only the LSTM cell is available; anything else is
// rejected when the identifier is parsed.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// Recurrent cell used by every encoder of a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CellKind {
    #[serde(rename = "LSTM", alias = "lstm")]
    Lstm,
}

impl CellKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CellKind::Lstm => "LSTM",
        }
    }
}

impl fmt::Display for CellKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CellKind {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("lstm") {
            Ok(CellKind::Lstm)
        } else {
            Err(ModelError::UnsupportedCell(s.to_string()))
        }
    }
}
