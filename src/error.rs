// ============================================================
// Model Construction Errors
// ============================================================
// Every way building a model can fail. Forward passes do not
// return errors: shape and index problems at that point are
// caught by Burn's own checks.

pub type Result<T> = std::result::Result<T, ModelError>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    #[error("when using the tied flag, nhid ({nhid}) must be equal to ninp ({ninp})")]
    TiedWidthMismatch { nhid: usize, ninp: usize },

    #[error("{pretrained} pretrained vectors do not fit a vocabulary of {ntoken} tokens")]
    PretrainedOverflow { pretrained: usize, ntoken: usize },

    #[error("pretrained vector {index} has width {found}, expected {expected}")]
    PretrainedWidth {
        index: usize,
        expected: usize,
        found: usize,
    },

    #[error("hidden width {0} cannot be split evenly between two directions")]
    OddHiddenWidth(usize),

    #[error("a recurrent encoder needs at least one layer")]
    ZeroLayers,

    #[error("bottom model is incompatible: {0}")]
    IncompatibleBottom(String),

    #[error(
        "cannot carry a bottom state of width {bottom} into a top stage of width {top}; \
         set reset_top_state or use equal widths"
    )]
    StateWidthMismatch { bottom: usize, top: usize },

    #[error("unsupported recurrent cell type '{0}'")]
    UnsupportedCell(String),
}

impl ModelError {
    pub fn incompatible_bottom(message: impl Into<String>) -> Self {
        Self::IncompatibleBottom(message.into())
    }
}
