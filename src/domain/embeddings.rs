// ============================================================
// Pretrained Embeddings
// ============================================================
// An ordered list of word vectors, one per pretrained token.
// Vector i belongs to vocabulary index i, so the list length
// is the k of the vocabulary layout.
//
// Vectors are stored row-major in one flat buffer so the ML
// layer can hand them to Burn as a single [k, dim] tensor.

use crate::domain::vocabulary::VocabularyLayout;
use crate::error::{ModelError, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct PretrainedEmbeddings {
    dim: usize,
    values: Vec<f32>,
}

impl PretrainedEmbeddings {
    /// No pretrained vectors: every embedding row is random.
    pub fn empty(dim: usize) -> Self {
        Self { dim, values: Vec::new() }
    }

    /// Build from one vector per token. Every vector must be `dim` wide.
    pub fn from_rows(dim: usize, rows: Vec<Vec<f32>>) -> Result<Self> {
        let mut values = Vec::with_capacity(rows.len() * dim);
        for (index, row) in rows.into_iter().enumerate() {
            if row.len() != dim {
                return Err(ModelError::PretrainedWidth {
                    index,
                    expected: dim,
                    found: row.len(),
                });
            }
            values.extend(row);
        }
        Ok(Self { dim, values })
    }

    /// Number of pretrained tokens (k).
    pub fn len(&self) -> usize {
        if self.dim == 0 {
            0
        } else {
            self.values.len() / self.dim
        }
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// All vectors, row-major, `len()` rows of `dim` values.
    pub fn as_flat(&self) -> &[f32] {
        &self.values
    }

    /// Check these vectors against a model's vocabulary size and
    /// embedding width, returning the resulting index layout.
    pub fn layout(&self, ntoken: usize, ninp: usize) -> Result<VocabularyLayout> {
        if !self.is_empty() && self.dim != ninp {
            return Err(ModelError::PretrainedWidth {
                index: 0,
                expected: ninp,
                found: self.dim,
            });
        }
        VocabularyLayout::new(ntoken, self.len())
    }
}
