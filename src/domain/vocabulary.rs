// ============================================================
// Vocabulary Layout
// ============================================================
// The vocabulary is a fixed, ordered set of `ntoken` indices.
// The first k indices are tokens that come with a pretrained
// vector; the remaining ntoken - k are initialised randomly.
//
//   0 ........ k-1 | k ........ ntoken-1
//   pretrained     | random
//
// Invariant: k <= ntoken.

use crate::error::{ModelError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VocabularyLayout {
    ntoken: usize,
    pretrained: usize,
}

impl VocabularyLayout {
    pub fn new(ntoken: usize, pretrained: usize) -> Result<Self> {
        if pretrained > ntoken {
            return Err(ModelError::PretrainedOverflow { pretrained, ntoken });
        }
        Ok(Self { ntoken, pretrained })
    }

    pub fn pretrained_count(&self) -> usize {
        self.pretrained
    }

    pub fn random_count(&self) -> usize {
        self.ntoken - self.pretrained
    }
}
