use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::collections::BTreeMap;

use crate::types::Chapter;

/// Pre-aggregated reference counts shipped with a corpus, used for display
/// only. Keys of `by_epistemic` are the upper-case category names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorpusStats {
    #[serde(default)]
    pub total_references: usize,
    #[serde(default)]
    pub by_type: BTreeMap<SmolStr, usize>,
    #[serde(default)]
    pub by_epistemic: BTreeMap<SmolStr, usize>,
    #[serde(default)]
    pub by_method: BTreeMap<SmolStr, usize>,
    #[serde(default)]
    pub consensus_count: usize,
    #[serde(default)]
    pub chapters: usize,
    #[serde(default)]
    pub pages_with_content: usize,
}

impl CorpusStats {
    /// Recount everything from the chapters themselves.
    pub fn compute(chapters: &[Chapter]) -> Self {
        let mut stats = Self {
            chapters: chapters.len(),
            ..Self::default()
        };

        for page in chapters.iter().flat_map(|c| c.pages.iter()) {
            stats.pages_with_content += 1;
            for reference in &page.references {
                stats.total_references += 1;
                *stats
                    .by_type
                    .entry(reference.entity_type.clone())
                    .or_default() += 1;
                *stats
                    .by_epistemic
                    .entry(SmolStr::new_static(reference.epistemic.as_str()))
                    .or_default() += 1;
                for method in reference.detection_methods() {
                    *stats.by_method.entry(method).or_default() += 1;
                }
                if reference.consensus {
                    stats.consensus_count += 1;
                }
            }
        }

        stats
    }

    pub fn type_count(&self, id: &str) -> usize {
        self.by_type.get(id).copied().unwrap_or(0)
    }

    pub fn epistemic_count(&self, id: &str) -> usize {
        self.by_epistemic.get(id).copied().unwrap_or(0)
    }
}
