//! Facet selection: which references are eligible for a render.

use smol_str::SmolStr;
use std::collections::BTreeSet;

use crate::error::MarginaliaError;
use crate::types::{Corpus, Epistemic, Reference};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    Added,
    Removed,
    /// Removing the member would have left the set empty.
    Refused,
}

/// A set of active facet ids that always holds at least one member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FacetSet<T: Ord> {
    active: BTreeSet<T>,
}

impl<T: Ord> FacetSet<T> {
    /// Returns `None` when `items` is empty.
    pub fn new(items: impl IntoIterator<Item = T>) -> Option<Self> {
        let active: BTreeSet<T> = items.into_iter().collect();
        if active.is_empty() {
            None
        } else {
            Some(Self { active })
        }
    }

    /// Flip membership of `item`, refusing a removal that would empty the set.
    pub fn toggle(&mut self, item: T) -> ToggleOutcome {
        if !self.active.contains(&item) {
            self.active.insert(item);
            ToggleOutcome::Added
        } else if self.active.len() > 1 {
            self.active.remove(&item);
            ToggleOutcome::Removed
        } else {
            ToggleOutcome::Refused
        }
    }

    pub fn contains<Q>(&self, item: &Q) -> bool
    where
        T: std::borrow::Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.active.contains(item)
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.active.iter()
    }

    pub fn count(&self) -> usize {
        self.active.len()
    }
}

/// The two independently toggleable facet dimensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FacetSets {
    pub types: FacetSet<SmolStr>,
    pub epistemic: FacetSet<Epistemic>,
}

impl FacetSets {
    /// Deferred references stay hidden until switched on.
    pub const DEFAULT_EPISTEMIC: [Epistemic; 2] = [Epistemic::Factual, Epistemic::Interpretive];

    pub fn new(types: FacetSet<SmolStr>, epistemic: FacetSet<Epistemic>) -> Self {
        Self { types, epistemic }
    }

    /// Every entity type of the corpus, with factual and interpretive
    /// references shown.
    pub fn for_corpus(corpus: &Corpus) -> Result<Self, MarginaliaError> {
        let types = FacetSet::new(corpus.entity_type_ids())
            .ok_or(MarginaliaError::EmptyFacets("entity type"))?;
        let epistemic = FacetSet::new(Self::DEFAULT_EPISTEMIC)
            .ok_or(MarginaliaError::EmptyFacets("epistemic"))?;
        Ok(Self { types, epistemic })
    }

    pub fn admits(&self, reference: &Reference) -> bool {
        self.types.contains(reference.entity_type.as_str())
            && self.epistemic.contains(&reference.epistemic)
    }
}

/// References whose type and epistemic category are both active, in
/// detection order.
pub fn filter_references<'a>(
    references: &'a [Reference],
    facets: &FacetSets,
) -> Vec<&'a Reference> {
    references.iter().filter(|r| facets.admits(r)).collect()
}
