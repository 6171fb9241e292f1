//! Previous, next and random page links over a committed [`PageIndex`].

use rand::Rng;
use serde::Serialize;

use crate::aggregate::PageIndex;
use crate::model::{PageId, PageSummary};

/// Link to a neighbouring page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavLink {
    pub id: PageId,
    pub title: String,
    pub url: String,
}

impl From<&PageSummary> for NavLink {
    fn from(page: &PageSummary) -> Self {
        Self {
            id: page.id.clone(),
            title: page.title.clone(),
            url: page.url(),
        }
    }
}

/// Where a page sits in the index, with links to move around it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Navigation {
    /// Zero-based position, `None` when the page is not (yet) indexed.
    pub position: Option<usize>,
    pub total: usize,
    pub previous: Option<NavLink>,
    pub next: Option<NavLink>,
    pub random: Option<NavLink>,
}

impl PageIndex {
    pub fn position(&self, id: &PageId) -> Option<usize> {
        self.pages().iter().position(|page| page.id == *id)
    }

    /// The page listed before `id`. No wrap-around.
    pub fn previous(&self, id: &PageId) -> Option<&PageSummary> {
        let position = self.position(id)?;
        self.pages().get(position.checked_sub(1)?)
    }

    /// The page listed after `id`. No wrap-around.
    pub fn next(&self, id: &PageId) -> Option<&PageSummary> {
        let position = self.position(id)?;
        self.pages().get(position + 1)
    }

    /// A uniformly chosen page other than `current` whenever the index has
    /// more than one page.
    pub fn random_other<R: Rng + ?Sized>(
        &self,
        current: Option<&PageId>,
        rng: &mut R,
    ) -> Option<&PageSummary> {
        let total = self.len();
        if total == 0 {
            return None;
        }
        let current = current.and_then(|id| self.position(id));
        loop {
            let candidate = rng.gen_range(0..total);
            if total == 1 || Some(candidate) != current {
                return self.pages().get(candidate);
            }
        }
    }

    /// All navigation links for `id`.
    pub fn navigation<R: Rng + ?Sized>(&self, id: &PageId, rng: &mut R) -> Navigation {
        Navigation {
            position: self.position(id),
            total: self.len(),
            previous: self.previous(id).map(NavLink::from),
            next: self.next(id).map(NavLink::from),
            random: self.random_other(Some(id), rng).map(NavLink::from),
        }
    }
}
