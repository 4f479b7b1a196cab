//! One-shot "end of list is visible" trigger.
//!
//! The view reports two things every frame: which row is currently the last
//! rendered item ([`Sentinel::attach`]) and whether that row is inside the
//! visible part of the list ([`Sentinel::observe`]).  Visibility is a level
//! (it stays true for as long as the row is on screen); loading the next page
//! must happen on an edge.  The sentinel fires once for the row it observes
//! and then detaches, so nothing more happens until a new sentinel is
//! attached after the next successful fetch.

/// Identity of the row acting as sentinel.
///
/// The row index alone is not enough: a reload can bring back a list of the
/// same length, whose last row has the same index but belongs to a different
/// fetch.  `generation` is bumped by every successful fetch
/// ([`crate::loader::FeedLoader::generation`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SentinelKey {
    pub generation: u64,
    pub row: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Observation {
    /// Watching this row; will fire when it becomes visible.
    Armed(SentinelKey),
    /// Already fired for this row.
    Detached(SentinelKey),
}

impl Observation {
    fn key(self) -> SentinelKey {
        match self {
            Observation::Armed(k) | Observation::Detached(k) => k,
        }
    }
}

/// Observer bound to the current last row.
#[derive(Debug, Default)]
pub struct Sentinel {
    observation: Option<Observation>,
}

impl Sentinel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind to the last rendered row, or unbind for an empty list.
    ///
    /// Re-attaching the same key keeps the existing observation (and with it
    /// whether it already fired).  A different key tears the old observation
    /// down and arms a fresh one.
    pub fn attach(&mut self, key: Option<SentinelKey>) {
        match (self.observation, key) {
            (Some(obs), Some(k)) if obs.key() == k => {}
            (_, Some(k)) => {
                tracing::trace!(generation = k.generation, row = k.row, "sentinel attached");
                self.observation = Some(Observation::Armed(k));
            }
            (_, None) => self.observation = None,
        }
    }

    /// Feed the current visibility of the observed row.
    ///
    /// Returns `true` exactly once per attached row: the first time it is
    /// seen visible while `can_load` is set.  The caller then issues
    /// [`crate::loader::FeedLoader::load_more`], so `can_load` must only be
    /// true when that call will produce a request (a cursor is set and no
    /// fetch is in flight).  Otherwise the row stays armed.
    pub fn observe(&mut self, visible: bool, can_load: bool) -> bool {
        match self.observation {
            Some(Observation::Armed(k)) if visible && can_load => {
                tracing::debug!(row = k.row, "sentinel visible, requesting next page");
                self.observation = Some(Observation::Detached(k));
                true
            }
            _ => false,
        }
    }

    /// Row currently armed, if any.
    #[cfg(test)]
    pub fn armed(&self) -> Option<SentinelKey> {
        match self.observation {
            Some(Observation::Armed(k)) => Some(k),
            _ => None,
        }
    }
}
