//! Pagination traversal state machine
//!
//! A traversal walks a single chain of pages: fetch, decide, and either fetch
//! the next page or stop. There is never more than one pending location.
//!
//! ```text
//! Start -> Fetching -> Deciding -> Fetching | Done
//! ```

use crate::crawler::parser::DiscoveredLinks;
use std::collections::HashSet;
use std::fmt;
use url::Url;

/// Default ceiling on pages fetched by one traversal
pub const DEFAULT_MAX_PAGES: u32 = 50;

/// Where the traversal currently stands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TraversalPhase {
    /// Created, nothing fetched yet
    Start,

    /// The current location is due to be fetched
    Fetching,

    /// The current location was fetched; waiting for its links
    Deciding,

    /// Terminal; page count and content are final
    Done,
}

/// Why a traversal reached `Done`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StopReason {
    /// Pagination was not requested
    PaginationDisabled,

    /// No strategy found a next link
    NoNextLink,

    /// The next link points at a page already fetched
    Cycle,

    /// The page ceiling was reached
    PageLimit,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::PaginationDisabled => "pagination disabled",
            Self::NoNextLink => "no next link",
            Self::Cycle => "next link repeats a visited page",
            Self::PageLimit => "page limit reached",
        };
        f.write_str(text)
    }
}

/// One way of finding the next page among a page's links
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkStrategy {
    /// A link whose visible label is exactly "Next"
    LabeledNext,

    /// A link marked `rel="next"`
    RelNext,
}

impl LinkStrategy {
    /// The order strategies are tried in
    pub const DEFAULT_ORDER: [LinkStrategy; 2] = [LinkStrategy::LabeledNext, LinkStrategy::RelNext];

    pub fn discover<'a>(&self, links: &'a DiscoveredLinks) -> Option<&'a Url> {
        match self {
            Self::LabeledNext => links.labeled_next.as_ref(),
            Self::RelNext => links.rel_next.as_ref(),
        }
    }
}

/// Traversal state for one scrape
#[derive(Debug, Clone)]
pub struct Traversal {
    phase: TraversalPhase,
    current: Url,
    visited: HashSet<Url>,
    pages_visited: u32,
    follow_pagination: bool,
    max_pages: u32,
    strategies: Vec<LinkStrategy>,
    stop_reason: Option<StopReason>,
}

impl Traversal {
    /// Creates a traversal rooted at `entry`
    ///
    /// `max_pages` is clamped to at least one page.
    pub fn new(entry: Url, follow_pagination: bool, max_pages: u32) -> Self {
        Self {
            phase: TraversalPhase::Start,
            current: entry,
            visited: HashSet::new(),
            pages_visited: 0,
            follow_pagination,
            max_pages: max_pages.max(1),
            strategies: LinkStrategy::DEFAULT_ORDER.to_vec(),
            stop_reason: None,
        }
    }

    /// Replaces the discovery strategies, tried in the given order
    pub fn with_strategies(mut self, strategies: Vec<LinkStrategy>) -> Self {
        self.strategies = strategies;
        self
    }

    pub fn phase(&self) -> TraversalPhase {
        self.phase
    }

    pub fn current(&self) -> &Url {
        &self.current
    }

    pub fn pages_visited(&self) -> u32 {
        self.pages_visited
    }

    pub fn stop_reason(&self) -> Option<StopReason> {
        self.stop_reason
    }

    pub fn is_done(&self) -> bool {
        self.phase == TraversalPhase::Done
    }

    /// Returns the location to fetch next, or None once the traversal is done
    ///
    /// Leaves `Start` for `Fetching` on first call.
    pub fn next_fetch(&mut self) -> Option<&Url> {
        if self.phase == TraversalPhase::Start {
            self.phase = TraversalPhase::Fetching;
        }

        match self.phase {
            TraversalPhase::Fetching => Some(&self.current),
            _ => None,
        }
    }

    /// Records a successful fetch of the current location
    pub fn record_fetch(&mut self) {
        if self.phase != TraversalPhase::Fetching {
            tracing::warn!("Ignoring fetch recorded in phase {:?}", self.phase);
            return;
        }
        self.visited.insert(self.current.clone());
        self.pages_visited += 1;
        self.phase = TraversalPhase::Deciding;
    }

    /// Decides, from the fetched page's links, whether to continue
    pub fn decide(&mut self, links: &DiscoveredLinks) -> TraversalPhase {
        if self.phase != TraversalPhase::Deciding {
            return self.phase;
        }

        if !self.follow_pagination {
            return self.finish(StopReason::PaginationDisabled);
        }

        if self.pages_visited >= self.max_pages {
            return self.finish(StopReason::PageLimit);
        }

        let next = self
            .strategies
            .iter()
            .find_map(|strategy| strategy.discover(links))
            .cloned();

        match next {
            None => self.finish(StopReason::NoNextLink),
            Some(next) if self.visited.contains(&next) => self.finish(StopReason::Cycle),
            Some(next) => {
                tracing::debug!("Following next link {} -> {}", self.current, next);
                self.current = next;
                self.phase = TraversalPhase::Fetching;
                self.phase
            }
        }
    }

    fn finish(&mut self, reason: StopReason) -> TraversalPhase {
        tracing::debug!(
            "Traversal done after {} page(s): {}",
            self.pages_visited,
            reason
        );
        self.stop_reason = Some(reason);
        self.phase = TraversalPhase::Done;
        self.phase
    }
}
