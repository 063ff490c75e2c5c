//! Cast/response stack.
//!
//! A cast that somebody could answer opens a response window. Eligible
//! players either pass or push a response on top of the stack. Once nobody
//! can (or wants to) answer the current top, the stack resolves last in,
//! first out, and counters cancel the entry directly beneath them.

use crate::board::PlayerId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Lifecycle of the response window
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum WindowState {
    #[default]
    Idle,
    WindowOpen,
    Resolving,
}

/// Where the cast scroll was taken from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScrollSource {
    ActiveArea,
    CommonArea,
}

/// One cast on the stack
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackEntry {
    pub scroll: String,
    pub caster: PlayerId,
    pub is_counter: bool,
    /// The cast that opened the window
    pub is_original: bool,
    pub source: ScrollSource,
}

/// Outcome of one popped entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResolutionResult {
    /// Effect applied
    Resolved,
    /// Cancelled by the counter above it
    Countered,
    /// A counter that cancelled the entry beneath it
    CounteredTarget,
}

/// A popped entry with its result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedEntry {
    pub entry: StackEntry,
    pub result: ResolutionResult,
}

/// Resolve a stack given bottom to top. Results come back in pop order.
///
/// A counter with something beneath it cancels the next pop only. A counter
/// that is the last entry has nothing to cancel and resolves normally.
pub fn resolve_stack(stack: &[StackEntry]) -> Vec<ResolvedEntry> {
    let mut cancelled = false;
    let mut resolved = Vec::with_capacity(stack.len());

    for (depth, entry) in stack.iter().enumerate().rev() {
        let result = if cancelled && !entry.is_counter {
            cancelled = false;
            ResolutionResult::Countered
        } else if entry.is_counter && depth > 0 {
            cancelled = true;
            ResolutionResult::CounteredTarget
        } else {
            cancelled = false;
            ResolutionResult::Resolved
        };

        resolved.push(ResolvedEntry {
            entry: entry.clone(),
            result,
        });
    }

    resolved
}

/// The open response window: stack plus per-player bookkeeping.
///
/// `acted` tracks who has answered the *current* top of the stack, so a new
/// response starts a fresh round.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseWindow {
    state: WindowState,
    /// Bottom to top
    stack: Vec<StackEntry>,
    /// Players able to answer the current top
    eligible: BTreeSet<PlayerId>,
    acted: BTreeSet<PlayerId>,
    /// Clock time at which an eligible player is auto-passed
    deadlines: BTreeMap<PlayerId, u64>,
    round: u32,
}

impl ResponseWindow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> WindowState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == WindowState::WindowOpen
    }

    /// Entries bottom to top
    pub fn stack(&self) -> &[StackEntry] {
        &self.stack
    }

    pub fn top(&self) -> Option<&StackEntry> {
        self.stack.last()
    }

    /// Whether a scroll is already somewhere on the stack
    pub fn contains(&self, scroll: &str) -> bool {
        self.stack.iter().any(|e| e.scroll == scroll)
    }

    /// Number of responses pushed since the window opened
    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn is_eligible(&self, player: PlayerId) -> bool {
        self.eligible.contains(&player)
    }

    pub fn has_acted(&self, player: PlayerId) -> bool {
        self.acted.contains(&player)
    }

    pub fn deadline(&self, player: PlayerId) -> Option<u64> {
        self.deadlines.get(&player).copied()
    }

    /// Eligible players who have not yet answered the current top
    pub fn waiting_on(&self) -> Vec<PlayerId> {
        self.eligible.difference(&self.acted).copied().collect()
    }

    /// Every eligible player has answered the current top
    pub fn all_acted(&self) -> bool {
        self.eligible.is_subset(&self.acted)
    }

    /// Open the window with the original cast
    pub fn open<I>(&mut self, original: StackEntry, eligible: I, now_ms: u64, timeout_ms: u64)
    where
        I: IntoIterator<Item = PlayerId>,
    {
        self.state = WindowState::WindowOpen;
        self.stack = vec![original];
        self.round = 0;
        self.start_round(eligible, now_ms, timeout_ms);
    }

    /// Push a response and start a new round for the new top
    pub fn push_response<I>(&mut self, entry: StackEntry, eligible: I, now_ms: u64, timeout_ms: u64)
    where
        I: IntoIterator<Item = PlayerId>,
    {
        self.stack.push(entry);
        self.round += 1;
        self.start_round(eligible, now_ms, timeout_ms);
    }

    fn start_round<I>(&mut self, eligible: I, now_ms: u64, timeout_ms: u64)
    where
        I: IntoIterator<Item = PlayerId>,
    {
        self.eligible = eligible.into_iter().collect();
        self.acted.clear();
        let deadline = now_ms.saturating_add(timeout_ms);
        self.deadlines = self.eligible.iter().map(|p| (*p, deadline)).collect();
    }

    /// Record a pass. Returns `true` once every eligible player has acted.
    pub fn record_pass(&mut self, player: PlayerId) -> bool {
        self.acted.insert(player);
        self.deadlines.remove(&player);
        self.all_acted()
    }

    /// Eligible players still waiting whose deadline has passed
    pub fn expired(&self, now_ms: u64) -> Vec<PlayerId> {
        self.deadlines
            .iter()
            .filter(|(player, deadline)| **deadline <= now_ms && !self.acted.contains(player))
            .map(|(player, _)| *player)
            .collect()
    }

    /// Enter resolution and hand over the stack
    pub fn begin_resolving(&mut self) -> Vec<StackEntry> {
        self.state = WindowState::Resolving;
        self.eligible.clear();
        self.acted.clear();
        self.deadlines.clear();
        std::mem::take(&mut self.stack)
    }

    /// Back to idle once effects are applied
    pub fn close(&mut self) {
        *self = Self::default();
    }
}
