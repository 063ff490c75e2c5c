//! Core game state machine.
//!
//! This module contains the main `GameState` struct and all game logic.
//! Every mutating operation checks its preconditions first and either
//! completes or returns a `GameError` without touching the state.

use crate::actions::{GameAction, GameEvent};
use crate::ap::cast_cost;
use crate::board::{Board, Element, PlayerId, Shrine};
use crate::config::RulesConfig;
use crate::effects::{default_effect, EffectCatalogue, EffectCommand, EffectContext, StandardEffects};
use crate::hex::HexCoord;
use crate::interaction::{effective_type, recheck_all_stone_interactions};
use crate::movement::{can_land, path_cost, shortest_path, MoveContext, PathCost, PathError};
use crate::player::{
    CascadeDestination, CommonArea, PendingCascade, Player, ScrollDecks, ScrollLocation,
};
use crate::pool::StoneCounts;
use crate::response::{
    resolve_stack, ResolutionResult, ResponseWindow, ScrollSource, StackEntry, WindowState,
};
use crate::scroll::{matches, ScrollCatalogue, ScrollElement};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Smallest supported table
const MIN_PLAYERS: usize = 2;

/// One home tile per ring slot
const MAX_PLAYERS: usize = 6;

/// Game phase
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Turns are being played
    InProgress,

    /// Game is over
    Finished {
        winner: PlayerId,
    },
}

/// Errors that can occur when applying actions
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum GameError {
    #[error("Not your turn")]
    NotYourTurn,

    #[error("Game is over")]
    GameOver,

    #[error("A game needs 2 to 6 players, got {0}")]
    InvalidPlayerCount(usize),

    #[error("No player {0}")]
    UnknownPlayer(PlayerId),

    #[error("No scroll named {0}")]
    UnknownScroll(String),

    #[error("{0} is not in your active area or the common area")]
    ScrollNotAvailable(String),

    #[error("{0} can only be cast as a response")]
    ResponseOnly(String),

    #[error("The pattern for {0} is not satisfied at your position")]
    PatternNotSatisfied(String),

    #[error("Costs {cost} AP but only {available} available")]
    CannotAfford { cost: u32, available: u32 },

    #[error("A response window is open")]
    WindowOpen,

    #[error("No response window is open")]
    NoWindowOpen,

    #[error("You cannot respond to this scroll")]
    NotEligible,

    #[error("You already acted on this scroll")]
    AlreadyActed,

    #[error("{0} is already on the stack")]
    ScrollOnStack(String),

    #[error("A scroll cascade must be resolved first")]
    CascadePending,

    #[error("No scroll cascade is pending")]
    NoPendingCascade,

    #[error("Only the cascading player can route the scroll")]
    NotCascadingPlayer,

    #[error("Cannot route {0} there")]
    InvalidCascadeChoice(String),

    #[error("The active area is full")]
    ActiveAreaFull,

    #[error("{0} is not in your hand")]
    NotInHand(String),

    #[error("You do not hold {0}")]
    ScrollNotHeld(String),

    #[error("Hand or active area is over capacity")]
    ScrollOverflow,

    #[error(transparent)]
    Path(#[from] PathError),

    #[error("{0} is out of reach")]
    OutOfReach(HexCoord),

    #[error("{0} is not on a revealed tile")]
    NotRevealed(HexCoord),

    #[error("{0} already holds a stone")]
    HexOccupied(HexCoord),

    #[error("Another player stands on {0}")]
    PlayerInTheWay(HexCoord),

    #[error("Only void stones can be placed under yourself")]
    NotUnderSelf,

    #[error("No {0} stones in your pool")]
    NoStones(Element),

    #[error("No stone at {0}")]
    NoStone(HexCoord),
}

/// The complete game state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    /// Rule constants in force
    pub rules: RulesConfig,
    /// Scroll definitions
    pub catalogue: ScrollCatalogue,
    /// The game board
    pub board: Board,
    /// All players
    pub players: Vec<Player>,
    /// Current player index
    pub current_player: PlayerId,
    /// Current game phase
    pub phase: GamePhase,
    /// Turn number (starts at 1)
    pub turn_number: u32,
    /// Stones nobody holds and nobody has placed
    pub source_pool: StoneCounts,
    /// Undrawn scrolls per deck
    pub decks: ScrollDecks,
    /// Scrolls on display for everyone
    pub common_area: CommonArea,
    /// Response window and stack
    pub response: ResponseWindow,
    /// Blocking cascade choice
    pub pending_cascade: Option<PendingCascade>,
    /// Caller-driven clock (milliseconds)
    clock_ms: u64,
    /// Seed the layout and decks were built from
    rng_seed: u64,
    /// Not serialized; re-attach with `attach_effects` after loading
    #[serde(skip)]
    effects: Option<Arc<dyn EffectCatalogue>>,
}

impl GameState {
    /// Create a new game with the standard effects
    pub fn new(
        player_names: Vec<String>,
        rules: RulesConfig,
        seed: u64,
    ) -> Result<Self, GameError> {
        Self::with_effects(player_names, rules, seed, Some(Arc::new(StandardEffects)))
    }

    /// Create a new game with an explicit (or no) effect catalogue.
    ///
    /// The board layout, shrine deck and scroll decks are all drawn from
    /// `seed`, so the same seed and names always build the same game.
    pub fn with_effects(
        player_names: Vec<String>,
        rules: RulesConfig,
        seed: u64,
        effects: Option<Arc<dyn EffectCatalogue>>,
    ) -> Result<Self, GameError> {
        let player_count = player_names.len();
        if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&player_count) {
            return Err(GameError::InvalidPlayerCount(player_count));
        }

        let mut rng = StdRng::seed_from_u64(seed);
        let board = Board::standard_with_rng(player_count as PlayerId, &mut rng);
        let catalogue = ScrollCatalogue::standard();
        let decks = ScrollDecks::from_catalogue(&catalogue, &mut rng);

        let mut source_pool = StoneCounts::uniform(rules.source_pool_capacity);
        let players: Vec<Player> = player_names
            .into_iter()
            .enumerate()
            .map(|(i, name)| {
                let id = i as PlayerId;
                let position = match board.home_tile(id) {
                    Some(tile) => tile.origin,
                    None => {
                        warn!(player = id, "no home tile, starting at the origin");
                        HexCoord::ORIGIN
                    }
                };

                let mut player = Player::new(id, name, position);
                for element in Element::ALL {
                    source_pool.transfer_to(
                        &mut player.pool,
                        element,
                        rules.starting_stones,
                        rules.player_pool_capacity,
                    );
                }
                player
            })
            .collect();

        let mut state = Self {
            rules,
            catalogue,
            board,
            players,
            current_player: 0,
            phase: GamePhase::InProgress,
            turn_number: 1,
            source_pool,
            decks,
            common_area: CommonArea::new(),
            response: ResponseWindow::new(),
            pending_cascade: None,
            clock_ms: 0,
            rng_seed: seed,
            effects,
        };
        // Every player starts with full AP
        for id in 0..state.players.len() as PlayerId {
            state.refresh_ap(id);
        }

        info!(players = state.players.len(), seed, "game created");
        Ok(state)
    }

    /// Re-attach the effect catalogue (it is not part of the saved state)
    pub fn attach_effects(&mut self, effects: Option<Arc<dyn EffectCatalogue>>) {
        self.effects = effects;
    }

    /// Serialize to JSON for save/resume
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Load from JSON and attach the standard effects
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let mut state: Self = serde_json::from_str(json)?;
        state.attach_effects(Some(Arc::new(StandardEffects)));
        Ok(state)
    }

    /// Get the number of players
    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    /// Get a player by ID
    pub fn get_player(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(id as usize)
    }

    fn player(&self, id: PlayerId) -> Result<&Player, GameError> {
        self.get_player(id).ok_or(GameError::UnknownPlayer(id))
    }

    fn player_mut(&mut self, id: PlayerId) -> Result<&mut Player, GameError> {
        self.players
            .get_mut(id as usize)
            .ok_or(GameError::UnknownPlayer(id))
    }

    /// Check if the game is finished
    pub fn is_finished(&self) -> bool {
        matches!(self.phase, GamePhase::Finished { .. })
    }

    /// Get the winner if the game is finished
    pub fn get_winner(&self) -> Option<PlayerId> {
        if let GamePhase::Finished { winner } = self.phase {
            Some(winner)
        } else {
            None
        }
    }

    /// Current clock value
    pub fn clock_ms(&self) -> u64 {
        self.clock_ms
    }

    /// Seed the game was created with
    pub fn rng_seed(&self) -> u64 {
        self.rng_seed
    }

    /// Stones of `element` in the source pool, all player pools and on the
    /// board. Constant for the whole game.
    pub fn stone_total(&self, element: Element) -> u32 {
        self.source_pool.get(element)
            + self.players.iter().map(|p| p.pool.get(element)).sum::<u32>()
            + self.board.count_of(element)
    }

    // ==================== Rendering ====================

    /// Pixel center of a cell at the configured hex size
    pub fn hex_to_pixel(&self, hex: HexCoord) -> (f64, f64) {
        hex.to_pixel(self.rules.hex_size)
    }

    /// Cell under a pixel position
    pub fn hex_at_pixel(&self, x: f64, y: f64) -> HexCoord {
        HexCoord::from_pixel(x, y, self.rules.hex_size)
    }

    /// Whether a pixel position is on `hex`'s center, within the configured
    /// same-hex epsilon
    pub fn is_pixel_on_hex(&self, hex: HexCoord, x: f64, y: f64) -> bool {
        hex.same_pixel_hex(x, y, self.rules.hex_size, self.rules.same_hex_epsilon)
    }

    // ==================== Preconditions ====================

    fn ensure_in_progress(&self) -> Result<(), GameError> {
        if self.is_finished() {
            return Err(GameError::GameOver);
        }
        Ok(())
    }

    /// Gate for the ordinary turn actions
    fn ensure_can_act(&self, player: PlayerId) -> Result<(), GameError> {
        self.ensure_in_progress()?;
        self.player(player)?;
        if self.pending_cascade.is_some() {
            return Err(GameError::CascadePending);
        }
        if self.response.state() != WindowState::Idle {
            return Err(GameError::WindowOpen);
        }
        if player != self.current_player {
            return Err(GameError::NotYourTurn);
        }
        Ok(())
    }

    fn ensure_affordable(player: &Player, cost: u32) -> Result<(), GameError> {
        if !player.ap.can_afford(cost) {
            return Err(GameError::CannotAfford {
                cost,
                available: player.ap.total(),
            });
        }
        Ok(())
    }

    /// Hexes holding every token but `player`'s
    fn occupied_by_others(&self, player: PlayerId) -> Vec<HexCoord> {
        self.players
            .iter()
            .filter(|p| p.id != player)
            .map(|p| p.position)
            .collect()
    }

    // ==================== Scroll Queries ====================

    /// Scrolls `player` could cast right now: their active area plus the
    /// common area, filtered by the pattern at their own position
    pub fn find_castable_scrolls(&self, player: PlayerId) -> Vec<String> {
        let Some(p) = self.get_player(player) else {
            return Vec::new();
        };
        let candidates = p.castable_candidates().iter().chain(self.common_area.scrolls());
        self.catalogue.castable_at(candidates, p.position, &self.board)
    }

    /// Whether `player` could answer a stack holding `stack`
    fn can_respond_to(&self, player: &Player, stack: &[StackEntry]) -> bool {
        if !player.ap.can_afford(self.rules.response_cost) {
            return false;
        }
        self.find_castable_scrolls(player.id)
            .iter()
            .any(|name| !stack.iter().any(|e| &e.scroll == name))
    }

    fn responders(&self, stack: &[StackEntry]) -> Vec<PlayerId> {
        self.players
            .iter()
            .filter(|p| self.can_respond_to(p, stack))
            .map(|p| p.id)
            .collect()
    }

    /// Whether `player` has the AP and a castable scroll (not already on the
    /// stack) to respond with
    pub fn can_player_respond(&self, player: PlayerId) -> bool {
        match self.get_player(player) {
            Some(p) => self.can_respond_to(p, self.response.stack()),
            None => false,
        }
    }

    /// Where `player` would cast `scroll` from
    fn scroll_source(&self, player: &Player, scroll: &str) -> Option<ScrollSource> {
        if player.scrolls.location(scroll) == Some(ScrollLocation::Active) {
            Some(ScrollSource::ActiveArea)
        } else if self.common_area.contains(scroll) {
            Some(ScrollSource::CommonArea)
        } else {
            None
        }
    }

    // ==================== Casting and Responding ====================

    /// Cast a scroll. Opens a response window when somebody could answer,
    /// otherwise resolves it on the spot.
    pub fn cast_scroll(
        &mut self,
        player: PlayerId,
        scroll: &str,
    ) -> Result<Vec<GameEvent>, GameError> {
        self.ensure_can_act(player)?;

        let def = self
            .catalogue
            .get(scroll)
            .ok_or_else(|| GameError::UnknownScroll(scroll.to_string()))?;
        let caster = self.player(player)?;
        let source = self
            .scroll_source(caster, scroll)
            .ok_or_else(|| GameError::ScrollNotAvailable(scroll.to_string()))?;
        if def.is_response_only {
            return Err(GameError::ResponseOnly(scroll.to_string()));
        }
        if !matches(def, caster.position, &self.board) {
            return Err(GameError::PatternNotSatisfied(scroll.to_string()));
        }

        let cost = cast_cost(
            def,
            &caster.buffs,
            self.rules.base_cast_cost,
            self.rules.reduced_cast_cost,
        );
        Self::ensure_affordable(caster, cost)?;

        let entry = StackEntry {
            scroll: scroll.to_string(),
            caster: player,
            is_counter: def.can_counter_any,
            is_original: true,
            source,
        };

        let caster = self.player_mut(player)?;
        caster.ap.spend(cost);
        let remaining = caster.ap;
        info!(player, scroll, cost, "scroll cast");

        let mut events = vec![GameEvent::ScrollCast {
            player,
            scroll: scroll.to_string(),
            cost,
            source,
            remaining,
        }];

        let eligible = self.responders(std::slice::from_ref(&entry));
        if eligible.is_empty() {
            events.extend(self.resolve_entries(vec![entry], true));
        } else {
            info!(scroll, ?eligible, "response window opened");
            events.push(GameEvent::ResponseWindowOpened {
                caster: player,
                scroll: scroll.to_string(),
                eligible: eligible.clone(),
            });
            self.response.open(
                entry,
                eligible,
                self.clock_ms,
                self.rules.response_timeout_ms,
            );
        }

        Ok(events)
    }

    /// Answer the open window with a scroll. Response cost is flat and
    /// ignores turn buffs.
    pub fn respond(
        &mut self,
        player: PlayerId,
        scroll: &str,
    ) -> Result<Vec<GameEvent>, GameError> {
        self.ensure_in_progress()?;
        if !self.response.is_open() {
            return Err(GameError::NoWindowOpen);
        }
        if !self.response.is_eligible(player) {
            return Err(GameError::NotEligible);
        }
        if self.response.has_acted(player) {
            return Err(GameError::AlreadyActed);
        }

        let def = self
            .catalogue
            .get(scroll)
            .ok_or_else(|| GameError::UnknownScroll(scroll.to_string()))?;
        let responder = self.player(player)?;
        let source = self
            .scroll_source(responder, scroll)
            .ok_or_else(|| GameError::ScrollNotAvailable(scroll.to_string()))?;
        if self.response.contains(scroll) {
            return Err(GameError::ScrollOnStack(scroll.to_string()));
        }
        if !matches(def, responder.position, &self.board) {
            return Err(GameError::PatternNotSatisfied(scroll.to_string()));
        }
        let cost = self.rules.response_cost;
        Self::ensure_affordable(responder, cost)?;

        let entry = StackEntry {
            scroll: scroll.to_string(),
            caster: player,
            is_counter: def.can_counter_any,
            is_original: false,
            source,
        };

        self.player_mut(player)?.ap.spend(cost);
        info!(player, scroll, is_counter = entry.is_counter, "response added");

        let mut events = vec![GameEvent::ResponseAdded {
            player,
            scroll: scroll.to_string(),
            is_counter: entry.is_counter,
            cost,
        }];

        let mut stack = self.response.stack().to_vec();
        stack.push(entry.clone());
        let eligible = self.responders(&stack);
        let nobody_left = eligible.is_empty();
        self.response.push_response(
            entry,
            eligible,
            self.clock_ms,
            self.rules.response_timeout_ms,
        );

        if nobody_left {
            events.extend(self.resolve_window());
        }
        Ok(events)
    }

    /// Decline to answer the current top of the stack
    pub fn pass(&mut self, player: PlayerId) -> Result<Vec<GameEvent>, GameError> {
        self.ensure_in_progress()?;
        if !self.response.is_open() {
            return Err(GameError::NoWindowOpen);
        }
        if !self.response.is_eligible(player) {
            return Err(GameError::NotEligible);
        }
        if self.response.has_acted(player) {
            return Err(GameError::AlreadyActed);
        }

        let mut events = vec![GameEvent::PlayerPassed {
            player,
            timed_out: false,
        }];
        if self.response.record_pass(player) {
            events.extend(self.resolve_window());
        }
        Ok(events)
    }

    /// Move the clock forward and auto-pass every player whose deadline has
    /// expired. The clock never runs backwards.
    pub fn advance_clock(&mut self, now_ms: u64) -> Result<Vec<GameEvent>, GameError> {
        self.clock_ms = self.clock_ms.max(now_ms);

        let mut events = Vec::new();
        if !self.response.is_open() {
            return Ok(events);
        }

        let mut everyone_acted = false;
        for player in self.response.expired(self.clock_ms) {
            debug!(player, "response deadline expired");
            events.push(GameEvent::PlayerPassed {
                player,
                timed_out: true,
            });
            everyone_acted = self.response.record_pass(player);
        }

        if everyone_acted {
            events.extend(self.resolve_window());
        }
        Ok(events)
    }

    fn resolve_window(&mut self) -> Vec<GameEvent> {
        let stack = self.response.begin_resolving();
        let events = self.resolve_entries(stack, false);
        self.response.close();
        events
    }

    /// Pop the stack and apply what survives, in pop order
    fn resolve_entries(&mut self, stack: Vec<StackEntry>, skipped: bool) -> Vec<GameEvent> {
        let results = resolve_stack(&stack);
        info!(entries = results.len(), skipped, "stack resolved");

        let mut events = vec![GameEvent::StackResolved {
            results: results.clone(),
            skipped,
        }];

        for resolved in &results {
            match resolved.result {
                ResolutionResult::Resolved => {
                    events.extend(self.apply_resolved_effect(&resolved.entry));
                }
                // A counter's effect is the cancellation itself
                ResolutionResult::CounteredTarget => {
                    events.extend(self.finish_resolution(&resolved.entry, false));
                }
                ResolutionResult::Countered => {}
            }
        }

        events
    }

    /// Apply a resolved entry's effect. Never opens a response window.
    fn apply_resolved_effect(&mut self, entry: &StackEntry) -> Vec<GameEvent> {
        let Some(def) = self.catalogue.get(&entry.scroll).cloned() else {
            warn!(scroll = %entry.scroll, "resolved scroll missing from the catalogue");
            return Vec::new();
        };
        let Some(caster) = self.get_player(entry.caster) else {
            warn!(player = entry.caster, "resolved scroll has no caster");
            return Vec::new();
        };

        let previous = caster
            .previous_scroll
            .as_deref()
            .and_then(|name| self.catalogue.get(name))
            .cloned();
        let ctx = EffectContext {
            caster: entry.caster,
            scroll: &def,
            previous_scroll_this_turn: previous.as_ref(),
        };
        let commands = self
            .effects
            .as_ref()
            .and_then(|effects| effects.effect_for(&ctx))
            .unwrap_or_else(|| default_effect(&def));

        let mut events = Vec::new();
        let mut relocate = false;
        for command in commands {
            match command {
                EffectCommand::RelocateToCommonArea => relocate = true,
                other => events.extend(self.apply_command(entry.caster, other)),
            }
        }

        events.extend(self.finish_resolution(entry, relocate));
        events
    }

    fn apply_command(&mut self, caster: PlayerId, command: EffectCommand) -> Vec<GameEvent> {
        let idx = caster as usize;
        if idx >= self.players.len() {
            return Vec::new();
        }

        match command {
            EffectCommand::GrantStones { element, amount } => {
                let granted = self.source_pool.transfer_to(
                    &mut self.players[idx].pool,
                    element,
                    amount,
                    self.rules.player_pool_capacity,
                );
                vec![GameEvent::StonesGranted {
                    player: caster,
                    element,
                    requested: amount,
                    granted,
                }]
            }
            EffectCommand::GrantAp { amount } => {
                let max_ap = self.rules.max_ap;
                let player = &mut self.players[idx];
                let void_stones = player.void_stones();
                player.ap.add(amount, max_ap, void_stones);
                vec![GameEvent::ApGranted {
                    player: caster,
                    amount,
                    ap: player.ap,
                }]
            }
            EffectCommand::GrantBuff { buff } => {
                self.players[idx].buffs.grant(buff);
                vec![GameEvent::BuffGranted {
                    player: caster,
                    buff,
                }]
            }
            EffectCommand::DrawScroll { deck } => match self.decks.draw(deck) {
                // Straight to hand, overflow is fixed before the turn ends
                Some(scroll) => {
                    self.players[idx].scrolls.add_to_hand(scroll.clone());
                    vec![GameEvent::ScrollDrawn {
                        player: caster,
                        scroll,
                        deck,
                    }]
                }
                None => vec![GameEvent::ScrollDeckEmpty { deck }],
            },
            EffectCommand::RelocateToCommonArea => Vec::new(),
        }
    }

    /// Bookkeeping after a successful resolution: previous-scroll record,
    /// activated elements, win check and where the scroll ends up.
    fn finish_resolution(&mut self, entry: &StackEntry, relocate: bool) -> Vec<GameEvent> {
        let mut events = Vec::new();
        let Some(def) = self.catalogue.get(&entry.scroll).cloned() else {
            return events;
        };
        let Some(caster) = self.players.get_mut(entry.caster as usize) else {
            return events;
        };

        caster.previous_scroll = Some(def.name.clone());
        let newly = caster.scrolls.record_activation(&def.activated_elements());
        let has_all = caster.scrolls.has_all_elements();
        if !newly.is_empty() {
            events.push(GameEvent::ElementsActivated {
                player: entry.caster,
                elements: newly,
            });
        }
        if has_all && !self.is_finished() {
            info!(player = entry.caster, "all five elements activated");
            self.phase = GamePhase::Finished {
                winner: entry.caster,
            };
            events.push(GameEvent::GameWon {
                player: entry.caster,
            });
        }

        match entry.source {
            ScrollSource::ActiveArea if relocate => {
                if self.players[entry.caster as usize].scrolls.remove(&def.name).is_some() {
                    events.extend(self.place_in_common(Some(entry.caster), def.name.clone()));
                }
            }
            ScrollSource::ActiveArea => {}
            ScrollSource::CommonArea if relocate => {}
            ScrollSource::CommonArea => {
                if let Some(slot) = self.common_area.remove(&def.name) {
                    self.decks.put_bottom(slot, def.name.clone());
                    events.push(GameEvent::ScrollReturnedToDeck {
                        scroll: def.name,
                        deck: slot,
                    });
                }
            }
        }

        events
    }

    /// Display a scroll in its common-area slot, bumping the previous one to
    /// the bottom of its deck
    fn place_in_common(&mut self, player: Option<PlayerId>, scroll: String) -> Vec<GameEvent> {
        let Some(slot) = self.catalogue.get(&scroll).map(|s| s.element) else {
            warn!(%scroll, "cannot place an unknown scroll in the common area");
            return Vec::new();
        };

        let mut events = Vec::new();
        if let Some(bumped) = self.common_area.place(slot, scroll.clone()) {
            self.decks.put_bottom(slot, bumped.clone());
            events.push(GameEvent::ScrollReturnedToDeck {
                scroll: bumped,
                deck: slot,
            });
        }
        events.insert(0, GameEvent::ScrollMovedToCommon { player, scroll });
        events
    }

    // ==================== Movement ====================

    /// Cost of walking `path` from the player's position with their buffs
    pub fn calculate_path_cost(
        &self,
        player: PlayerId,
        path: &[HexCoord],
    ) -> Result<PathCost, GameError> {
        let mover = self.player(player)?;
        let occupied = self.occupied_by_others(player);
        let ctx = MoveContext::new(&self.board, &occupied, mover.buffs.earth_water_as_wind);
        let cost = path_cost(
            &ctx,
            mover.position,
            path,
            mover.buffs.alternating_free_steps,
            mover.buffs.banked_free_step,
        )?;
        debug!(player, total = cost.total, steps = path.len(), "path cost");
        Ok(cost)
    }

    /// Cheapest affordable route for `player` to land on `hex`
    fn plan_route(&self, player: PlayerId, hex: HexCoord) -> Result<Vec<HexCoord>, GameError> {
        let mover = self.player(player)?;
        if !can_land(&self.board, &hex) {
            return Err(PathError::CannotLand(hex).into());
        }

        let occupied = self.occupied_by_others(player);
        let ctx = MoveContext::new(&self.board, &occupied, mover.buffs.earth_water_as_wind);
        let route = shortest_path(
            &ctx,
            mover.position,
            hex,
            mover.buffs.alternating_free_steps,
            mover.buffs.banked_free_step,
        )
        .ok_or(PathError::NoRoute(hex))?;
        Self::ensure_affordable(mover, route.cost)?;
        Ok(route.path)
    }

    /// Whether `player` could move to `hex` right now
    pub fn can_player_move_to_hex(&self, player: PlayerId, hex: HexCoord) -> bool {
        self.ensure_can_act(player).is_ok() && self.plan_route(player, hex).is_ok()
    }

    /// Walk an explicit path. The whole path is validated and paid up front.
    pub fn move_along_path(
        &mut self,
        player: PlayerId,
        path: &[HexCoord],
    ) -> Result<Vec<GameEvent>, GameError> {
        self.ensure_can_act(player)?;

        let cost = self.calculate_path_cost(player, path)?;
        let Some(&end) = path.last() else {
            return Err(PathError::Empty.into());
        };
        if !can_land(&self.board, &end) {
            return Err(PathError::CannotLand(end).into());
        }
        Self::ensure_affordable(self.player(player)?, cost.total)?;

        let mover = self.player_mut(player)?;
        mover.ap.spend(cost.total);
        mover.position = end;
        mover.buffs.banked_free_step = cost.banked_after;
        info!(player, to = %end, cost = cost.total, "player moved");

        let mut events = vec![GameEvent::PlayerMoved {
            player,
            path: path.to_vec(),
            cost: cost.total,
        }];
        events.extend(self.on_landed(player, end));
        Ok(events)
    }

    /// Walk the cheapest route to `hex`
    pub fn move_to_hex(
        &mut self,
        player: PlayerId,
        hex: HexCoord,
    ) -> Result<Vec<GameEvent>, GameError> {
        self.ensure_can_act(player)?;
        let path = self.plan_route(player, hex)?;
        self.move_along_path(player, &path)
    }

    /// Landing on an unrevealed tile's cell turns it over and draws a scroll
    /// from the deck matching its shrine
    fn on_landed(&mut self, player: PlayerId, hex: HexCoord) -> Vec<GameEvent> {
        let Some(tile) = self.board.hidden_tile_at_cell(&hex) else {
            return Vec::new();
        };
        let Some(shrine) = self.board.reveal_tile(tile) else {
            return Vec::new();
        };
        info!(tile, ?shrine, "tile revealed");

        let mut events = vec![GameEvent::TileRevealed { tile, shrine }];
        let deck = match shrine {
            Shrine::Element(element) => Some(ScrollElement::Element(element)),
            Shrine::Catacomb => Some(ScrollElement::Catacomb),
            Shrine::Player => None,
        };
        if let Some(deck) = deck {
            events.extend(self.draw_into_hand(player, deck));
        }
        events
    }

    // ==================== Scroll Collections ====================

    /// Draw the top scroll of `deck` for the active player
    pub fn draw_scroll(
        &mut self,
        player: PlayerId,
        deck: ScrollElement,
    ) -> Result<Vec<GameEvent>, GameError> {
        self.ensure_can_act(player)?;
        Ok(self.draw_into_hand(player, deck))
    }

    /// Draw under the cascade rule: a full hand raises a pending cascade
    fn draw_into_hand(&mut self, player: PlayerId, deck: ScrollElement) -> Vec<GameEvent> {
        let Some(scroll) = self.decks.draw(deck) else {
            return vec![GameEvent::ScrollDeckEmpty { deck }];
        };
        let hand_capacity = self.rules.hand_capacity;
        let active_capacity = self.rules.active_capacity;
        let Some(p) = self.players.get_mut(player as usize) else {
            self.decks.put_bottom(deck, scroll);
            return Vec::new();
        };

        if p.scrolls.hand.len() < hand_capacity {
            p.scrolls.add_to_hand(scroll.clone());
            return vec![GameEvent::ScrollDrawn {
                player,
                scroll,
                deck,
            }];
        }

        let can_cascade_to_active = p.scrolls.active.len() < active_capacity;
        info!(player, %scroll, "hand full, cascade required");
        self.pending_cascade = Some(PendingCascade {
            player,
            drawn: scroll.clone(),
            can_cascade_to_active,
        });
        vec![GameEvent::CascadeRequired {
            player,
            drawn: scroll,
            can_cascade_to_active,
        }]
    }

    /// Settle the pending cascade by routing `scroll` (the drawn one or one
    /// already held) to the active area or the common area
    pub fn resolve_cascade(
        &mut self,
        player: PlayerId,
        scroll: &str,
        destination: CascadeDestination,
    ) -> Result<Vec<GameEvent>, GameError> {
        self.ensure_in_progress()?;
        let pending = self
            .pending_cascade
            .clone()
            .ok_or(GameError::NoPendingCascade)?;
        if pending.player != player {
            return Err(GameError::NotCascadingPlayer);
        }

        let active_capacity = self.rules.active_capacity;
        let hand_capacity = self.rules.hand_capacity;
        let p = self.player(player)?;
        let held = if scroll == pending.drawn {
            None
        } else {
            Some(
                p.scrolls
                    .location(scroll)
                    .ok_or_else(|| GameError::InvalidCascadeChoice(scroll.to_string()))?,
            )
        };

        if destination == CascadeDestination::Active {
            if held == Some(ScrollLocation::Active) {
                return Err(GameError::InvalidCascadeChoice(scroll.to_string()));
            }
            if p.scrolls.active.len() >= active_capacity {
                return Err(GameError::ActiveAreaFull);
            }
        }

        self.pending_cascade = None;
        let mut events = Vec::new();
        let p = self.player_mut(player)?;
        if held.is_some() {
            p.scrolls.remove(scroll);
        }
        match destination {
            CascadeDestination::Active => {
                p.scrolls.add_to_active(scroll.to_string());
            }
            CascadeDestination::Common => {
                events.extend(self.place_in_common(Some(player), scroll.to_string()));
            }
        }

        if held.is_some() {
            let p = self.player_mut(player)?;
            if p.scrolls.hand.len() < hand_capacity {
                p.scrolls.add_to_hand(pending.drawn.clone());
            } else {
                p.scrolls.add_to_active(pending.drawn.clone());
            }
        }

        info!(player, scroll, ?destination, "cascade resolved");
        events.insert(
            0,
            GameEvent::CascadeResolved {
                player,
                scroll: scroll.to_string(),
                destination,
            },
        );
        Ok(events)
    }

    /// Move a scroll from hand to the active area (free)
    pub fn activate_scroll(
        &mut self,
        player: PlayerId,
        scroll: &str,
    ) -> Result<Vec<GameEvent>, GameError> {
        self.ensure_can_act(player)?;
        let active_capacity = self.rules.active_capacity;
        let p = self.player_mut(player)?;
        if p.scrolls.location(scroll) != Some(ScrollLocation::Hand) {
            return Err(GameError::NotInHand(scroll.to_string()));
        }
        if p.scrolls.active.len() >= active_capacity {
            return Err(GameError::ActiveAreaFull);
        }

        p.scrolls.remove(scroll);
        p.scrolls.add_to_active(scroll.to_string());
        Ok(vec![GameEvent::ScrollActivated {
            player,
            scroll: scroll.to_string(),
        }])
    }

    /// Put a held scroll on display in the common area (free)
    pub fn move_scroll_to_common(
        &mut self,
        player: PlayerId,
        scroll: &str,
    ) -> Result<Vec<GameEvent>, GameError> {
        self.ensure_can_act(player)?;
        let p = self.player_mut(player)?;
        if p.scrolls.remove(scroll).is_none() {
            return Err(GameError::ScrollNotHeld(scroll.to_string()));
        }
        Ok(self.place_in_common(Some(player), scroll.to_string()))
    }

    // ==================== Stones ====================

    fn ensure_in_reach(player: &Player, hex: HexCoord) -> Result<(), GameError> {
        if player.position.distance_to(&hex) > 1 {
            return Err(GameError::OutOfReach(hex));
        }
        Ok(())
    }

    /// Fire check after the board changed
    fn recheck_interactions(&mut self) -> Vec<GameEvent> {
        recheck_all_stone_interactions(
            &mut self.board,
            &mut self.source_pool,
            self.rules.source_pool_capacity,
        )
        .into_iter()
        .map(|stone| GameEvent::StoneDestroyed {
            hex: stone.hex,
            element: stone.element,
        })
        .collect()
    }

    /// Place a stone from the player's pool on or next to their hex
    pub fn place_stone(
        &mut self,
        player: PlayerId,
        hex: HexCoord,
        element: Element,
    ) -> Result<Vec<GameEvent>, GameError> {
        self.ensure_can_act(player)?;
        let p = self.player(player)?;
        Self::ensure_in_reach(p, hex)?;
        if !self.board.is_revealed_cell(&hex) {
            return Err(GameError::NotRevealed(hex));
        }
        if self.board.stone_at(&hex).is_some() {
            return Err(GameError::HexOccupied(hex));
        }
        if self.occupied_by_others(player).contains(&hex) {
            return Err(GameError::PlayerInTheWay(hex));
        }
        if hex == p.position && element != Element::Void {
            return Err(GameError::NotUnderSelf);
        }
        if p.pool.get(element) == 0 {
            return Err(GameError::NoStones(element));
        }
        let cost = self.rules.place_stone_cost;
        Self::ensure_affordable(p, cost)?;

        let p = self.player_mut(player)?;
        p.ap.spend(cost);
        p.pool.take_one(element);
        let void_stones = p.void_stones();
        p.ap.clamp_void(void_stones);

        if self.board.insert_stone(hex, element).is_none() {
            warn!(%hex, "stone placement collided after validation");
            debug_assert!(false, "stone placement collided at {}", hex);
        }
        let appears_as = match element {
            Element::Water => effective_type(&self.board, &hex),
            _ => None,
        };
        info!(player, %hex, %element, "stone placed");

        let mut events = vec![GameEvent::StonePlaced {
            player,
            hex,
            element,
            appears_as,
        }];
        events.extend(self.recheck_interactions());
        Ok(events)
    }

    /// Break a stone on or next to the player's hex; it returns to the source
    pub fn break_stone(
        &mut self,
        player: PlayerId,
        hex: HexCoord,
    ) -> Result<Vec<GameEvent>, GameError> {
        self.ensure_can_act(player)?;
        let p = self.player(player)?;
        Self::ensure_in_reach(p, hex)?;
        if self.board.stone_at(&hex).is_none() {
            return Err(GameError::NoStone(hex));
        }
        let cost = self.rules.break_stone_cost;
        Self::ensure_affordable(p, cost)?;

        self.player_mut(player)?.ap.spend(cost);
        let mut events = Vec::new();
        if let Some(stone) = self.board.remove_stone(&hex) {
            self.source_pool
                .return_stone(stone.element, self.rules.source_pool_capacity);
            info!(player, %hex, element = %stone.element, "stone broken");
            events.push(GameEvent::StoneBroken {
                player,
                hex,
                element: stone.element,
            });
        }
        events.extend(self.recheck_interactions());
        Ok(events)
    }

    // ==================== Turns ====================

    fn refresh_ap(&mut self, player: PlayerId) {
        let max_ap = self.rules.max_ap;
        if let Some(p) = self.players.get_mut(player as usize) {
            let void_stones = p.void_stones();
            p.ap.refresh(max_ap, void_stones);
        }
    }

    /// End the active player's turn
    pub fn end_turn(&mut self, player: PlayerId) -> Result<Vec<GameEvent>, GameError> {
        self.ensure_can_act(player)?;
        let hand_capacity = self.rules.hand_capacity;
        let active_capacity = self.rules.active_capacity;
        let p = self.player(player)?;
        if p.scrolls.is_overflowing(hand_capacity, active_capacity) {
            return Err(GameError::ScrollOverflow);
        }

        let mut events = Vec::new();

        // Standing on a revealed elemental shrine tops up that element
        let position = p.position;
        let shrine = self
            .board
            .tile_at_cell(&position)
            .filter(|t| t.is_shrine_cell(&position))
            .and_then(|t| t.shrine);
        if let Some(Shrine::Element(element)) = shrine {
            let capacity = self.rules.player_pool_capacity;
            let idx = player as usize;
            let amount =
                self.source_pool
                    .transfer_to(&mut self.players[idx].pool, element, capacity, capacity);
            if amount > 0 {
                events.push(GameEvent::StonesReplenished {
                    player,
                    element,
                    amount,
                });
            }
        }

        self.player_mut(player)?.end_turn();
        for other in &mut self.players {
            other.previous_scroll = None;
        }

        let next_player = ((player as usize + 1) % self.players.len()) as PlayerId;
        self.current_player = next_player;
        self.turn_number += 1;
        self.refresh_ap(next_player);
        info!(player, next_player, turn = self.turn_number, "turn ended");

        events.push(GameEvent::TurnEnded {
            player,
            next_player,
        });
        Ok(events)
    }

    /// Apply an action to the game state
    pub fn apply_action(
        &mut self,
        player: PlayerId,
        action: GameAction,
    ) -> Result<Vec<GameEvent>, GameError> {
        match action {
            GameAction::CastScroll { scroll } => self.cast_scroll(player, &scroll),
            GameAction::Respond { scroll } => self.respond(player, &scroll),
            GameAction::Pass => self.pass(player),
            GameAction::MoveAlongPath { path } => self.move_along_path(player, &path),
            GameAction::MoveToHex { hex } => self.move_to_hex(player, hex),
            GameAction::PlaceStone { hex, element } => self.place_stone(player, hex, element),
            GameAction::BreakStone { hex } => self.break_stone(player, hex),
            GameAction::ResolveCascade {
                scroll,
                destination,
            } => self.resolve_cascade(player, &scroll, destination),
            GameAction::ActivateScroll { scroll } => self.activate_scroll(player, &scroll),
            GameAction::MoveScrollToCommon { scroll } => {
                self.move_scroll_to_common(player, &scroll)
            }
            GameAction::EndTurn => self.end_turn(player),
        }
    }
}
