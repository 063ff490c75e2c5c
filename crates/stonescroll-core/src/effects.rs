//! Scroll effects.
//!
//! Resolution asks an [`EffectCatalogue`] what a scroll does and gets back a
//! list of [`EffectCommand`]s that the game state then applies. A catalogue
//! that has no entry for a scroll returns `None` and the default effect
//! (stones of the scroll's element) is used instead.

use crate::ap::TurnBuff;
use crate::board::{Element, PlayerId};
use crate::scroll::{ScrollDefinition, ScrollElement, CATACOMB_GRANT};
use serde::{Deserialize, Serialize};

/// What an effect is told about the cast it belongs to
#[derive(Debug, Clone, Copy)]
pub struct EffectContext<'a> {
    pub caster: PlayerId,
    pub scroll: &'a ScrollDefinition,
    /// The last scroll this caster resolved earlier in the same turn
    pub previous_scroll_this_turn: Option<&'a ScrollDefinition>,
}

/// A single state change requested by an effect
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum EffectCommand {
    /// Move stones from the source pool to the caster (clamped by capacity and stock)
    GrantStones { element: Element, amount: u32 },
    /// Add AP to the caster
    GrantAp { amount: u32 },
    /// Switch on a turn buff for the caster
    GrantBuff { buff: TurnBuff },
    /// Draw straight into the caster's hand, ignoring the cascade rule
    DrawScroll { deck: ScrollElement },
    /// Move the resolved scroll into the common area
    RelocateToCommonArea,
}

/// Maps a resolving scroll to its effect
pub trait EffectCatalogue: Send + Sync + std::fmt::Debug {
    /// `None` means "no entry", and the default effect applies
    fn effect_for(&self, ctx: &EffectContext<'_>) -> Option<Vec<EffectCommand>>;
}

/// The effect of a scroll with no catalogue entry.
///
/// Element scrolls grant `level` stones of their element. Catacomb scrolls
/// grant two of each element in their pattern.
pub fn default_effect(scroll: &ScrollDefinition) -> Vec<EffectCommand> {
    match scroll.element {
        ScrollElement::Element(element) => vec![EffectCommand::GrantStones {
            element,
            amount: scroll.level as u32,
        }],
        ScrollElement::Catacomb => scroll
            .activated_elements()
            .into_iter()
            .map(|element| EffectCommand::GrantStones {
                element,
                amount: CATACOMB_GRANT,
            })
            .collect(),
    }
}

/// Effects of the standard scrolls that do more than grant stones
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardEffects;

impl StandardEffects {
    fn stones(element: Element, amount: u32) -> EffectCommand {
        EffectCommand::GrantStones { element, amount }
    }
}

impl EffectCatalogue for StandardEffects {
    fn effect_for(&self, ctx: &EffectContext<'_>) -> Option<Vec<EffectCommand>> {
        let commands = match ctx.scroll.name.as_str() {
            "Breeze" => vec![EffectCommand::GrantBuff {
                buff: TurnBuff::LevelOneFree,
            }],
            "Tailwind" => vec![EffectCommand::GrantBuff {
                buff: TurnBuff::EarthWaterAsWind,
            }],
            "Gale Step" => vec![EffectCommand::GrantBuff {
                buff: TurnBuff::AlternatingFreeSteps,
            }],
            "Kindle" => vec![EffectCommand::GrantBuff {
                buff: TurnBuff::CastCostReduced,
            }],
            "Undertow" => vec![
                Self::stones(Element::Water, 2),
                EffectCommand::RelocateToCommonArea,
            ],
            "Reflection" => match ctx.previous_scroll_this_turn {
                // Reflecting a reflection would loop; it simply does nothing
                Some(previous) if previous.name != ctx.scroll.name => {
                    let inner = EffectContext {
                        caster: ctx.caster,
                        scroll: previous,
                        previous_scroll_this_turn: None,
                    };
                    self.effect_for(&inner)
                        .unwrap_or_else(|| default_effect(previous))
                        .into_iter()
                        .filter(|c| matches!(c, EffectCommand::GrantStones { .. }))
                        .collect()
                }
                _ => Vec::new(),
            },
            "Tidal Surge" => vec![EffectCommand::GrantAp { amount: 2 }],
            "Hush" => vec![EffectCommand::GrantAp { amount: 1 }],
            "Landslide" => vec![EffectCommand::DrawScroll {
                deck: ScrollElement::Element(Element::Earth),
            }],
            // Counters do their work on the stack
            "Nullify" | "Unmake" => Vec::new(),
            _ => return None,
        };
        Some(commands)
    }
}
