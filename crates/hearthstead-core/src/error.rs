//! Command errors.
//!
//! Only genuinely invalid commands error: unknown ids, unmet purchase
//! requirements, roster limits. In-game "cannot start" conditions such as
//! a missing recipe selection or a locked recipe are inert states the
//! simulation simply idles through, never errors.

use crate::definitions::EquipSlot;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("unknown character {0}")]
    UnknownCharacter(u32),
    #[error("character has no skill `{0}`")]
    UnknownSkill(String),
    #[error("skill `{skill}` has no recipe `{recipe}`")]
    UnknownRecipe { skill: String, recipe: String },
    #[error("unknown item `{0}`")]
    UnknownItem(String),
    #[error("item `{0}` is not in the inventory")]
    ItemNotOwned(String),
    #[error("nothing equipped in slot {0:?}")]
    SlotEmpty(EquipSlot),
    #[error("inventory cannot cover the costs of `{0}`")]
    InsufficientResources(String),
    #[error("`{0}` cannot be sold")]
    NotSellable(String),
    #[error("tried to sell {requested} of `{item}` but only {owned} owned")]
    NotEnoughItems {
        item: String,
        requested: u64,
        owned: u64,
    },
    #[error("roster is full at {0} characters; buy a slot first")]
    RosterFull(u32),
    #[error("roster limit is already at the maximum of {0}")]
    RosterAtMax(u32),
    #[error("not enough gold: need {need}, have {have}")]
    NotEnoughGold { need: u64, have: u64 },
}
