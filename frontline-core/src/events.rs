//! Narrated game events

use crate::board::HexCoord;
use crate::cards::Card;
use crate::dice::DieFace;
use crate::units::{Side, Unit};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Something that happened while executing a move
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    CardPlayed { side: Side, card: Card },
    CardDrawn { side: Side },
    UnitOrdered { unit: Unit, at: HexCoord },
    UnitUnordered { unit: Unit, at: HexCoord },
    UnitMoved { unit: Unit, from: HexCoord, to: HexCoord },
    DiceRolled { target: Unit, faces: Vec<DieFace> },
    UnitHit { unit: Unit, hits: u8, remaining: u8 },
    UnitEliminated { unit: Unit, at: HexCoord },
    MedalAwarded { side: Side, total: usize },
    UnitRetreated { unit: Unit, from: HexCoord, to: HexCoord },
    FlagIgnored { unit: Unit, at: HexCoord },
    RetreatOffered { unit: Unit, options: usize },
    GroundTaken { unit: Unit, from: HexCoord, to: HexCoord },
    TakeGroundDeclined { unit: Unit },
    OverrunOffered { unit: Unit, at: HexCoord },
    TargetSelected { unit: Unit, at: HexCoord },
    TargetUnselected { unit: Unit, at: HexCoord },
    TargetsConfirmed { count: usize },
    SandbagPlaced { at: HexCoord },
    TurnEnded { next: Side },
    GameWon { side: Side },
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::CardPlayed { side, card } => write!(f, "{side} play {card}"),
            Event::CardDrawn { side } => write!(f, "{side} draw a card"),
            Event::UnitOrdered { unit, at } => write!(f, "{unit} at {at} is ordered"),
            Event::UnitUnordered { unit, at } => write!(f, "{unit} at {at} is no longer ordered"),
            Event::UnitMoved { unit, from, to } => write!(f, "{unit} moves {from} -> {to}"),
            Event::DiceRolled { target, faces } => {
                let faces: Vec<String> = faces.iter().map(|d| d.to_string()).collect();
                write!(f, "dice against {target}: [{}]", faces.join(", "))
            }
            Event::UnitHit { unit, hits, remaining } => {
                write!(f, "{unit} takes {hits} hit(s), {remaining} left")
            }
            Event::UnitEliminated { unit, at } => write!(f, "{unit} at {at} is eliminated"),
            Event::MedalAwarded { side, total } => write!(f, "{side} gain a medal ({total} total)"),
            Event::UnitRetreated { unit, from, to } => write!(f, "{unit} retreats {from} -> {to}"),
            Event::FlagIgnored { unit, at } => write!(f, "{unit} holds {at}, ignoring a flag"),
            Event::RetreatOffered { unit, options } => {
                write!(f, "{unit} must retreat ({options} options)")
            }
            Event::GroundTaken { unit, from, to } => {
                write!(f, "{unit} takes ground {from} -> {to}")
            }
            Event::TakeGroundDeclined { unit } => write!(f, "{unit} stays put"),
            Event::OverrunOffered { unit, at } => write!(f, "{unit} at {at} may overrun"),
            Event::TargetSelected { unit, at } => write!(f, "{unit} at {at} targeted"),
            Event::TargetUnselected { unit, at } => write!(f, "{unit} at {at} no longer targeted"),
            Event::TargetsConfirmed { count } => write!(f, "{count} target(s) confirmed"),
            Event::SandbagPlaced { at } => write!(f, "sandbags placed at {at}"),
            Event::TurnEnded { next } => write!(f, "turn over, {next} to play"),
            Event::GameWon { side } => write!(f, "{side} win the battle"),
        }
    }
}
