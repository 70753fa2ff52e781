//! Ordered seafarer rank vocabulary.
//!
//! Deck and engine ranks share one ordinal ladder so transitions between
//! departments compare on seniority. Bump [`RANK_VOCABULARY_VERSION`] whenever
//! a rank is added or an ordinal changes; the version is recorded on every
//! trust profile.

use serde::{Deserialize, Serialize};

pub const RANK_VOCABULARY_VERSION: u16 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rank {
    DeckCadet,
    EngineCadet,
    Deckhand,
    Wiper,
    AbleSeaman,
    Oiler,
    Bosun,
    Fitter,
    ThirdOfficer,
    FourthEngineer,
    SecondOfficer,
    ThirdEngineer,
    ChiefOfficer,
    SecondEngineer,
    Master,
    ChiefEngineer,
}

impl Rank {
    pub const ALL: [Rank; 16] = [
        Rank::DeckCadet,
        Rank::EngineCadet,
        Rank::Deckhand,
        Rank::Wiper,
        Rank::AbleSeaman,
        Rank::Oiler,
        Rank::Bosun,
        Rank::Fitter,
        Rank::ThirdOfficer,
        Rank::FourthEngineer,
        Rank::SecondOfficer,
        Rank::ThirdEngineer,
        Rank::ChiefOfficer,
        Rank::SecondEngineer,
        Rank::Master,
        Rank::ChiefEngineer,
    ];

    /// Position on the shared seniority ladder.
    pub const fn ordinal(self) -> u8 {
        match self {
            Rank::DeckCadet | Rank::EngineCadet => 0,
            Rank::Deckhand | Rank::Wiper => 1,
            Rank::AbleSeaman | Rank::Oiler => 2,
            Rank::Bosun | Rank::Fitter => 3,
            Rank::ThirdOfficer | Rank::FourthEngineer => 4,
            Rank::SecondOfficer | Rank::ThirdEngineer => 5,
            Rank::ChiefOfficer | Rank::SecondEngineer => 6,
            Rank::Master | Rank::ChiefEngineer => 7,
        }
    }

    pub const fn code(self) -> &'static str {
        match self {
            Rank::DeckCadet => "deck_cadet",
            Rank::EngineCadet => "engine_cadet",
            Rank::Deckhand => "deckhand",
            Rank::Wiper => "wiper",
            Rank::AbleSeaman => "able_seaman",
            Rank::Oiler => "oiler",
            Rank::Bosun => "bosun",
            Rank::Fitter => "fitter",
            Rank::ThirdOfficer => "third_officer",
            Rank::FourthEngineer => "fourth_engineer",
            Rank::SecondOfficer => "second_officer",
            Rank::ThirdEngineer => "third_engineer",
            Rank::ChiefOfficer => "chief_officer",
            Rank::SecondEngineer => "second_engineer",
            Rank::Master => "master",
            Rank::ChiefEngineer => "chief_engineer",
        }
    }

    /// Resolve a free-form rank code. Returns `None` for codes outside the
    /// vocabulary so callers can record them instead of guessing.
    pub fn parse(code: &str) -> Option<Self> {
        let normalized = normalize_code(code);
        let rank = match normalized.as_str() {
            "deck_cadet" | "cadet" | "deck_apprentice" => Rank::DeckCadet,
            "engine_cadet" | "engine_apprentice" => Rank::EngineCadet,
            "deckhand" | "ordinary_seaman" | "os" => Rank::Deckhand,
            "wiper" => Rank::Wiper,
            "able_seaman" | "ab" | "able_bodied_seaman" => Rank::AbleSeaman,
            "oiler" | "motorman" => Rank::Oiler,
            "bosun" | "boatswain" => Rank::Bosun,
            "fitter" => Rank::Fitter,
            "third_officer" | "3_o" | "third_mate" | "officer" => Rank::ThirdOfficer,
            "fourth_engineer" | "4_e" => Rank::FourthEngineer,
            "second_officer" | "2_o" | "second_mate" => Rank::SecondOfficer,
            "third_engineer" | "3_e" => Rank::ThirdEngineer,
            "chief_officer" | "c_o" | "chief_mate" | "first_officer" => Rank::ChiefOfficer,
            "second_engineer" | "2_e" => Rank::SecondEngineer,
            "master" | "captain" | "capt" => Rank::Master,
            "chief_engineer" | "c_e" => Rank::ChiefEngineer,
            _ => return None,
        };
        Some(rank)
    }
}

fn normalize_code(code: &str) -> String {
    let mut normalized = String::with_capacity(code.len());
    let mut last_was_separator = true;
    for ch in code.trim().chars() {
        if ch.is_ascii_alphanumeric() {
            normalized.push(ch.to_ascii_lowercase());
            last_was_separator = false;
        } else if !last_was_separator {
            normalized.push('_');
            last_was_separator = true;
        }
    }
    while normalized.ends_with('_') {
        normalized.pop();
    }
    normalized
}
