// ─────────────────────────────────────────────────────────────────────
// DOSE Kernel — Trait Domains
// ─────────────────────────────────────────────────────────────────────

use serde::{Deserialize, Serialize};

/// The six Mini-IPIP6 personality dimensions.
///
/// `ALL` fixes the canonical enumeration order used everywhere traits are
/// iterated: round-robin tie-breaks, estimate maps, result tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraitDomain {
    Extraversion,
    Agreeableness,
    Conscientiousness,
    Neuroticism,
    Openness,
    HonestyHumility,
}

impl TraitDomain {
    /// All domains in canonical order (E, A, C, N, O, H).
    pub const ALL: [TraitDomain; 6] = [
        TraitDomain::Extraversion,
        TraitDomain::Agreeableness,
        TraitDomain::Conscientiousness,
        TraitDomain::Neuroticism,
        TraitDomain::Openness,
        TraitDomain::HonestyHumility,
    ];

    /// Number of domains.
    pub const COUNT: usize = 6;

    /// Index for array access, following canonical order.
    #[must_use]
    pub fn index(self) -> usize {
        match self {
            TraitDomain::Extraversion => 0,
            TraitDomain::Agreeableness => 1,
            TraitDomain::Conscientiousness => 2,
            TraitDomain::Neuroticism => 3,
            TraitDomain::Openness => 4,
            TraitDomain::HonestyHumility => 5,
        }
    }

    /// Domain from canonical index.
    #[must_use]
    pub fn from_index(i: usize) -> Option<TraitDomain> {
        TraitDomain::ALL.get(i).copied()
    }

    /// One-letter tag used in the item-bank table format.
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            TraitDomain::Extraversion => "E",
            TraitDomain::Agreeableness => "A",
            TraitDomain::Conscientiousness => "C",
            TraitDomain::Neuroticism => "N",
            TraitDomain::Openness => "O",
            TraitDomain::HonestyHumility => "H",
        }
    }

    /// Parse either the one-letter tag or the long snake_case name.
    #[must_use]
    pub fn parse(s: &str) -> Option<TraitDomain> {
        match s.trim() {
            "E" | "extraversion" => Some(TraitDomain::Extraversion),
            "A" | "agreeableness" => Some(TraitDomain::Agreeableness),
            "C" | "conscientiousness" => Some(TraitDomain::Conscientiousness),
            "N" | "neuroticism" => Some(TraitDomain::Neuroticism),
            "O" | "openness" => Some(TraitDomain::Openness),
            "H" | "honesty_humility" => Some(TraitDomain::HonestyHumility),
            _ => None,
        }
    }

    /// Long display name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            TraitDomain::Extraversion => "extraversion",
            TraitDomain::Agreeableness => "agreeableness",
            TraitDomain::Conscientiousness => "conscientiousness",
            TraitDomain::Neuroticism => "neuroticism",
            TraitDomain::Openness => "openness",
            TraitDomain::HonestyHumility => "honesty_humility",
        }
    }
}
