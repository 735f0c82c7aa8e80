//! Card catalogue, inventory codec and weighted reward rolls.
//!
//! A user's collection is stored in `users.cards` as a space-separated
//! token list acting as a multiset. Early clients wrote the literal `[]`
//! for an empty collection; the parser still accepts it.

use std::collections::HashMap;
use std::fmt;

use rand::seq::IndexedRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rarity {
    Rare,
    #[serde(rename = "superrare")]
    SuperRare,
    Epic,
    Mythic,
    Legendary,
}

/// One slot of a weighted drop table.
#[derive(Debug, Clone, Copy)]
pub struct CaseDrop {
    pub name: &'static str,
    pub rarity: Rarity,
    pub weight: u32,
}

/// Daily free case: one direct card roll, heavily skewed to rare.
pub const FREE_CASE: &[CaseDrop] = &[
    CaseDrop { name: "serikov", rarity: Rarity::Rare, weight: 60 },
    CaseDrop { name: "barulin", rarity: Rarity::SuperRare, weight: 30 },
    CaseDrop { name: "gritsyuk", rarity: Rarity::Epic, weight: 6 },
    CaseDrop { name: "goldobin", rarity: Rarity::Mythic, weight: 3 },
    CaseDrop { name: "radulov", rarity: Rarity::Legendary, weight: 1 },
];

const RARE_CARDS: &[&str] = &[
    "abrosimov", "barulin", "william", "geraskin", "dynyak", "kamara", "klasson", "konyushkov",
    "li",
];

const SUPERRARE_CARDS: &[&str] = &[
    "gritsyuk", "tkachev_a", "barabanov", "aymurzin", "borikov", "glotov", "demchenko", "drozdov",
    "ilyenko", "kara", "mamin", "loktionov", "fu", "rushan",
];

const EPIC_CARDS: &[&str] = &[
    "demidov", "khmelevsky", "gutik", "kagarlitsky", "kayumov", "goldobin",
];

const MYTHIC_CARDS: &[&str] = &[
    "shabanov", "galimov_art", "kravtsov", "kuznetsov", "radulov", "livo",
];

/// One rarity tier of a paid case: rarity is rolled by weight, the card
/// uniformly within the tier.
#[derive(Debug, Clone, Copy)]
pub struct CaseTier {
    pub rarity: Rarity,
    pub weight: u32,
    pub cards: &'static [&'static str],
}

#[derive(Debug, Clone, Copy)]
pub struct CaseConfig {
    pub price: i32,
    pub tiers: &'static [CaseTier],
}

const START_CASE: CaseConfig = CaseConfig {
    price: 29,
    tiers: &[
        CaseTier { rarity: Rarity::Rare, weight: 70, cards: RARE_CARDS },
        CaseTier { rarity: Rarity::SuperRare, weight: 25, cards: SUPERRARE_CARDS },
        CaseTier { rarity: Rarity::Epic, weight: 5, cards: EPIC_CARDS },
    ],
};

pub fn case_config(kind: &str) -> Option<&'static CaseConfig> {
    match kind {
        "start" => Some(&START_CASE),
        _ => None,
    }
}

/// Crafting: burn exactly `required` cards of a rarity for a random card
/// from the next tier up.
#[derive(Debug, Clone, Copy)]
pub struct CraftRecipe {
    pub required: usize,
    pub results: &'static [&'static str],
}

pub fn craft_recipe(name: &str) -> Option<CraftRecipe> {
    let results = match name {
        "rare" => RARE_CARDS,
        "superrare" => SUPERRARE_CARDS,
        "epic" => EPIC_CARDS,
        "mythic" => MYTHIC_CARDS,
        _ => return None,
    };
    Some(CraftRecipe {
        required: 3,
        results,
    })
}

/// Walk a weighted table; the total weight is the roll range, so weights
/// need not sum to 100.
pub fn roll_drop<'a, R: Rng>(table: &'a [CaseDrop], rng: &mut R) -> &'a CaseDrop {
    let total: u32 = table.iter().map(|d| d.weight).sum();
    let mut pick = rng.random_range(0..total);
    for drop in table {
        if pick < drop.weight {
            return drop;
        }
        pick -= drop.weight;
    }
    &table[table.len() - 1]
}

/// Roll a paid case: weighted rarity tier, then a uniform card within it.
pub fn roll_case<R: Rng>(cfg: &CaseConfig, rng: &mut R) -> (&'static str, Rarity) {
    let total: u32 = cfg.tiers.iter().map(|t| t.weight).sum();
    let mut pick = rng.random_range(0..total);
    let mut tier = &cfg.tiers[cfg.tiers.len() - 1];
    for t in cfg.tiers {
        if pick < t.weight {
            tier = t;
            break;
        }
        pick -= t.weight;
    }
    let card = tier.cards.choose(rng).copied().unwrap_or(tier.cards[0]);
    (card, tier.rarity)
}

/// In-memory view of a `users.cards` column.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Inventory {
    cards: Vec<String>,
}

impl Inventory {
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed == "[]" {
            return Inventory::default();
        }
        Inventory {
            cards: trimmed
                .split_whitespace()
                .map(|c| c.to_string())
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Multiset counts, keyed by lowercased card name.
    pub fn counts(&self) -> HashMap<String, usize> {
        let mut out = HashMap::new();
        for card in &self.cards {
            *out.entry(card.to_lowercase()).or_insert(0) += 1;
        }
        out
    }

    pub fn add(&mut self, name: &str) {
        self.cards.push(name.to_string());
    }

    /// Remove one copy matching `key` case-insensitively. Returns false
    /// when the card is not owned.
    pub fn remove_one(&mut self, key: &str) -> bool {
        let key = key.to_lowercase();
        match self.cards.iter().position(|c| c.to_lowercase() == key) {
            Some(idx) => {
                self.cards.remove(idx);
                true
            }
            None => false,
        }
    }
}

impl fmt::Display for Inventory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.cards.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn parse_handles_legacy_empty_markers() {
        assert!(Inventory::parse("").is_empty());
        assert!(Inventory::parse("   ").is_empty());
        assert!(Inventory::parse("[]").is_empty());
        assert_eq!(Inventory::parse("a b a").len(), 3);
    }

    #[test]
    fn counts_are_case_insensitive() {
        let inv = Inventory::parse("Barulin barulin gritsyuk");
        let counts = inv.counts();
        assert_eq!(counts.get("barulin"), Some(&2));
        assert_eq!(counts.get("gritsyuk"), Some(&1));
    }

    #[test]
    fn remove_one_takes_a_single_copy() {
        let mut inv = Inventory::parse("a b a");
        assert!(inv.remove_one("A"));
        assert_eq!(inv.to_string(), "b a");
        assert!(inv.remove_one("a"));
        assert!(!inv.remove_one("a"));
    }

    #[test]
    fn add_then_render_round_trips() {
        let mut inv = Inventory::parse("[]");
        inv.add("serikov");
        inv.add("radulov");
        assert_eq!(inv.to_string(), "serikov radulov");
    }

    #[test]
    fn roll_drop_respects_weights() {
        // With a seeded rng, 1000 rolls should land overwhelmingly in the
        // 60-weight slot and never outside the table.
        let mut rng = StdRng::seed_from_u64(7);
        let mut rare = 0;
        for _ in 0..1000 {
            let drop = roll_drop(FREE_CASE, &mut rng);
            if drop.rarity == Rarity::Rare {
                rare += 1;
            }
        }
        assert!(rare > 500, "rare count {rare} suspiciously low");
    }

    #[test]
    fn roll_case_only_returns_listed_cards() {
        let cfg = case_config("start").unwrap();
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..100 {
            let (card, rarity) = roll_case(cfg, &mut rng);
            let tier = cfg.tiers.iter().find(|t| t.rarity == rarity).unwrap();
            assert!(tier.cards.contains(&card));
        }
    }

    #[test]
    fn unknown_case_and_recipe_rejected() {
        assert!(case_config("gold").is_none());
        assert!(craft_recipe("legendary").is_none());
        assert_eq!(craft_recipe("epic").unwrap().required, 3);
    }
}
