use rand::random_range;

use super::card::{Card, Rarity, DRAW_ORDER};
use super::pack::PackType;
use crate::error::EconomyError;

/// Draws one full pack: `cards_per_pack` independent weighted rarity draws,
/// each followed by a uniform pick from the pool of catalog cards holding
/// that rarity. The same card may be drawn more than once in one pack.
///
/// A sampled rarity whose pool is empty falls back along the fixed order
/// Super, Epic, Rare, Common; running out of pools entirely is a catalog
/// configuration error, never a short pack.
pub fn draw_pack<'a>(
    pack: &PackType,
    catalog: &'a [Card],
) -> Result<Vec<&'a Card>, EconomyError> {
    let mut pools: [Vec<&Card>; 4] = [Vec::new(), Vec::new(), Vec::new(), Vec::new()];
    for card in catalog {
        pools[card.rarity.draw_order_index()].push(card);
    }

    if pools.iter().all(|p| p.is_empty()) {
        return Err(EconomyError::EmptyCatalog);
    }

    let mut drawn = Vec::with_capacity(pack.cards_per_pack);
    for _ in 0..pack.cards_per_pack {
        let rarity = pack.weights.sample();
        let card = draw_one(rarity, &pools).ok_or(EconomyError::EmptyCatalog)?;
        drawn.push(card);
    }
    Ok(drawn)
}

fn draw_one<'a>(rarity: Rarity, pools: &[Vec<&'a Card>; 4]) -> Option<&'a Card> {
    DRAW_ORDER[rarity.draw_order_index()..]
        .iter()
        .find_map(|r| pick_uniform(&pools[r.draw_order_index()]))
}

fn pick_uniform<'a>(pool: &[&'a Card]) -> Option<&'a Card> {
    if pool.is_empty() {
        None
    } else {
        Some(pool[random_range(0..pool.len())])
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use sqlx::types::Uuid;

    use super::*;
    use crate::cards::pack::{resolve_pack, PackType, RarityWeights, WEIGHT_SCALE};

    fn test_card(name: &str, rarity: Rarity) -> Card {
        Card {
            id: Uuid::new_v4(),
            name: name.to_string(),
            rarity,
            attack: 80,
            defense: 80,
            speed: 80,
            stamina: 80,
            technique: 80,
            instinct: 80,
            rating: 80,
            image_url: String::new(),
            created_at: 0,
            updated_at: 0,
        }
    }

    fn full_catalog() -> Vec<Card> {
        vec![
            test_card("s1", Rarity::Super),
            test_card("s2", Rarity::Super),
            test_card("e1", Rarity::Epic),
            test_card("e2", Rarity::Epic),
            test_card("r1", Rarity::Rare),
            test_card("r2", Rarity::Rare),
            test_card("c1", Rarity::Common),
            test_card("c2", Rarity::Common),
        ]
    }

    fn single_rarity_pack(rarity: Rarity) -> PackType {
        let mut weights = RarityWeights {
            super_bp: 0,
            epic_bp: 0,
            rare_bp: 0,
            common_bp: 0,
        };
        match rarity {
            Rarity::Super => weights.super_bp = WEIGHT_SCALE,
            Rarity::Epic => weights.epic_bp = WEIGHT_SCALE,
            Rarity::Rare => weights.rare_bp = WEIGHT_SCALE,
            Rarity::Common => weights.common_bp = WEIGHT_SCALE,
        }
        PackType {
            id: "test",
            name: "Test Pack",
            cost: 0,
            cards_per_pack: 5,
            weights,
        }
    }

    #[test]
    fn always_draws_exactly_five_cards() {
        let catalog = full_catalog();
        for pack in crate::cards::pack::PACK_TYPES {
            for _ in 0..10_000 {
                let drawn = draw_pack(pack, &catalog).unwrap();
                assert_eq!(drawn.len(), 5);
            }
        }
    }

    #[test]
    fn standard_table_frequencies_converge() {
        let weights = resolve_pack("standard").weights;
        let mut counts: HashMap<Rarity, i64> = HashMap::new();
        let trials = 200_000;
        for _ in 0..trials {
            *counts.entry(weights.sample()).or_default() += 1;
        }

        let expected = [
            (Rarity::Super, 1.5),
            (Rarity::Epic, 8.0),
            (Rarity::Rare, 28.0),
            (Rarity::Common, 62.5),
        ];
        for (rarity, pct) in expected {
            let observed = *counts.get(&rarity).unwrap_or(&0) as f64 / trials as f64 * 100.0;
            assert!(
                (observed - pct).abs() < 0.5,
                "{rarity}: observed {observed:.2}%, expected {pct}%"
            );
        }
    }

    #[test]
    fn duplicates_within_a_pack_are_valid() {
        let catalog = vec![test_card("only", Rarity::Common)];
        let drawn = draw_pack(&single_rarity_pack(Rarity::Common), &catalog).unwrap();
        assert_eq!(drawn.len(), 5);
        assert!(drawn.iter().all(|c| c.id == catalog[0].id));
    }

    #[test]
    fn empty_super_pool_falls_back_to_epic() {
        let catalog = vec![test_card("e1", Rarity::Epic), test_card("c1", Rarity::Common)];
        let drawn = draw_pack(&single_rarity_pack(Rarity::Super), &catalog).unwrap();
        assert!(drawn.iter().all(|c| c.rarity == Rarity::Epic));
    }

    #[test]
    fn fallback_skips_to_first_nonempty_pool() {
        let catalog = vec![test_card("c1", Rarity::Common)];
        let drawn = draw_pack(&single_rarity_pack(Rarity::Super), &catalog).unwrap();
        assert!(drawn.iter().all(|c| c.rarity == Rarity::Common));
    }

    #[test]
    fn empty_catalog_is_a_configuration_error() {
        let result = draw_pack(resolve_pack("standard"), &[]);
        assert!(matches!(result, Err(EconomyError::EmptyCatalog)));
    }
}
