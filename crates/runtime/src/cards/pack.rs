use serde::Serialize;

use super::card::Rarity;

/// Rarity weights are expressed in basis points of [`WEIGHT_SCALE`]
/// (150 = 1.5%) and must sum to exactly `WEIGHT_SCALE` per pack type.
pub const WEIGHT_SCALE: i64 = 10_000;

pub const CARDS_PER_PACK: usize = 5;

#[derive(Debug, Clone, Copy, Serialize)]
pub struct RarityWeights {
    pub super_bp: i64,
    pub epic_bp: i64,
    pub rare_bp: i64,
    pub common_bp: i64,
}

impl RarityWeights {
    pub const fn total(&self) -> i64 {
        self.super_bp + self.epic_bp + self.rare_bp + self.common_bp
    }

    /// Walks the buckets in the fixed order Super, Epic, Rare, Common and
    /// returns the first whose cumulative upper bound exceeds `v`.
    /// `v` must be in `[0, WEIGHT_SCALE)`.
    pub fn bucket_for(&self, v: i64) -> Rarity {
        let mut upper = self.super_bp;
        if v < upper {
            return Rarity::Super;
        }
        upper += self.epic_bp;
        if v < upper {
            return Rarity::Epic;
        }
        upper += self.rare_bp;
        if v < upper {
            return Rarity::Rare;
        }
        Rarity::Common
    }

    pub fn sample(&self) -> Rarity {
        self.bucket_for(rand::random_range(0..WEIGHT_SCALE))
    }
}

/// A purchasable pack. Static configuration, loaded once, immutable at
/// runtime.
#[derive(Debug, Clone, Serialize)]
pub struct PackType {
    pub id: &'static str,
    pub name: &'static str,
    pub cost: i64,
    pub cards_per_pack: usize,
    pub weights: RarityWeights,
}

pub const PACK_TYPES: &[PackType] = &[
    PackType {
        id: "standard",
        name: "Standard Pack",
        cost: 100,
        cards_per_pack: CARDS_PER_PACK,
        weights: RarityWeights {
            super_bp: 150,
            epic_bp: 800,
            rare_bp: 2800,
            common_bp: 6250,
        },
    },
    PackType {
        id: "premium",
        name: "Premium Pack",
        cost: 250,
        cards_per_pack: CARDS_PER_PACK,
        weights: RarityWeights {
            super_bp: 400,
            epic_bp: 1600,
            rare_bp: 3500,
            common_bp: 4500,
        },
    },
    PackType {
        id: "ultimate",
        name: "Ultimate Pack",
        cost: 500,
        cards_per_pack: CARDS_PER_PACK,
        weights: RarityWeights {
            super_bp: 1000,
            epic_bp: 2500,
            rare_bp: 3500,
            common_bp: 3000,
        },
    },
];

/// Unknown ids resolve to the standard pack. A defined fallback, not an
/// error.
pub fn resolve_pack(id: &str) -> &'static PackType {
    PACK_TYPES
        .iter()
        .find(|p| p.id == id)
        .unwrap_or(&PACK_TYPES[0])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_weight_table_sums_to_scale() {
        for pack in PACK_TYPES {
            assert_eq!(pack.weights.total(), WEIGHT_SCALE, "pack {}", pack.id);
        }
    }

    #[test]
    fn unknown_pack_falls_back_to_standard() {
        assert_eq!(resolve_pack("standard").id, "standard");
        assert_eq!(resolve_pack("ultimate").id, "ultimate");
        assert_eq!(resolve_pack("no-such-pack").id, "standard");
        assert_eq!(resolve_pack("").id, "standard");
    }

    #[test]
    fn bucket_walk_respects_boundaries() {
        let w = resolve_pack("standard").weights;
        assert_eq!(w.bucket_for(0), Rarity::Super);
        assert_eq!(w.bucket_for(149), Rarity::Super);
        assert_eq!(w.bucket_for(150), Rarity::Epic);
        assert_eq!(w.bucket_for(949), Rarity::Epic);
        assert_eq!(w.bucket_for(950), Rarity::Rare);
        assert_eq!(w.bucket_for(3749), Rarity::Rare);
        assert_eq!(w.bucket_for(3750), Rarity::Common);
        assert_eq!(w.bucket_for(WEIGHT_SCALE - 1), Rarity::Common);
    }
}
