use super::card::Rarity;

impl Rarity {
    /// Base sell value per tier, in credits.
    pub const fn base_sell_value(self) -> i64 {
        match self {
            Rarity::Super => 250,
            Rarity::Epic => 100,
            Rarity::Rare => 30,
            Rarity::Common => 12,
        }
    }
}

/// Rating-bucket multiplier in percent, so the floor of `base * multiplier`
/// stays exact integer math.
const fn rating_multiplier_pct(rating: i64) -> i64 {
    match rating {
        95.. => 200,
        90..=94 => 175,
        85..=89 => 150,
        80..=84 => 125,
        75..=79 => 110,
        _ => 100,
    }
}

/// Sell price for one copy of a card: `floor(base * multiplier)`.
pub fn sell_value(rarity: Rarity, rating: i64) -> i64 {
    rarity.base_sell_value() * rating_multiplier_pct(rating) / 100
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn epic_bucket_endpoints() {
        assert_eq!(sell_value(Rarity::Epic, 96), 200);
        assert_eq!(sell_value(Rarity::Epic, 95), 200);
        assert_eq!(sell_value(Rarity::Epic, 94), 175);
        assert_eq!(sell_value(Rarity::Epic, 90), 175);
        assert_eq!(sell_value(Rarity::Epic, 89), 150);
        assert_eq!(sell_value(Rarity::Epic, 85), 150);
        assert_eq!(sell_value(Rarity::Epic, 84), 125);
        assert_eq!(sell_value(Rarity::Epic, 80), 125);
        assert_eq!(sell_value(Rarity::Epic, 79), 110);
        assert_eq!(sell_value(Rarity::Epic, 75), 110);
        assert_eq!(sell_value(Rarity::Epic, 74), 100);
        assert_eq!(sell_value(Rarity::Epic, 0), 100);
    }

    #[test]
    fn floors_fractional_products() {
        // 12 * 1.1 = 13.2 and 30 * 1.75 = 52.5
        assert_eq!(sell_value(Rarity::Common, 75), 13);
        assert_eq!(sell_value(Rarity::Rare, 92), 52);
    }

    #[test]
    fn monotonically_non_decreasing_in_rating() {
        for rarity in [Rarity::Super, Rarity::Epic, Rarity::Rare, Rarity::Common] {
            let mut prev = sell_value(rarity, 0);
            for rating in 1..=99 {
                let value = sell_value(rarity, rating);
                assert!(value >= prev, "{rarity} dropped at rating {rating}");
                prev = value;
            }
        }
    }

    #[test]
    fn rarer_tiers_are_worth_more_at_equal_rating() {
        for rating in [0, 77, 88, 99] {
            assert!(sell_value(Rarity::Super, rating) > sell_value(Rarity::Epic, rating));
            assert!(sell_value(Rarity::Epic, rating) > sell_value(Rarity::Rare, rating));
            assert!(sell_value(Rarity::Rare, rating) > sell_value(Rarity::Common, rating));
        }
    }
}
