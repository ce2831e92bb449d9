// 💰 Valuation Engine - Declining-balance resale price model
//
// compound_rate = brand * category * condition * material * rarity
// current_price = initial_price * compound_rate ^ (age_in_months / 12)
//
// compound_rate is the value retained per year. Below 1.0 the item loses
// value with age, at 1.0 it holds, above 1.0 (premium brand plus non-general
// rarity, for example) it appreciates. Appreciation is part of the model and
// is not capped.
//
// Everything here is pure: no I/O, no logging, no shared state.

use crate::item::ClothingItem;
use crate::tiers::{
    brand_factor, brand_tier, category_factor, category_tier, material_factor, material_tier,
    BrandTier, CategoryTier, MaterialTier,
};
use serde::Serialize;

// ============================================================================
// FACTORS
// ============================================================================

/// The five per-attribute multipliers for one item
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Factors {
    #[serde(rename = "brand_factor")]
    pub brand: f64,
    #[serde(rename = "category_factor")]
    pub category: f64,
    #[serde(rename = "condition_factor")]
    pub condition: f64,
    #[serde(rename = "material_factor")]
    pub material: f64,
    #[serde(rename = "rarity_factor")]
    pub rarity: f64,
}

impl Factors {
    pub fn for_item(item: &ClothingItem) -> Self {
        Factors {
            brand: brand_factor(&item.brand),
            category: category_factor(&item.category),
            condition: item.condition.factor(),
            material: material_factor(&item.material),
            rarity: item.rarity.factor(),
        }
    }

    /// Product of all factors, taken in a fixed order so results are bit-stable
    pub fn compound_rate(&self) -> f64 {
        self.brand * self.category * self.condition * self.material * self.rarity
    }
}

// ============================================================================
// PURE FUNCTIONS
// ============================================================================

/// Effective annual retention rate for an item
pub fn compound_rate(item: &ClothingItem) -> f64 {
    Factors::for_item(item).compound_rate()
}

/// Estimated current resale price. Never fails; no rounding is applied.
pub fn current_price(item: &ClothingItem) -> f64 {
    decay(item.initial_price, compound_rate(item), item.age_in_years())
}

fn decay(initial_price: f64, compound_rate: f64, years: f64) -> f64 {
    initial_price * compound_rate.powf(years)
}

// ============================================================================
// VALUATION BREAKDOWN
// ============================================================================

/// Full breakdown of how a price was reached.
/// `current_price` is identical to what [`current_price`] returns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Valuation {
    /// Matched brand tier (None = unmatched, default factor applied)
    pub brand_tier: Option<BrandTier>,
    pub category_tier: Option<CategoryTier>,
    pub material_tier: Option<MaterialTier>,
    /// Serialized inline as `brand_factor`, `category_factor`, ...
    #[serde(flatten)]
    pub factors: Factors,
    pub compound_rate: f64,
    pub years: f64,
    pub initial_price: f64,
    pub current_price: f64,
}

impl Valuation {
    /// Share of the original price still retained (current / initial)
    pub fn retention(&self) -> f64 {
        if self.initial_price == 0.0 {
            return 0.0;
        }
        self.current_price / self.initial_price
    }

    pub fn is_appreciating(&self) -> bool {
        self.compound_rate > 1.0
    }
}

/// Value an item and keep every intermediate number
pub fn value(item: &ClothingItem) -> Valuation {
    let factors = Factors::for_item(item);
    let compound_rate = factors.compound_rate();
    let years = item.age_in_years();

    Valuation {
        brand_tier: brand_tier(&item.brand),
        category_tier: category_tier(&item.category),
        material_tier: material_tier(&item.material),
        factors,
        compound_rate,
        years,
        initial_price: item.initial_price,
        current_price: decay(item.initial_price, compound_rate, years),
    }
}

// ============================================================================
// ENGINE HANDLE
// ============================================================================

/// Zero-sized handle over the pure functions, for callers that want to
/// carry the engine as a value (server state, UI app).
#[derive(Debug, Clone, Copy, Default)]
pub struct ValuationEngine;

impl ValuationEngine {
    pub fn new() -> Self {
        ValuationEngine
    }

    pub fn estimate(&self, item: &ClothingItem) -> f64 {
        current_price(item)
    }

    pub fn breakdown(&self, item: &ClothingItem) -> Valuation {
        value(item)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::{Condition, Rarity};

    fn unmatched_item(initial_price: f64, age_in_months: u32) -> ClothingItem {
        ClothingItem::new(
            initial_price,
            "Unknown Brand",
            "Unknown Category",
            Condition::Excellent,
            "Unknown Material",
            Rarity::GeneralRelease,
            age_in_months,
        )
    }

    #[test]
    fn test_unmatched_item_one_year() {
        let item = unmatched_item(100.0, 12);

        let rate = compound_rate(&item);
        assert!((rate - 0.81189).abs() < 1e-12, "rate was {}", rate);

        let price = current_price(&item);
        assert!((price - 81.189).abs() < 1e-9, "price was {}", price);
    }

    #[test]
    fn test_zero_age_returns_initial_price_exactly() {
        let item = unmatched_item(100.0, 0);
        assert_eq!(current_price(&item), 100.0);

        let premium = ClothingItem::new(
            250.0,
            "Prada",
            "Dress",
            Condition::Excellent,
            "Silk",
            Rarity::Other,
            0,
        );
        assert_eq!(current_price(&premium), 250.0);
    }

    #[test]
    fn test_premium_item_appreciates() {
        let item = ClothingItem::new(
            200.0,
            "Prada",
            "Dress",
            Condition::Excellent,
            "Silk",
            Rarity::GeneralRelease,
            24,
        );

        let rate = compound_rate(&item);
        assert!((rate - 1.05644).abs() < 1e-12, "rate was {}", rate);

        let price = current_price(&item);
        assert!((price - 200.0 * 1.05644_f64 * 1.05644).abs() < 1e-9);
        assert!(price > 200.0);
        assert!((price - 223.213).abs() < 1e-2, "price was {}", price);
    }

    #[test]
    fn test_price_decreases_with_age_when_rate_below_one() {
        let mut last = f64::INFINITY;
        for months in 0..=120 {
            let price = current_price(&unmatched_item(80.0, months));
            assert!(price < last, "price did not decrease at {} months", months);
            last = price;
        }
    }

    #[test]
    fn test_price_non_negative() {
        let conditions = [
            Condition::Excellent,
            Condition::Good,
            Condition::Decent,
            Condition::Poor,
        ];
        let brands = ["Prada", "Gucci", "Calvin Klein", "Nike", "Zara", "Zaful", "Nobody"];

        for brand in brands {
            for condition in conditions {
                for months in [0, 1, 12, 60, 600] {
                    let item = ClothingItem::new(
                        42.0,
                        brand,
                        "Hoodie",
                        condition,
                        "Fleece",
                        Rarity::Other,
                        months,
                    );
                    assert!(current_price(&item) >= 0.0);
                }
            }
        }

        assert_eq!(current_price(&unmatched_item(0.0, 36)), 0.0);
    }

    #[test]
    fn test_repeated_calls_are_bit_identical() {
        let item = ClothingItem::new(
            129.99,
            "Levi's",
            "Jeans",
            Condition::Good,
            "Denim",
            Rarity::GeneralRelease,
            31,
        );

        let first = current_price(&item);
        for _ in 0..100 {
            assert_eq!(current_price(&item).to_bits(), first.to_bits());
        }
    }

    #[test]
    fn test_duplicate_tier_brand_uses_first_tier() {
        let calvin = ClothingItem::new(
            100.0,
            "Calvin Klein",
            "Polo",
            Condition::Excellent,
            "Cotton",
            Rarity::GeneralRelease,
            12,
        );

        let valuation = value(&calvin);
        assert_eq!(valuation.brand_tier, Some(BrandTier::UpperMid));
        assert_eq!(valuation.factors.brand, 0.95);
    }

    #[test]
    fn test_breakdown_matches_plain_function() {
        let item = ClothingItem::new(
            75.5,
            "Hollister",
            "Sweatshirt",
            Condition::Decent,
            "Polyester",
            Rarity::Other,
            17,
        );

        let valuation = value(&item);
        assert_eq!(valuation.current_price.to_bits(), current_price(&item).to_bits());
        assert_eq!(valuation.compound_rate.to_bits(), compound_rate(&item).to_bits());
        assert_eq!(valuation.years, 17.0 / 12.0);
        assert_eq!(valuation.material_tier, Some(MaterialTier::XL));
    }

    #[test]
    fn test_unmatched_breakdown_reports_no_tiers() {
        let valuation = value(&unmatched_item(100.0, 12));

        assert_eq!(valuation.brand_tier, None);
        assert_eq!(valuation.category_tier, None);
        assert_eq!(valuation.material_tier, None);
        assert_eq!(valuation.factors.brand, 0.90);
        assert_eq!(valuation.factors.category, 0.97);
        assert_eq!(valuation.factors.material, 0.93);
        assert!(!valuation.is_appreciating());
        assert!((valuation.retention() - 0.81189).abs() < 1e-9);
    }

    #[test]
    fn test_breakdown_json_is_flat() {
        let item = ClothingItem::new(
            200.0,
            "Prada",
            "Dress",
            Condition::Excellent,
            "Silk",
            Rarity::GeneralRelease,
            24,
        );

        let json = serde_json::to_value(value(&item)).unwrap();
        let mut keys: Vec<&str> = json.as_object().unwrap().keys().map(String::as_str).collect();
        keys.sort_unstable();

        assert_eq!(
            keys,
            vec![
                "brand_factor",
                "brand_tier",
                "category_factor",
                "category_tier",
                "compound_rate",
                "condition_factor",
                "current_price",
                "initial_price",
                "material_factor",
                "material_tier",
                "rarity_factor",
                "years",
            ]
        );
        assert_eq!(json["brand_factor"], 1.10);
        assert_eq!(json["brand_tier"], "Premium");
        assert_eq!(json["material_factor"], 0.98);
        assert!(json.get("factors").is_none());
    }

    #[test]
    fn test_engine_handle_delegates() {
        let engine = ValuationEngine::new();
        let item = unmatched_item(100.0, 12);

        assert_eq!(engine.estimate(&item), current_price(&item));
        assert_eq!(engine.breakdown(&item), value(&item));
    }

    #[test]
    fn test_engine_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ValuationEngine>();

        let engine = ValuationEngine::new();
        let handles: Vec<_> = (0..4)
            .map(|i| {
                std::thread::spawn(move || engine.estimate(&unmatched_item(100.0, i * 12)))
            })
            .collect();

        for (i, handle) in handles.into_iter().enumerate() {
            let price = handle.join().unwrap();
            assert_eq!(price, current_price(&unmatched_item(100.0, i as u32 * 12)));
        }
    }
}
