// 👕 Clothing Item - Input to valuation
// Transient value: built per request or per CSV row, discarded after valuation

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// CONDITION
// ============================================================================

/// Wear condition. Any text other than Excellent/Good/Decent parses as Poor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "&'static str")]
pub enum Condition {
    Excellent,
    Good,
    Decent,
    Poor,
}

impl Condition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Condition::Excellent => "Excellent",
            Condition::Good => "Good",
            Condition::Decent => "Decent",
            Condition::Poor => "Poor",
        }
    }

    /// Annual retention multiplier for this condition
    pub fn factor(&self) -> f64 {
        match self {
            Condition::Excellent => 1.0,
            Condition::Good => 0.98,
            Condition::Decent => 0.97,
            Condition::Poor => 0.8,
        }
    }

    /// Total parse: unknown text falls back to Poor
    pub fn parse(s: &str) -> Self {
        match s {
            "Excellent" => Condition::Excellent,
            "Good" => Condition::Good,
            "Decent" => Condition::Decent,
            _ => Condition::Poor,
        }
    }
}

impl FromStr for Condition {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Condition::parse(s))
    }
}

impl From<String> for Condition {
    fn from(s: String) -> Self {
        Condition::parse(&s)
    }
}

impl From<Condition> for &'static str {
    fn from(condition: Condition) -> Self {
        condition.as_str()
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// RARITY
// ============================================================================

/// Release rarity. Anything other than "General Release" counts as Other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "&'static str")]
pub enum Rarity {
    GeneralRelease,
    Other,
}

impl Rarity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Rarity::GeneralRelease => "General Release",
            Rarity::Other => "Other",
        }
    }

    pub fn factor(&self) -> f64 {
        match self {
            Rarity::GeneralRelease => 1.0,
            Rarity::Other => 1.1,
        }
    }

    pub fn parse(s: &str) -> Self {
        if s == "General Release" {
            Rarity::GeneralRelease
        } else {
            Rarity::Other
        }
    }
}

impl FromStr for Rarity {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Rarity::parse(s))
    }
}

impl From<String> for Rarity {
    fn from(s: String) -> Self {
        Rarity::parse(&s)
    }
}

impl From<Rarity> for &'static str {
    fn from(rarity: Rarity) -> Self {
        rarity.as_str()
    }
}

impl fmt::Display for Rarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// CLOTHING ITEM
// ============================================================================

/// A used clothing item as submitted for valuation.
///
/// All fields are required. The engine applies no defaults and no validation;
/// sanitizing prices and ages is the caller's job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClothingItem {
    /// Original purchase price
    pub initial_price: f64,

    /// Brand name, matched exactly against the curated brand tiers
    pub brand: String,

    /// Garment category (e.g. "Dress", "Jeans", "T-Shirt")
    pub category: String,

    pub condition: Condition,

    /// Dominant material (e.g. "Silk", "Cotton")
    pub material: String,

    pub rarity: Rarity,

    /// Months since purchase
    #[serde(alias = "time_since_purchase")]
    pub age_in_months: u32,
}

impl ClothingItem {
    pub fn new(
        initial_price: f64,
        brand: &str,
        category: &str,
        condition: Condition,
        material: &str,
        rarity: Rarity,
        age_in_months: u32,
    ) -> Self {
        ClothingItem {
            initial_price,
            brand: brand.to_string(),
            category: category.to_string(),
            condition,
            material: material.to_string(),
            rarity,
            age_in_months,
        }
    }

    /// Elapsed time in years (fractional)
    pub fn age_in_years(&self) -> f64 {
        self.age_in_months as f64 / 12.0
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_condition_parse_is_total() {
        assert_eq!(Condition::parse("Excellent"), Condition::Excellent);
        assert_eq!(Condition::parse("Good"), Condition::Good);
        assert_eq!(Condition::parse("Decent"), Condition::Decent);
        assert_eq!(Condition::parse("Poor"), Condition::Poor);
        assert_eq!(Condition::parse("Torn"), Condition::Poor);
        assert_eq!(Condition::parse("excellent"), Condition::Poor);
        assert_eq!("Good".parse::<Condition>(), Ok(Condition::Good));
    }

    #[test]
    fn test_condition_factor() {
        assert_eq!(Condition::Excellent.factor(), 1.0);
        assert_eq!(Condition::Good.factor(), 0.98);
        assert_eq!(Condition::Decent.factor(), 0.97);
        assert_eq!(Condition::Poor.factor(), 0.8);
    }

    #[test]
    fn test_rarity_parse_and_factor() {
        assert_eq!(Rarity::parse("General Release"), Rarity::GeneralRelease);
        assert_eq!(Rarity::parse("Limited Edition"), Rarity::Other);
        assert_eq!(Rarity::parse(""), Rarity::Other);
        assert_eq!(Rarity::GeneralRelease.factor(), 1.0);
        assert_eq!(Rarity::Other.factor(), 1.1);
    }

    #[test]
    fn test_item_json_uses_display_strings() {
        let item = ClothingItem::new(
            55.89,
            "Nike",
            "T-Shirt",
            Condition::Excellent,
            "Cotton",
            Rarity::GeneralRelease,
            28,
        );

        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["condition"], "Excellent");
        assert_eq!(json["rarity"], "General Release");
        assert_eq!(json["age_in_months"], 28);
    }

    #[test]
    fn test_item_accepts_time_since_purchase_alias() {
        let json = r#"{
            "initial_price": 49.99,
            "brand": "Zara",
            "category": "Shorts",
            "condition": "Good",
            "material": "Linen",
            "rarity": "Limited Drop",
            "time_since_purchase": 10
        }"#;

        let item: ClothingItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.age_in_months, 10);
        assert_eq!(item.condition, Condition::Good);
        assert_eq!(item.rarity, Rarity::Other);
    }

    #[test]
    fn test_age_in_years() {
        let mut item = ClothingItem::new(
            10.0,
            "Gap",
            "Jeans",
            Condition::Good,
            "Denim",
            Rarity::GeneralRelease,
            18,
        );
        assert_eq!(item.age_in_years(), 1.5);

        item.age_in_months = 0;
        assert_eq!(item.age_in_years(), 0.0);
    }
}
