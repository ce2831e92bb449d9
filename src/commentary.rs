// 💬 Commentary - Free-text explanation attached to a valuation
//
// The production commentary comes from an external language model. This module
// only defines the seam: a Commentator receives the item and the finished
// valuation and returns text. It cannot change the number.

use crate::item::ClothingItem;
use crate::valuation::Valuation;
use anyhow::Result;

pub trait Commentator: Send + Sync {
    fn comment(&self, item: &ClothingItem, valuation: &Valuation) -> Result<String>;
}

// ============================================================================
// TEMPLATE COMMENTATOR
// ============================================================================

/// Deterministic sentences built from the valuation breakdown
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateCommentator;

impl Commentator for TemplateCommentator {
    fn comment(&self, item: &ClothingItem, valuation: &Valuation) -> Result<String> {
        let brand = match valuation.brand_tier {
            Some(tier) => format!("{} is a {} brand", item.brand, tier.as_str().to_lowercase()),
            None => format!("{} is not a tracked brand", item.brand),
        };

        let trend = if valuation.compound_rate > 1.0 {
            "appreciates"
        } else if valuation.compound_rate < 1.0 {
            "depreciates"
        } else {
            "holds its value"
        };

        let rate_pct = (valuation.compound_rate - 1.0).abs() * 100.0;
        let trend_sentence = if valuation.compound_rate == 1.0 {
            format!("A {} in {} condition {}.", item.category, item.condition, trend)
        } else {
            format!(
                "A {} in {} condition {} by about {:.1}% per year.",
                item.category, item.condition, trend, rate_pct
            )
        };

        Ok(format!(
            "{}. {} After {} months, the estimated resale price is {:.2} ({:.0}% of the original {:.2}).",
            brand,
            trend_sentence,
            item.age_in_months,
            valuation.current_price,
            valuation.retention() * 100.0,
            valuation.initial_price,
        ))
    }
}

// ============================================================================
// NO COMMENTARY
// ============================================================================

#[derive(Debug, Clone, Copy, Default)]
pub struct NoCommentary;

impl Commentator for NoCommentary {
    fn comment(&self, _item: &ClothingItem, _valuation: &Valuation) -> Result<String> {
        Ok(String::new())
    }
}

/// Build the commentator selected by name ("template" or "none")
pub fn from_name(name: &str) -> Option<Box<dyn Commentator>> {
    match name.trim().to_ascii_lowercase().as_str() {
        "template" => Some(Box::new(TemplateCommentator)),
        "none" | "off" => Some(Box::new(NoCommentary)),
        _ => None,
    }
}
