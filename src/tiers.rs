// 🏷️ Curated Tiers - Brand, category and material multipliers
// Tiers are data: ordered (tier, multiplier, members) lists, first match wins
//
// A name can appear in more than one list (the curated brand data lists
// "Calvin Klein" as both upper-mid and mid). Lookups scan in priority order,
// so the earlier tier always wins.

use serde::{Deserialize, Serialize};

// ============================================================================
// TIER DEFINITION
// ============================================================================

/// One curated tier: every member shares the same annual retention multiplier
#[derive(Debug, Clone, Copy)]
pub struct Tier<T> {
    /// Which tier this is (for reporting)
    pub tier: T,

    /// Multiplier applied to the compound rate
    pub multiplier: f64,

    /// Exact, case-sensitive member names
    pub members: &'static [&'static str],
}

impl<T> Tier<T> {
    /// Check if a name belongs to this tier
    pub fn contains(&self, name: &str) -> bool {
        self.members.iter().any(|member| *member == name)
    }
}

/// Scan tiers in priority order and return the first one containing `name`
pub fn first_match<'a, T>(tiers: &'a [Tier<T>], name: &str) -> Option<&'a Tier<T>> {
    tiers.iter().find(|tier| tier.contains(name))
}

// ============================================================================
// BRAND TIERS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BrandTier {
    Premium,
    Luxury,
    UpperMid,
    Mid,
    Low,
    FastFashion,
}

impl BrandTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            BrandTier::Premium => "Premium",
            BrandTier::Luxury => "Luxury",
            BrandTier::UpperMid => "Upper-mid",
            BrandTier::Mid => "Mid",
            BrandTier::Low => "Low",
            BrandTier::FastFashion => "Fast fashion",
        }
    }
}

/// Brand factor for names that match no tier
pub const DEFAULT_BRAND_FACTOR: f64 = 0.90;

pub static BRAND_TIERS: &[Tier<BrandTier>] = &[
    Tier {
        tier: BrandTier::Premium,
        multiplier: 1.10,
        members: &[
            "Prada", "Burberry", "Fendi", "Balenciaga", "Saint Laurent", "Bottega Veneta",
            "Loewe", "Celine", "Miu Miu", "Chloé", "Givenchy", "Valentino", "Marc Jacobs",
            "Ralph Lauren Purple Label", "Alexander McQueen",
        ],
    },
    Tier {
        tier: BrandTier::Luxury,
        multiplier: 0.98,
        members: &[
            "Gucci", "Hermes", "Chanel", "Louis Vuitton", "Dior", "Rolex", "Cartier",
            "Tiffany & Co.", "Bulgari", "Montblanc", "Vacheron Constantin", "Patek Philippe",
            "Tom Ford", "Loro Piana", "Bally", "Brunello Cucinelli", "Zegna", "Maserati",
            "Ferrari",
        ],
    },
    Tier {
        tier: BrandTier::UpperMid,
        multiplier: 0.95,
        members: &[
            "Tommy Hilfiger", "Ralph Lauren", "Lacoste", "Calvin Klein", "J.Crew", "Ted Baker",
            "Michael Kors", "Coach", "Kate Spade", "Hugo Boss", "Paul Smith", "Brooks Brothers",
            "Burberry Brit", "AllSaints", "True Religion", "Rag & Bone", "Banana Republic",
            "Diesel", "Armani Exchange", "Gant", "Barbour",
        ],
    },
    Tier {
        tier: BrandTier::Mid,
        multiplier: 0.93,
        members: &[
            "Calvin Klein", "Adidas", "Levi's", "Nike", "Tommy Jeans", "Dockers", "Puma",
            "Converse", "Gap", "Wrangler", "Lee", "Reebok", "Under Armour", "Superdry", "Vans",
            "New Balance", "Columbia", "American Eagle", "Express", "Hollister", "Uniqlo", "H&M",
            "A&F", "Old Navy", "Skechers", "Jack & Jones", "Fila", "Abercrombie & Fitch", "Toms",
            "T-shirt Company", "BOSS Orange",
        ],
    },
    Tier {
        tier: BrandTier::Low,
        multiplier: 0.90,
        members: &[
            "Zara", "H&M", "Uniqlo", "Forever 21", "Boohoo", "Shein", "Primark", "Matalan",
            "ASOS", "Charlotte Russe", "Romwe", "Nasty Gal", "Tillys", "Bershka", "Pull & Bear",
            "C&A", "PrettyLittleThing", "Missguided", "PacSun", "Target", "Kohl's", "Walmart",
            "Old Navy", "Kmart", "Cotton On", "Lidl", "Aldi", "Peacocks", "Sainsbury's",
            "Marks & Spencer", "Stradivarius", "New Look", "River Island", "Juniors", "Mango",
            "GAP", "American Apparel",
        ],
    },
    Tier {
        tier: BrandTier::FastFashion,
        multiplier: 0.88,
        members: &[
            "Forever 21", "Boohoo", "Shein", "Romwe", "Nasty Gal", "PrettyLittleThing", "Zaful",
            "Wish", "AliExpress", "Shien", "ASOS", "Pipeless", "Kohls", "American Eagle",
            "Aeropostale", "Target", "Walmart", "Shopbop", "Rainbow", "Hollister", "Express",
            "Macy's", "J.C. Penney", "Sears", "Burlington", "TJ Maxx", "Ross Dress for Less",
            "Urban Outfitters",
        ],
    },
];

pub fn brand_tier(brand: &str) -> Option<BrandTier> {
    first_match(BRAND_TIERS, brand).map(|t| t.tier)
}

pub fn brand_factor(brand: &str) -> f64 {
    first_match(BRAND_TIERS, brand)
        .map(|t| t.multiplier)
        .unwrap_or(DEFAULT_BRAND_FACTOR)
}

// ============================================================================
// CATEGORY TIERS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CategoryTier {
    HighValue,
    MidValue,
    LowValue,
}

impl CategoryTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryTier::HighValue => "High value",
            CategoryTier::MidValue => "Mid value",
            CategoryTier::LowValue => "Low value",
        }
    }
}

pub const DEFAULT_CATEGORY_FACTOR: f64 = 0.97;

pub static CATEGORY_TIERS: &[Tier<CategoryTier>] = &[
    Tier {
        tier: CategoryTier::HighValue,
        multiplier: 0.98,
        members: &["Dress", "Polo"],
    },
    Tier {
        tier: CategoryTier::MidValue,
        multiplier: 0.97,
        members: &["Jeans", "Hoodie", "Sweatshirt", "Jacket"],
    },
    Tier {
        tier: CategoryTier::LowValue,
        multiplier: 0.96,
        members: &["T-Shirt", "Long-Sleeves", "Sweatpants", "Shorts"],
    },
];

pub fn category_tier(category: &str) -> Option<CategoryTier> {
    first_match(CATEGORY_TIERS, category).map(|t| t.tier)
}

pub fn category_factor(category: &str) -> f64 {
    first_match(CATEGORY_TIERS, category)
        .map(|t| t.multiplier)
        .unwrap_or(DEFAULT_CATEGORY_FACTOR)
}

// ============================================================================
// MATERIAL TIERS
// ============================================================================

/// Material grades, from best retention (XL) to worst (XXS)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MaterialTier {
    XL,
    L,
    M,
    S,
    XS,
    XXS,
}

impl MaterialTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            MaterialTier::XL => "XL",
            MaterialTier::L => "L",
            MaterialTier::M => "M",
            MaterialTier::S => "S",
            MaterialTier::XS => "XS",
            MaterialTier::XXS => "XXS",
        }
    }
}

pub const DEFAULT_MATERIAL_FACTOR: f64 = 0.93;

pub static MATERIAL_TIERS: &[Tier<MaterialTier>] = &[
    Tier {
        tier: MaterialTier::XL,
        multiplier: 0.98,
        members: &["Polyester", "Acrylic", "Spandex", "Leather", "Fleece", "Silk", "Suede"],
    },
    Tier {
        tier: MaterialTier::L,
        multiplier: 0.97,
        members: &["Nylon", "Velvet"],
    },
    Tier {
        tier: MaterialTier::M,
        multiplier: 0.96,
        members: &["Wool", "Cashmere"],
    },
    Tier {
        tier: MaterialTier::S,
        multiplier: 0.95,
        members: &["Denim"],
    },
    Tier {
        tier: MaterialTier::XS,
        multiplier: 0.94,
        members: &["Other"],
    },
    Tier {
        tier: MaterialTier::XXS,
        multiplier: 0.93,
        members: &["Linen", "Cotton", "Rayon"],
    },
];

pub fn material_tier(material: &str) -> Option<MaterialTier> {
    first_match(MATERIAL_TIERS, material).map(|t| t.tier)
}

pub fn material_factor(material: &str) -> f64 {
    first_match(MATERIAL_TIERS, material)
        .map(|t| t.multiplier)
        .unwrap_or(DEFAULT_MATERIAL_FACTOR)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_brand_tier_lookup() {
        assert_eq!(brand_factor("Prada"), 1.10);
        assert_eq!(brand_factor("Gucci"), 0.98);
        assert_eq!(brand_factor("Lacoste"), 0.95);
        assert_eq!(brand_factor("Nike"), 0.93);
        assert_eq!(brand_factor("Zara"), 0.90);
        assert_eq!(brand_factor("Zaful"), 0.88);

        assert_eq!(brand_tier("Chloé"), Some(BrandTier::Premium));
        assert_eq!(brand_tier("Urban Outfitters"), Some(BrandTier::FastFashion));
    }

    #[test]
    fn test_duplicate_brand_resolves_to_first_tier() {
        // Listed in both upper-mid and mid
        assert_eq!(brand_tier("Calvin Klein"), Some(BrandTier::UpperMid));
        assert_eq!(brand_factor("Calvin Klein"), 0.95);

        // Listed in both mid and low
        assert_eq!(brand_tier("H&M"), Some(BrandTier::Mid));
        assert_eq!(brand_tier("Old Navy"), Some(BrandTier::Mid));

        // Listed in both low and fast fashion
        assert_eq!(brand_tier("Forever 21"), Some(BrandTier::Low));
        assert_eq!(brand_factor("Shein"), 0.90);
    }

    #[test]
    fn test_unmatched_brand_uses_default() {
        assert_eq!(brand_tier("Some Indie Label"), None);
        assert_eq!(brand_factor("Some Indie Label"), DEFAULT_BRAND_FACTOR);
        assert_eq!(brand_factor(""), 0.90);
    }

    #[test]
    fn test_brand_match_is_case_sensitive() {
        // "GAP" is low, "Gap" is mid, "gap" is neither
        assert_eq!(brand_tier("GAP"), Some(BrandTier::Low));
        assert_eq!(brand_tier("Gap"), Some(BrandTier::Mid));
        assert_eq!(brand_tier("gap"), None);
    }

    #[test]
    fn test_category_factor() {
        assert_eq!(category_factor("Dress"), 0.98);
        assert_eq!(category_factor("Jacket"), 0.97);
        assert_eq!(category_factor("Shorts"), 0.96);
        assert_eq!(category_factor("Socks"), DEFAULT_CATEGORY_FACTOR);
        assert_eq!(category_tier("Socks"), None);
        assert_eq!(category_tier("Polo"), Some(CategoryTier::HighValue));
    }

    #[test]
    fn test_material_factor() {
        assert_eq!(material_factor("Silk"), 0.98);
        assert_eq!(material_factor("Velvet"), 0.97);
        assert_eq!(material_factor("Cashmere"), 0.96);
        assert_eq!(material_factor("Denim"), 0.95);
        assert_eq!(material_factor("Other"), 0.94);
        assert_eq!(material_factor("Cotton"), 0.93);
        assert_eq!(material_factor("Hemp"), DEFAULT_MATERIAL_FACTOR);
        assert_eq!(material_tier("Other"), Some(MaterialTier::XS));
    }

    #[test]
    fn test_multipliers_stay_in_documented_ranges() {
        for tier in BRAND_TIERS {
            assert!((0.88..=1.10).contains(&tier.multiplier));
        }
        for tier in CATEGORY_TIERS {
            assert!((0.96..=0.98).contains(&tier.multiplier));
        }
        for tier in MATERIAL_TIERS {
            assert!((0.93..=0.98).contains(&tier.multiplier));
        }
    }
}
