// Resale Valuation - Core Library
// Exposes the valuation engine plus the store used by the CLI and API server

pub mod tiers;       // Curated brand/category/material tiers
pub mod item;        // Clothing item input
pub mod valuation;   // Declining-balance price model
pub mod commentary;  // Free-text explanation seam
pub mod db;          // SQLite record store + CSV import
pub mod config;      // Environment settings + tracing setup

// Re-export commonly used types
pub use tiers::{
    brand_factor, brand_tier, category_factor, category_tier, material_factor, material_tier,
    BrandTier, CategoryTier, MaterialTier, Tier,
};
pub use item::{ClothingItem, Condition, Rarity};
pub use valuation::{compound_rate, current_price, value, Factors, Valuation, ValuationEngine};
pub use commentary::{Commentator, NoCommentary, TemplateCommentator};
pub use db::{
    ValuationRecord, BrandStat, ImportSummary, Event,
    setup_database, open_database, load_csv, import_items, insert_record,
    get_all_records, get_record, get_records_by_brand, get_brand_stats,
    get_events_for_record, verify_count,
    API_SOURCE, ANONYMOUS,
};
pub use config::{init_tracing, Config};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
