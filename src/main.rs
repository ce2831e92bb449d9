// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{bail, Context, Result};
use std::env;
use std::path::{Path, PathBuf};

// Use library instead of local modules
use resale_valuation::{
    commentary, import_items, init_tracing, load_csv, open_database, verify_count, ClothingItem,
    Condition, Config, Rarity, ValuationEngine,
};

const IMPORT_ACTOR: &str = "csv_importer";

fn main() -> Result<()> {
    init_tracing();
    let config = Config::from_env()?;

    let args: Vec<String> = env::args().collect();

    match args.get(1).map(String::as_str) {
        Some("import") => run_import(&config, &args[2..])?,
        Some("value") => run_value(&config, &args[2..])?,
        Some("help") | Some("--help") | Some("-h") => print_usage(),
        Some(other) => {
            eprintln!("❌ Unknown command: {}", other);
            print_usage();
            std::process::exit(2);
        }
        // UI mode (default)
        None => run_ui_mode(&config)?,
    }

    Ok(())
}

fn print_usage() {
    println!("Usage:");
    println!("  resale-valuation                      Browse stored valuations (TUI)");
    println!("  resale-valuation import <csv> [db]    Value and store every item in a CSV");
    println!("  resale-valuation value <price> <brand> <category> <condition> <material> <rarity> <months>");
}

fn run_import(config: &Config, args: &[String]) -> Result<()> {
    let Some(csv_arg) = args.first() else {
        bail!("import needs a CSV path: resale-valuation import <csv> [db]");
    };
    let csv_path = Path::new(csv_arg);
    let db_path: PathBuf = args
        .get(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| config.db_path.clone());

    println!("🗄️  Import: CSV → valuations → SQLite");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    // 1. Load CSV
    println!("\n📂 Loading CSV...");
    let items = load_csv(csv_path)?;
    println!("✓ Loaded {} items from {:?}", items.len(), csv_path);

    // 2. Open database
    println!("\n🔧 Opening database...");
    let conn = open_database(&db_path)?;
    println!("✓ Database ready at {:?}", db_path);

    // 3. Value + insert
    println!("\n💾 Valuing and inserting items...");
    let commentator = commentary::from_name(&config.commentary)
        .with_context(|| format!("Unknown commentator: {}", config.commentary))?;
    let source = csv_path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| csv_arg.clone());
    let summary = import_items(&conn, &items, &source, IMPORT_ACTOR, commentator.as_ref())?;
    println!("✓ Inserted: {} valuations", summary.inserted);
    println!("✓ Skipped duplicates: {}", summary.duplicates);

    // 4. Verify count
    println!("\n🔍 Verifying database...");
    let count = verify_count(&conn)?;
    println!("✓ Database contains {} valuations", count);

    Ok(())
}

fn run_value(config: &Config, args: &[String]) -> Result<()> {
    let [price, brand, category, condition, material, rarity, months] = args else {
        bail!(
            "value needs 7 arguments: <price> <brand> <category> <condition> <material> <rarity> <months>"
        );
    };

    let item = ClothingItem::new(
        price
            .parse::<f64>()
            .with_context(|| format!("Invalid price: {}", price))?,
        brand,
        category,
        Condition::parse(condition),
        material,
        Rarity::parse(rarity),
        months
            .parse::<u32>()
            .with_context(|| format!("Invalid age in months: {}", months))?,
    );

    let valuation = ValuationEngine::new().breakdown(&item);
    let commentator = commentary::from_name(&config.commentary)
        .with_context(|| format!("Unknown commentator: {}", config.commentary))?;

    let tier_name = |tier: Option<&'static str>| tier.unwrap_or("unmatched");

    println!("💰 Valuation");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!(
        "  Brand      {:<20} {:>6.2}  ({})",
        item.brand,
        valuation.factors.brand,
        tier_name(valuation.brand_tier.map(|t| t.as_str()))
    );
    println!(
        "  Category   {:<20} {:>6.2}  ({})",
        item.category,
        valuation.factors.category,
        tier_name(valuation.category_tier.map(|t| t.as_str()))
    );
    println!("  Condition  {:<20} {:>6.2}", item.condition, valuation.factors.condition);
    println!(
        "  Material   {:<20} {:>6.2}  ({})",
        item.material,
        valuation.factors.material,
        tier_name(valuation.material_tier.map(|t| t.as_str()))
    );
    println!("  Rarity     {:<20} {:>6.2}", item.rarity, valuation.factors.rarity);
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("  Compound rate  {:.6} per year", valuation.compound_rate);
    println!("  Age            {:.2} years", valuation.years);
    println!("  Initial price  {:.2}", valuation.initial_price);
    println!("  Current price  {:.2}", valuation.current_price);

    let text = commentator.comment(&item, &valuation)?;
    if !text.is_empty() {
        println!("\n💬 {}", text);
    }

    Ok(())
}

#[cfg(feature = "tui")]
fn run_ui_mode(config: &Config) -> Result<()> {
    println!("🖥️  Loading Resale Valuation browser...\n");

    if !config.db_path.exists() {
        eprintln!("❌ Database not found at {:?}", config.db_path);
        eprintln!("   Run: resale-valuation import <csv>");
        eprintln!("   to import items first.");
        std::process::exit(1);
    }

    let conn = open_database(&config.db_path)?;

    println!("📊 Loading valuations...");
    let records = resale_valuation::get_all_records(&conn)?;
    println!("✓ Loaded {} valuations\n", records.len());
    println!("Starting UI... (Press 'q' to quit)\n");

    let mut app = ui::App::new(records);
    ui::run_ui(&mut app)?;

    println!("\n✅ UI closed successfully");

    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_config: &Config) -> Result<()> {
    eprintln!("❌ TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or use the API: cargo run --bin resale-server --features server");
    std::process::exit(1);
}
