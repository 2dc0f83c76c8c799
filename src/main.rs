use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use pricescout::{
    ExtractOptions, JsonProfileStore, MemoryProfileStore, Parser, ParserSettings, ProductInfo, ProfileStore,
    SiteKind, logging,
};

#[derive(clap::Parser)]
#[command(name = "pricescout", about = "Look up product prices on Ukrainian online shops")]
struct Cli {
    /// Settings file (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// JSON file keeping site profiles between runs
    #[arg(long, global = true)]
    profiles: Option<PathBuf>,

    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Search a shop and read the first results
    Search {
        site: SiteKind,
        query: String,
        #[arg(short = 'n', long, default_value_t = 5)]
        count: usize,
        #[command(flatten)]
        mode: ModeArgs,
    },
    /// Read a single product page
    Extract {
        site: SiteKind,
        url: String,
        #[command(flatten)]
        mode: ModeArgs,
    },
}

#[derive(Args, Clone, Copy)]
struct ModeArgs {
    /// Also read sale price and availability
    #[arg(long)]
    full: bool,
    /// Fail on the first missing field or product
    #[arg(long)]
    strict: bool,
    /// Fail on prices that don't match the site's format
    #[arg(long)]
    strict_prices: bool,
    /// Print JSON instead of a listing
    #[arg(long)]
    json: bool,
}

impl ModeArgs {
    fn options(self) -> ExtractOptions {
        let mut options = ExtractOptions::default();
        if self.full {
            options = options.full();
        }
        if self.strict {
            options = options.fail_fast();
        }
        if self.strict_prices {
            options = options.strict_prices();
        }
        options
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = <Cli as clap::Parser>::parse();
    logging::init(cli.verbose);

    let settings = ParserSettings::load(cli.config.as_deref()).context("Failed to load settings")?;
    let store: Box<dyn ProfileStore> = match &cli.profiles {
        Some(path) => Box::new(JsonProfileStore::open(path).context("Failed to open profile store")?),
        None => Box::new(MemoryProfileStore::new()),
    };

    let (site, mode) = match &cli.command {
        Command::Search { site, mode, .. } | Command::Extract { site, mode, .. } => (*site, *mode),
    };

    println!("🛒 Price Scout - {site}\n");
    println!("{}", "=".repeat(60));

    let parser = Parser::for_site(site, &settings, store.as_ref())
        .await
        .with_context(|| format!("Failed to start parser for {site}"))?;

    let outcome = match &cli.command {
        Command::Search { query, count, .. } => {
            println!("\n🔎 Searching for \"{query}\" ({count} products)...\n");
            parser.search_products(query, *count, mode.options()).await
        }
        Command::Extract { url, .. } => {
            println!("\n📦 Reading {url}...\n");
            parser.extract_product(url, mode.options()).await.map(|product| vec![product])
        }
    };

    if let Err(e) = parser.close().await {
        eprintln!("Failed to close browser session: {e}");
    }
    let products = outcome.context("Scraping failed")?;

    if mode.json {
        println!("{}", serde_json::to_string_pretty(&products)?);
        return Ok(());
    }

    print_products(site, &products);
    Ok(())
}

fn print_products(site: SiteKind, products: &[ProductInfo]) {
    println!("{}", "-".repeat(60));
    println!("{} PRODUCTS ({})", site.name().to_uppercase(), products.len());
    println!("{}", "-".repeat(60));

    for (i, product) in products.iter().enumerate() {
        println!("\n{}. {}", i + 1, product.title.as_deref().unwrap_or("Title not found"));
        match &product.price {
            Some(price) => println!("   💰 Price: {price}"),
            None => println!("   💰 Price: Price not found"),
        }
        if let Some(sale) = &product.price_on_sale {
            println!("   🏷️  On sale: {sale}");
        }
        if let Some(available) = product.is_available {
            println!("   📦 In stock: {}", if available { "yes" } else { "no" });
        }
        println!("   🔗 {}", product.url);
    }

    let on_sale = products.iter().filter(|p| p.is_on_sale == Some(true)).count();
    println!("\n\n{}", "=".repeat(60));
    println!("📊 SUMMARY");
    println!("{}", "=".repeat(60));
    println!("Products parsed: {}", products.len());
    println!("On sale: {on_sale}");
}
