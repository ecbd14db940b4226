//! Catalog inspection commands.
//!
//! These read the same store the admin API writes, resolved from the same
//! environment configuration, so what they print is what the storefront
//! serves.

use clap::Subcommand;

use mercurial_catalog::{CatalogConfig, CatalogStore};
use mercurial_core::ProductRecord;

/// Sub-commands available under `catalog`.
#[derive(Debug, Subcommand)]
pub enum CatalogCommands {
    /// List every product in the catalog
    List,
    /// Print one product as pretty JSON
    Show {
        /// Product id
        id: String,
    },
    /// Check that every stored image reference resolves to a file on disk
    VerifyImages {
        /// Restrict the check to a single product (by id)
        #[arg(long)]
        product: Option<String>,
    },
}

pub async fn run(command: CatalogCommands) -> anyhow::Result<()> {
    let config = mercurial_core::load_app_config_from_env()?;
    let store = CatalogStore::new(CatalogConfig::from_app_config(&config));

    match command {
        CatalogCommands::List => run_list(&store).await,
        CatalogCommands::Show { id } => run_show(&store, &id).await,
        CatalogCommands::VerifyImages { product } => {
            run_verify_images(&store, product.as_deref()).await
        }
    }
}

async fn run_list(store: &CatalogStore) -> anyhow::Result<()> {
    let products = store.load().await;
    if products.is_empty() {
        println!("catalog is empty");
        return Ok(());
    }

    println!("{:<16} {:<28} {:>10} {:>7} {:>7}", "ID", "NAME", "PRICE", "STOCK", "IMAGES");
    for product in &products {
        println!(
            "{:<16} {:<28} {:>10} {:>7} {:>7}",
            product.id,
            product.name,
            product.price,
            product.stock,
            product.images.len()
        );
    }
    println!("{} product(s)", products.len());
    Ok(())
}

async fn run_show(store: &CatalogStore, id: &str) -> anyhow::Result<()> {
    let products = store.load().await;
    let Some(product) = products.iter().find(|p| p.id == id) else {
        anyhow::bail!("no product with id {id}");
    };
    println!("{}", serde_json::to_string_pretty(product)?);
    Ok(())
}

/// Verify stored image references against the images directory.
///
/// Logs missing files for cleanup and prints aggregate totals.
async fn run_verify_images(store: &CatalogStore, product_filter: Option<&str>) -> anyhow::Result<()> {
    let products = store.load().await;
    let selected: Vec<&ProductRecord> = products
        .iter()
        .filter(|p| product_filter.is_none_or(|id| p.id == id))
        .collect();

    if let Some(id) = product_filter {
        if selected.is_empty() {
            anyhow::bail!("no product with id {id}");
        }
    }

    let report = verify_images(store, &selected).await;
    if report.total() == 0 {
        println!("no image references found to verify");
        return Ok(());
    }

    println!(
        "verified image references: {} OK, {} missing, {} inline",
        report.ok, report.missing, report.inline
    );
    Ok(())
}

#[derive(Debug, Default)]
struct VerifyReport {
    ok: usize,
    missing: usize,
    inline: usize,
}

impl VerifyReport {
    fn total(&self) -> usize {
        self.ok + self.missing + self.inline
    }
}

async fn verify_images(store: &CatalogStore, products: &[&ProductRecord]) -> VerifyReport {
    let mut report = VerifyReport::default();

    for product in products {
        for image in &product.images {
            if image.is_inline() {
                report.inline += 1;
                continue;
            }
            let Some(file_name) = image.file_name() else {
                // Foreign reference (hand-edited URL); nothing to check.
                report.ok += 1;
                continue;
            };
            let path = store.config().images_dir.join(file_name);
            if tokio::fs::try_exists(&path).await.unwrap_or(false) {
                report.ok += 1;
            } else {
                report.missing += 1;
                tracing::warn!(
                    product_id = %product.id,
                    reference = %image,
                    path = %path.display(),
                    "image reference does not resolve to a file"
                );
            }
        }
    }

    report
}
