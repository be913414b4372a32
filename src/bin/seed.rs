//! Seed or remove a fixture order.
//!
//! ```text
//! seed                      apply the test schema and insert one order
//! seed cleanup <order-id>   delete an order and everything attached to it
//! ```

use anyhow::{bail, Context, Result};
use order_document_server::db::fixtures::FixtureOrder;
use order_document_server::db::PgOrderStore;
use order_document_server::Settings;
use uuid::Uuid;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let settings = Settings::from_env();
    if settings.supabase.database_url.is_empty() {
        bail!("SUPABASE_DATABASE_URL must be set");
    }
    let store = PgOrderStore::connect(&settings.supabase.database_url)
        .await
        .context("connecting to database")?;

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.first().map(String::as_str) {
        None | Some("seed") => {
            store.apply_test_schema().await.context("applying test schema")?;
            let fixture = FixtureOrder::new(&format!("SEED-{}", chrono::Utc::now().timestamp()))
                .item("Mixed Variety", 2, 24.0)
                .item("Garden Roses", 1, 36.5)
                .addon("Local Delivery", 15.0)
                .instructions("Deliver to the loading dock");
            let order_id = store.seed_order(&fixture).await.context("seeding order")?;
            log::info!("Seeded order {} ({})", fixture.order_number, order_id);
            println!("{}", order_id);
        }
        Some("cleanup") => {
            let raw = args.get(1).context("usage: seed cleanup <order-id>")?;
            let order_id = Uuid::parse_str(raw).context("order id must be a UUID")?;
            let removed = store.cleanup_order(order_id).await.context("cleaning up order")?;
            log::info!("Removed {} order(s) with id {}", removed, order_id);
        }
        Some(other) => bail!("unknown command '{}'; expected 'seed' or 'cleanup'", other),
    }

    Ok(())
}
