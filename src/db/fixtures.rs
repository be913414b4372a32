//! Test schema and seed data for local development and database tests.

use super::PgOrderStore;
use uuid::Uuid;

/// Tables this server reads and writes. Production schemas are managed elsewhere.
pub const TEST_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS products (
    id UUID PRIMARY KEY,
    name TEXT NOT NULL,
    product_type TEXT,
    description TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE TABLE IF NOT EXISTS addons (
    id UUID PRIMARY KEY,
    name TEXT NOT NULL,
    description TEXT,
    requirements TEXT,
    price NUMERIC(10, 2) NOT NULL DEFAULT 0,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE TABLE IF NOT EXISTS orders (
    id UUID PRIMARY KEY,
    order_number TEXT NOT NULL,
    company_name TEXT,
    contact_name TEXT NOT NULL,
    email TEXT NOT NULL,
    phone TEXT,
    delivery_address TEXT,
    city TEXT,
    state TEXT,
    zip_code TEXT,
    po_number TEXT,
    requested_date DATE,
    special_instructions TEXT,
    subtotal NUMERIC(10, 2) NOT NULL DEFAULT 0,
    addon_total NUMERIC(10, 2) NOT NULL DEFAULT 0,
    total NUMERIC(10, 2) NOT NULL DEFAULT 0,
    status TEXT NOT NULL DEFAULT 'pending',
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE TABLE IF NOT EXISTS order_items (
    id UUID PRIMARY KEY,
    order_id UUID NOT NULL REFERENCES orders(id) ON DELETE CASCADE,
    product_id UUID REFERENCES products(id) ON DELETE SET NULL,
    quantity INTEGER NOT NULL CHECK (quantity > 0),
    unit_price NUMERIC(10, 2) NOT NULL,
    total_price NUMERIC(10, 2) NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE TABLE IF NOT EXISTS order_addons (
    id UUID PRIMARY KEY,
    order_id UUID NOT NULL REFERENCES orders(id) ON DELETE CASCADE,
    addon_id UUID REFERENCES addons(id) ON DELETE SET NULL,
    price NUMERIC(10, 2) NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE TABLE IF NOT EXISTS order_documents (
    id UUID PRIMARY KEY,
    order_id UUID NOT NULL REFERENCES orders(id) ON DELETE CASCADE,
    document_type TEXT NOT NULL CHECK (document_type IN ('receipt', 'pick_slip')),
    status TEXT NOT NULL CHECK (status IN ('pending', 'generated', 'failed')),
    file_url TEXT,
    file_path TEXT,
    error_message TEXT,
    retry_count INTEGER NOT NULL DEFAULT 0 CHECK (retry_count >= 0),
    metadata JSONB NOT NULL DEFAULT '{}'::jsonb,
    created_at TIMESTAMPTZ NOT NULL DEFAULT clock_timestamp(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT clock_timestamp()
);

CREATE INDEX IF NOT EXISTS order_documents_order_id_idx ON order_documents (order_id);

CREATE TABLE IF NOT EXISTS order_communications (
    id UUID PRIMARY KEY,
    order_id UUID NOT NULL REFERENCES orders(id) ON DELETE CASCADE,
    communication_type TEXT NOT NULL,
    recipient TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'pending',
    retry_count INTEGER NOT NULL DEFAULT 0,
    error_message TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE TABLE IF NOT EXISTS webhook_events (
    id UUID PRIMARY KEY,
    event_type TEXT NOT NULL,
    payload JSONB NOT NULL DEFAULT '{}'::jsonb,
    status TEXT NOT NULL DEFAULT 'received',
    error_message TEXT,
    processing_duration_ms BIGINT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);
"#;

#[derive(Debug, Clone)]
pub struct FixtureItem {
    pub product_name: String,
    pub product_type: Option<String>,
    pub quantity: i32,
    pub unit_price: f64,
}

#[derive(Debug, Clone)]
pub struct FixtureAddon {
    pub name: String,
    pub price: f64,
}

/// Builder for a complete order with products and add-ons.
#[derive(Debug, Clone)]
pub struct FixtureOrder {
    pub id: Uuid,
    pub order_number: String,
    pub company_name: Option<String>,
    pub contact_name: String,
    pub email: String,
    pub special_instructions: Option<String>,
    pub items: Vec<FixtureItem>,
    pub addons: Vec<FixtureAddon>,
}

impl FixtureOrder {
    pub fn new(order_number: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            order_number: order_number.to_string(),
            company_name: Some("Test Florist".to_string()),
            contact_name: "Test Buyer".to_string(),
            email: "buyer@example.com".to_string(),
            special_instructions: None,
            items: Vec::new(),
            addons: Vec::new(),
        }
    }

    pub fn item(mut self, product_name: &str, quantity: i32, unit_price: f64) -> Self {
        self.items.push(FixtureItem {
            product_name: product_name.to_string(),
            product_type: Some("bouquet".to_string()),
            quantity,
            unit_price,
        });
        self
    }

    pub fn addon(mut self, name: &str, price: f64) -> Self {
        self.addons.push(FixtureAddon {
            name: name.to_string(),
            price,
        });
        self
    }

    pub fn instructions(mut self, text: &str) -> Self {
        self.special_instructions = Some(text.to_string());
        self
    }

    pub fn subtotal(&self) -> f64 {
        self.items
            .iter()
            .map(|i| i.unit_price * f64::from(i.quantity))
            .sum()
    }

    pub fn addon_total(&self) -> f64 {
        self.addons.iter().map(|a| a.price).sum()
    }
}

impl PgOrderStore {
    pub async fn apply_test_schema(&self) -> Result<(), sqlx::Error> {
        sqlx::raw_sql(TEST_SCHEMA).execute(&self.pool).await?;
        Ok(())
    }

    /// Insert the order, its catalogue rows and lines in one transaction.
    pub async fn seed_order(&self, fixture: &FixtureOrder) -> Result<Uuid, sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        let subtotal = fixture.subtotal();
        let addon_total = fixture.addon_total();

        sqlx::query(
            r#"
            INSERT INTO orders (id, order_number, company_name, contact_name, email,
                                special_instructions, subtotal, addon_total, total, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7::float8, $8::float8, $9::float8, 'confirmed')
            "#,
        )
        .bind(fixture.id)
        .bind(&fixture.order_number)
        .bind(fixture.company_name.as_deref())
        .bind(&fixture.contact_name)
        .bind(&fixture.email)
        .bind(fixture.special_instructions.as_deref())
        .bind(subtotal)
        .bind(addon_total)
        .bind(subtotal + addon_total)
        .execute(&mut *tx)
        .await?;

        for item in &fixture.items {
            let product_id = Uuid::new_v4();
            sqlx::query("INSERT INTO products (id, name, product_type) VALUES ($1, $2, $3)")
                .bind(product_id)
                .bind(&item.product_name)
                .bind(item.product_type.as_deref())
                .execute(&mut *tx)
                .await?;
            sqlx::query(
                r#"
                INSERT INTO order_items (id, order_id, product_id, quantity, unit_price, total_price)
                VALUES ($1, $2, $3, $4, $5::float8, $6::float8)
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(fixture.id)
            .bind(product_id)
            .bind(item.quantity)
            .bind(item.unit_price)
            .bind(item.unit_price * f64::from(item.quantity))
            .execute(&mut *tx)
            .await?;
        }

        for addon in &fixture.addons {
            let addon_id = Uuid::new_v4();
            sqlx::query("INSERT INTO addons (id, name, price) VALUES ($1, $2, $3::float8)")
                .bind(addon_id)
                .bind(&addon.name)
                .bind(addon.price)
                .execute(&mut *tx)
                .await?;
            sqlx::query(
                "INSERT INTO order_addons (id, order_id, addon_id, price) VALUES ($1, $2, $3, $4::float8)",
            )
            .bind(Uuid::new_v4())
            .bind(fixture.id)
            .bind(addon_id)
            .bind(addon.price)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(fixture.id)
    }

    /// Delete an order. Items, add-ons, documents and communications cascade.
    pub async fn cleanup_order(&self, order_id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(order_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
