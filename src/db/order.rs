//! Order database operations

use super::PgOrderStore;
use crate::order::model::{Order, OrderAddon, OrderCommunication, OrderDetails, OrderItem};
use uuid::Uuid;

impl PgOrderStore {
    pub async fn get_order(&self, order_id: Uuid) -> Result<Option<Order>, sqlx::Error> {
        sqlx::query_as::<_, Order>(
            r#"
            SELECT id, order_number, company_name, contact_name, email, phone,
                   delivery_address, city, state, zip_code, po_number, requested_date,
                   special_instructions,
                   subtotal::float8 AS subtotal,
                   addon_total::float8 AS addon_total,
                   total::float8 AS total,
                   status, created_at, updated_at
            FROM orders
            WHERE id = $1
            "#,
        )
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn get_order_items(&self, order_id: Uuid) -> Result<Vec<OrderItem>, sqlx::Error> {
        sqlx::query_as::<_, OrderItem>(
            r#"
            SELECT oi.id, oi.order_id, oi.product_id, oi.quantity,
                   oi.unit_price::float8 AS unit_price,
                   oi.total_price::float8 AS total_price,
                   p.name AS product_name,
                   p.product_type,
                   p.description AS product_description
            FROM order_items oi
            LEFT JOIN products p ON p.id = oi.product_id
            WHERE oi.order_id = $1
            ORDER BY oi.created_at, oi.id
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await
    }

    pub async fn get_order_addons(&self, order_id: Uuid) -> Result<Vec<OrderAddon>, sqlx::Error> {
        sqlx::query_as::<_, OrderAddon>(
            r#"
            SELECT oa.id, oa.order_id, oa.addon_id,
                   oa.price::float8 AS price,
                   a.name AS addon_name,
                   a.description AS addon_description,
                   a.requirements
            FROM order_addons oa
            LEFT JOIN addons a ON a.id = oa.addon_id
            WHERE oa.order_id = $1
            ORDER BY oa.created_at, oa.id
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await
    }

    pub async fn get_order_details(&self, order_id: Uuid) -> Result<Option<OrderDetails>, sqlx::Error> {
        let order = match self.get_order(order_id).await? {
            Some(order) => order,
            None => return Ok(None),
        };
        let (items, addons) = futures::try_join!(
            self.get_order_items(order_id),
            self.get_order_addons(order_id)
        )?;

        Ok(Some(OrderDetails { order, items, addons }))
    }

    pub async fn get_order_communications(
        &self,
        order_id: Uuid,
    ) -> Result<Vec<OrderCommunication>, sqlx::Error> {
        sqlx::query_as::<_, OrderCommunication>(
            r#"
            SELECT id, order_id, communication_type, recipient, status, retry_count,
                   error_message, created_at, updated_at
            FROM order_communications
            WHERE order_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await
    }
}
