use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Row, Transaction, postgres::PgRow};
use uuid::Uuid;

use crate::{
    CartLine, DeliveryDetails, ItemStatus, ItemTransition, LocatedItem, Money, NewOrder, OrderId,
    OrderItemRecord, OrderQuery, OrderRecord, OrderWithItems, ProductId, Result, StoreError,
    UserId, Version,
    store::{CartStore, OrderRepository},
};

const ORDER_COLUMNS: &str = "o.id, o.buyer_id, o.delivery_address, o.phone, o.first_name, \
     o.last_name, o.city, o.region, o.estimated_delivery, o.status, o.created_at, o.updated_at";

const ITEM_COLUMNS: &str = "i.order_id, i.product_id, i.seller_id, i.product_name, i.image_urls, \
     i.variant, i.quantity, i.unit_price_cents, i.status, i.cancel_reason, i.line_no, i.version, \
     i.created_at, i.updated_at";

/// PostgreSQL-backed order store implementation.
#[derive(Clone)]
pub struct PostgresOrderStore {
    pool: PgPool,
}

impl PostgresOrderStore {
    /// Creates a new PostgreSQL order store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    async fn delete_cart(tx: &mut Transaction<'_, Postgres>, buyer_id: UserId) -> Result<()> {
        sqlx::query("DELETE FROM cart_lines WHERE buyer_id = $1")
            .bind(buyer_id.as_uuid())
            .execute(&mut **tx)
            .await?;
        Ok(())
    }

    /// Locks the buyer's cart rows, checks that `lines` are all still there
    /// unchanged, and deletes exactly those lines.
    ///
    /// A concurrent checkout of the same cart blocks on the row locks and
    /// then finds the lines gone.
    async fn claim_cart_lines(
        tx: &mut Transaction<'_, Postgres>,
        buyer_id: UserId,
        lines: &[CartLine],
    ) -> Result<()> {
        if lines.is_empty() {
            return Ok(());
        }

        let locked = sqlx::query(
            "SELECT buyer_id, product_id, quantity, variant FROM cart_lines \
             WHERE buyer_id = $1 FOR UPDATE",
        )
        .bind(buyer_id.as_uuid())
        .fetch_all(&mut **tx)
        .await?
        .iter()
        .map(Self::row_to_cart_line)
        .collect::<Result<Vec<_>>>()?;

        if !lines.iter().all(|line| locked.contains(line)) {
            return Err(StoreError::CartChanged { buyer_id });
        }

        let product_ids: Vec<Uuid> = lines.iter().map(|l| l.product_id.as_uuid()).collect();
        sqlx::query("DELETE FROM cart_lines WHERE buyer_id = $1 AND product_id = ANY($2)")
            .bind(buyer_id.as_uuid())
            .bind(&product_ids)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }

    fn row_to_cart_line(row: &PgRow) -> Result<CartLine> {
        let quantity: i32 = row.try_get("quantity")?;
        Ok(CartLine {
            buyer_id: UserId::from_uuid(row.try_get::<Uuid, _>("buyer_id")?),
            product_id: ProductId::from_uuid(row.try_get::<Uuid, _>("product_id")?),
            quantity: u32::try_from(quantity)
                .map_err(|_| StoreError::Corrupt(format!("negative cart quantity {quantity}")))?,
            variant: row.try_get("variant")?,
        })
    }

    fn parse_status(raw: &str) -> Result<ItemStatus> {
        raw.parse()
            .map_err(|e: common::UnknownStatus| StoreError::Corrupt(e.to_string()))
    }

    fn row_to_order(row: &PgRow) -> Result<OrderRecord> {
        let status: String = row.try_get("status")?;

        Ok(OrderRecord {
            id: OrderId::from_uuid(row.try_get::<Uuid, _>("id")?),
            buyer_id: UserId::from_uuid(row.try_get::<Uuid, _>("buyer_id")?),
            delivery: DeliveryDetails {
                address: row.try_get("delivery_address")?,
                phone: row.try_get("phone")?,
                first_name: row.try_get("first_name")?,
                last_name: row.try_get("last_name")?,
                city: row.try_get("city")?,
                region: row.try_get("region")?,
            },
            estimated_delivery: row.try_get("estimated_delivery")?,
            status: Self::parse_status(&status)?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn row_to_item(row: &PgRow) -> Result<OrderItemRecord> {
        let status: String = row.try_get("status")?;
        let quantity: i32 = row.try_get("quantity")?;

        Ok(OrderItemRecord {
            order_id: OrderId::from_uuid(row.try_get::<Uuid, _>("order_id")?),
            product_id: ProductId::from_uuid(row.try_get::<Uuid, _>("product_id")?),
            seller_id: UserId::from_uuid(row.try_get::<Uuid, _>("seller_id")?),
            product_name: row.try_get("product_name")?,
            image_urls: row.try_get("image_urls")?,
            variant: row.try_get("variant")?,
            quantity: u32::try_from(quantity)
                .map_err(|_| StoreError::Corrupt(format!("negative quantity {quantity}")))?,
            unit_price: Money::from_cents(row.try_get("unit_price_cents")?),
            status: Self::parse_status(&status)?,
            cancel_reason: row.try_get("cancel_reason")?,
            line_no: row.try_get("line_no")?,
            version: Version::new(row.try_get("version")?),
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

#[async_trait]
impl CartStore for PostgresOrderStore {
    #[tracing::instrument(skip(self))]
    async fn read_cart_lines(&self, buyer_id: UserId) -> Result<Vec<CartLine>> {
        let rows = sqlx::query(
            r#"
            SELECT buyer_id, product_id, quantity, variant
            FROM cart_lines
            WHERE buyer_id = $1
            ORDER BY added_at ASC, product_id ASC
            "#,
        )
        .bind(buyer_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_cart_line).collect()
    }

    #[tracing::instrument(skip(self))]
    async fn clear_cart(&self, buyer_id: UserId) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        Self::delete_cart(&mut tx, buyer_id).await?;
        tx.commit().await?;
        Ok(())
    }
}

#[async_trait]
impl OrderRepository for PostgresOrderStore {
    #[tracing::instrument(skip(self, order), fields(order_id = %order.id, buyer_id = %order.buyer_id))]
    async fn place_order(&self, order: NewOrder) -> Result<OrderWithItems> {
        if order.items.is_empty() {
            return Err(StoreError::EmptyOrder);
        }

        let records = order.to_records();
        let o = &records.order;

        // Dropping the transaction without commit rolls everything back.
        let mut tx = self.pool.begin().await?;

        Self::claim_cart_lines(&mut tx, o.buyer_id, &order.cart_lines).await?;

        sqlx::query(
            r#"
            INSERT INTO orders (id, buyer_id, delivery_address, phone, first_name, last_name,
                                city, region, estimated_delivery, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(o.id.as_uuid())
        .bind(o.buyer_id.as_uuid())
        .bind(&o.delivery.address)
        .bind(&o.delivery.phone)
        .bind(&o.delivery.first_name)
        .bind(&o.delivery.last_name)
        .bind(&o.delivery.city)
        .bind(&o.delivery.region)
        .bind(o.estimated_delivery)
        .bind(o.status.as_str())
        .bind(o.created_at)
        .bind(o.updated_at)
        .execute(&mut *tx)
        .await?;

        for item in &records.items {
            let quantity = i32::try_from(item.quantity)
                .map_err(|_| StoreError::Corrupt(format!("quantity {} overflows", item.quantity)))?;

            sqlx::query(
                r#"
                INSERT INTO order_items (order_id, product_id, seller_id, product_name, image_urls,
                                         variant, quantity, unit_price_cents, status, cancel_reason,
                                         line_no, version, created_at, updated_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
                "#,
            )
            .bind(item.order_id.as_uuid())
            .bind(item.product_id.as_uuid())
            .bind(item.seller_id.as_uuid())
            .bind(&item.product_name)
            .bind(&item.image_urls)
            .bind(&item.variant)
            .bind(quantity)
            .bind(item.unit_price.cents())
            .bind(item.status.as_str())
            .bind(&item.cancel_reason)
            .bind(item.line_no)
            .bind(item.version.as_i64())
            .bind(item.created_at)
            .bind(item.updated_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(records)
    }

    #[tracing::instrument(skip(self))]
    async fn find_item(
        &self,
        order_id: OrderId,
        product_id: ProductId,
    ) -> Result<Option<LocatedItem>> {
        let sql = format!(
            "SELECT {ITEM_COLUMNS}, o.buyer_id FROM order_items i \
             JOIN orders o ON o.id = i.order_id \
             WHERE i.order_id = $1 AND i.product_id = $2"
        );

        let row: Option<PgRow> = sqlx::query(&sql)
            .bind(order_id.as_uuid())
            .bind(product_id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(Some(LocatedItem {
                buyer_id: UserId::from_uuid(row.try_get::<Uuid, _>("buyer_id")?),
                item: Self::row_to_item(&row)?,
            })),
            None => Ok(None),
        }
    }

    #[tracing::instrument(
        skip(self, transition),
        fields(order_id = %transition.order_id, product_id = %transition.product_id, status = %transition.status)
    )]
    async fn transition_item(&self, transition: ItemTransition) -> Result<OrderItemRecord> {
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            "UPDATE order_items AS i \
             SET status = $1, cancel_reason = $2, version = i.version + 1, updated_at = $3 \
             WHERE i.order_id = $4 AND i.product_id = $5 AND i.version = $6 \
             RETURNING {ITEM_COLUMNS}"
        );

        let row: Option<PgRow> = sqlx::query(&sql)
            .bind(transition.status.as_str())
            .bind(&transition.cancel_reason)
            .bind(transition.at)
            .bind(transition.order_id.as_uuid())
            .bind(transition.product_id.as_uuid())
            .bind(transition.expected_version.as_i64())
            .fetch_optional(&mut *tx)
            .await?;

        let Some(row) = row else {
            let current: Option<i64> = sqlx::query_scalar(
                "SELECT version FROM order_items WHERE order_id = $1 AND product_id = $2",
            )
            .bind(transition.order_id.as_uuid())
            .bind(transition.product_id.as_uuid())
            .fetch_optional(&mut *tx)
            .await?;

            return Err(match current {
                Some(actual) => StoreError::StaleItem {
                    order_id: transition.order_id,
                    product_id: transition.product_id,
                    expected: transition.expected_version,
                    actual: Version::new(actual),
                },
                None => StoreError::ItemNotFound {
                    order_id: transition.order_id,
                    product_id: transition.product_id,
                },
            });
        };

        let item = Self::row_to_item(&row)?;

        sqlx::query("UPDATE orders SET updated_at = $1 WHERE id = $2")
            .bind(transition.at)
            .bind(transition.order_id.as_uuid())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(item)
    }

    #[tracing::instrument(skip(self))]
    async fn find_orders(&self, query: OrderQuery) -> Result<Vec<OrderWithItems>> {
        let mut sql = format!("SELECT {ORDER_COLUMNS} FROM orders o WHERE 1=1");
        let mut param_count = 0;

        // Build dynamic query
        if query.order_id.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND o.id = ${param_count}"));
        }
        if query.buyer_id.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND o.buyer_id = ${param_count}"));
        }
        if query.seller_id.is_some() {
            param_count += 1;
            sql.push_str(&format!(
                " AND EXISTS (SELECT 1 FROM order_items s WHERE s.order_id = o.id AND s.seller_id = ${param_count})"
            ));
        }

        sql.push_str(" ORDER BY o.created_at DESC, o.id ASC");

        if query.limit.is_some() {
            param_count += 1;
            sql.push_str(&format!(" LIMIT ${param_count}"));
        }
        if query.offset.is_some() {
            param_count += 1;
            sql.push_str(&format!(" OFFSET ${param_count}"));
        }

        let mut orders_query = sqlx::query(&sql);

        if let Some(id) = query.order_id {
            orders_query = orders_query.bind(id.as_uuid());
        }
        if let Some(buyer) = query.buyer_id {
            orders_query = orders_query.bind(buyer.as_uuid());
        }
        if let Some(seller) = query.seller_id {
            orders_query = orders_query.bind(seller.as_uuid());
        }
        // Past i64::MAX there is nothing left to page through.
        if let Some(limit) = query.limit {
            orders_query = orders_query.bind(i64::try_from(limit).unwrap_or(i64::MAX));
        }
        if let Some(offset) = query.offset {
            orders_query = orders_query.bind(i64::try_from(offset).unwrap_or(i64::MAX));
        }

        let orders = orders_query
            .fetch_all(&self.pool)
            .await?
            .iter()
            .map(Self::row_to_order)
            .collect::<Result<Vec<_>>>()?;

        if orders.is_empty() {
            return Ok(Vec::new());
        }

        let order_ids: Vec<Uuid> = orders.iter().map(|o| o.id.as_uuid()).collect();

        // Seller scoping happens here, so other sellers' rows are never fetched.
        let item_rows = match query.seller_id {
            Some(seller) => {
                let sql = format!(
                    "SELECT {ITEM_COLUMNS} FROM order_items i \
                     WHERE i.order_id = ANY($1) AND i.seller_id = $2 \
                     ORDER BY i.order_id, i.line_no"
                );
                sqlx::query(&sql)
                    .bind(&order_ids)
                    .bind(seller.as_uuid())
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                let sql = format!(
                    "SELECT {ITEM_COLUMNS} FROM order_items i \
                     WHERE i.order_id = ANY($1) \
                     ORDER BY i.order_id, i.line_no"
                );
                sqlx::query(&sql)
                    .bind(&order_ids)
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        let mut items_by_order: HashMap<OrderId, Vec<OrderItemRecord>> = HashMap::new();
        for row in &item_rows {
            let item = Self::row_to_item(row)?;
            items_by_order.entry(item.order_id).or_default().push(item);
        }

        Ok(orders
            .into_iter()
            .map(|order| OrderWithItems {
                items: items_by_order.remove(&order.id).unwrap_or_default(),
                order,
            })
            .collect())
    }
}
