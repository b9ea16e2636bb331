use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use std::collections::HashMap;
use std::time::Duration;

use crate::models::{
    Location, MenuItem, NewOrder, Order, OrderLineItem, OrderStatus, Product, ProductCategory,
    Restaurant,
};
use crate::services::store::{CatalogStore, LocationStore, OrderStore, StoreError};

const UNIQUE_VIOLATION: &str = "23505";

/// PostgreSQL-backed store for the catalog, orders and geocoding cache
pub struct PostgresClient {
    pool: PgPool,
}

impl PostgresClient {
    /// Create a new PostgreSQL client from a connection string
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
        acquire_timeout: Duration,
        idle_timeout: Duration,
    ) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(acquire_timeout)
            .idle_timeout(idle_timeout)
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        // Run migrations on startup
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    /// Create a new PostgreSQL client from settings
    pub async fn from_settings(
        url: &str,
        max_connections: Option<u32>,
        min_connections: Option<u32>,
        acquire_timeout_secs: Option<u64>,
        idle_timeout_secs: Option<u64>,
    ) -> Result<Self, StoreError> {
        tracing::info!("Connecting to PostgreSQL");

        Self::new(
            url,
            max_connections.unwrap_or(10),
            min_connections.unwrap_or(1),
            Duration::from_secs(acquire_timeout_secs.unwrap_or(5)),
            Duration::from_secs(idle_timeout_secs.unwrap_or(600)),
        )
        .await
    }

    async fn line_items(&self, order_ids: &[i64]) -> Result<HashMap<i64, Vec<OrderLineItem>>, StoreError> {
        let query = r#"
            SELECT oi.order_id, oi.product_id, p.name AS product_name, oi.quantity, oi.price
            FROM order_items oi
            JOIN products p ON p.id = oi.product_id
            WHERE oi.order_id = ANY($1)
            ORDER BY oi.id
        "#;

        let rows = sqlx::query(query).bind(order_ids).fetch_all(&self.pool).await?;

        let mut items: HashMap<i64, Vec<OrderLineItem>> = HashMap::new();
        for row in &rows {
            items
                .entry(row.try_get("order_id")?)
                .or_default()
                .push(OrderLineItem {
                    product_id: row.try_get("product_id")?,
                    product_name: row.try_get("product_name")?,
                    quantity: row.try_get("quantity")?,
                    price: row.try_get("price")?,
                });
        }

        Ok(items)
    }
}

fn location_from_row(row: &PgRow) -> Result<Location, sqlx::Error> {
    Ok(Location {
        address: row.try_get("address")?,
        lat: row.try_get("lat")?,
        lon: row.try_get("lon")?,
        fetched_at: row.try_get("fetched_at")?,
    })
}

fn product_from_row(row: &PgRow) -> Result<Product, sqlx::Error> {
    let category_id: Option<i64> = row.try_get("category_id")?;
    let category_name: Option<String> = row.try_get("category_name")?;

    Ok(Product {
        id: row.try_get("product_id")?,
        name: row.try_get("product_name")?,
        price: row.try_get("price")?,
        category: category_id
            .zip(category_name)
            .map(|(id, name)| ProductCategory { id, name }),
        image: row.try_get("image")?,
        special_status: row.try_get("special_status")?,
        description: row.try_get("description")?,
    })
}

fn order_from_row(row: &PgRow, items: Vec<OrderLineItem>) -> Result<Order, sqlx::Error> {
    Ok(Order {
        id: row.try_get("id")?,
        status: row.try_get("status")?,
        payment_method: row.try_get("payment_method")?,
        address: row.try_get("address")?,
        firstname: row.try_get("firstname")?,
        lastname: row.try_get("lastname")?,
        phonenumber: row.try_get("phonenumber")?,
        comment: row.try_get("comment")?,
        restaurant_id: row.try_get("restaurant_id")?,
        created_at: row.try_get("created_at")?,
        called_at: row.try_get("called_at")?,
        delivered_at: row.try_get("delivered_at")?,
        items,
    })
}

const PRODUCT_COLUMNS: &str = r#"
    p.id AS product_id, p.name AS product_name, p.price, p.image, p.special_status,
    p.description, c.id AS category_id, c.name AS category_name
"#;

const ORDER_COLUMNS: &str = r#"
    id, status, payment_method, address, firstname, lastname, phonenumber, comment,
    restaurant_id, created_at, called_at, delivered_at
"#;

#[async_trait]
impl LocationStore for PostgresClient {
    async fn find_locations(&self, addresses: &[String]) -> Result<Vec<Location>, StoreError> {
        let query = r#"
            SELECT address, lat, lon, fetched_at
            FROM locations
            WHERE address = ANY($1)
        "#;

        let rows = sqlx::query(query).bind(addresses).fetch_all(&self.pool).await?;

        let locations = rows
            .iter()
            .map(location_from_row)
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!("Found {} of {} addresses in locations table", locations.len(), addresses.len());

        Ok(locations)
    }

    /// Uses INSERT ... ON CONFLICT DO NOTHING so concurrent lookups of the
    /// same new address do not fail each other.
    async fn insert_locations(&self, locations: &[Location]) -> Result<u64, StoreError> {
        if locations.is_empty() {
            return Ok(0);
        }

        let query = r#"
            INSERT INTO locations (address, lat, lon, fetched_at)
            SELECT * FROM UNNEST($1::text[], $2::float8[], $3::float8[], $4::date[])
            ON CONFLICT (address) DO NOTHING
        "#;

        let addresses: Vec<String> = locations.iter().map(|l| l.address.clone()).collect();
        let lats: Vec<Option<f64>> = locations.iter().map(|l| l.lat).collect();
        let lons: Vec<Option<f64>> = locations.iter().map(|l| l.lon).collect();
        let dates: Vec<chrono::NaiveDate> = locations.iter().map(|l| l.fetched_at).collect();

        let result = sqlx::query(query)
            .bind(&addresses)
            .bind(&lats)
            .bind(&lons)
            .bind(&dates)
            .execute(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(db) if db.code().as_deref() == Some(UNIQUE_VIOLATION) => {
                    StoreError::Conflict(db.message().to_string())
                }
                other => StoreError::SqlxError(other),
            })?;

        Ok(result.rows_affected())
    }
}

#[async_trait]
impl CatalogStore for PostgresClient {
    async fn available_menu_items(&self) -> Result<Vec<MenuItem>, StoreError> {
        let query = format!(
            r#"
            SELECT r.id AS restaurant_id, r.name AS restaurant_name, r.address AS restaurant_address,
                   r.contact_phone, m.availability, {PRODUCT_COLUMNS}
            FROM menu_items m
            JOIN restaurants r ON r.id = m.restaurant_id
            JOIN products p ON p.id = m.product_id
            LEFT JOIN product_categories c ON c.id = p.category_id
            WHERE m.availability
            ORDER BY r.id, p.id
            "#
        );

        let rows = sqlx::query(&query).fetch_all(&self.pool).await?;

        let items = rows
            .iter()
            .map(|row| {
                Ok(MenuItem {
                    restaurant: Restaurant {
                        id: row.try_get("restaurant_id")?,
                        name: row.try_get("restaurant_name")?,
                        address: row.try_get("restaurant_address")?,
                        contact_phone: row.try_get("contact_phone")?,
                    },
                    product: product_from_row(row)?,
                    availability: row.try_get("availability")?,
                })
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()?;

        tracing::debug!("Loaded {} available menu items", items.len());

        Ok(items)
    }

    async fn available_products(&self) -> Result<Vec<Product>, StoreError> {
        let query = format!(
            r#"
            SELECT {PRODUCT_COLUMNS}
            FROM products p
            LEFT JOIN product_categories c ON c.id = p.category_id
            WHERE EXISTS (
                SELECT 1 FROM menu_items m WHERE m.product_id = p.id AND m.availability
            )
            ORDER BY p.id
            "#
        );

        let rows = sqlx::query(&query).fetch_all(&self.pool).await?;

        let products = rows
            .iter()
            .map(product_from_row)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(products)
    }

    /// Health check for the database connection
    async fn health_check(&self) -> Result<bool, StoreError> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| true)
            .map_err(Into::into)
    }
}

#[async_trait]
impl OrderStore for PostgresClient {
    async fn create_order(&self, order: NewOrder) -> Result<Order, StoreError> {
        let product_ids: Vec<i64> = order.items.iter().map(|i| i.product_id).collect();

        let mut tx = self.pool.begin().await?;

        let rows = sqlx::query("SELECT id, name, price FROM products WHERE id = ANY($1)")
            .bind(&product_ids)
            .fetch_all(&mut *tx)
            .await?;

        let mut products: HashMap<i64, (String, Decimal)> = HashMap::new();
        for row in &rows {
            products.insert(row.try_get("id")?, (row.try_get("name")?, row.try_get("price")?));
        }

        let mut items = Vec::with_capacity(order.items.len());
        for item in &order.items {
            let (name, price) = products
                .get(&item.product_id)
                .ok_or_else(|| StoreError::InvalidInput(format!("unknown product {}", item.product_id)))?;
            items.push(OrderLineItem {
                product_id: item.product_id,
                product_name: name.clone(),
                quantity: item.quantity,
                price: *price,
            });
        }

        let insert_order = format!(
            r#"
            INSERT INTO orders (address, firstname, lastname, phonenumber)
            VALUES ($1, $2, $3, $4)
            RETURNING {ORDER_COLUMNS}
            "#
        );

        let row = sqlx::query(&insert_order)
            .bind(&order.address)
            .bind(&order.firstname)
            .bind(&order.lastname)
            .bind(&order.phonenumber)
            .fetch_one(&mut *tx)
            .await?;

        let order_id: i64 = row.try_get("id")?;

        let insert_items = r#"
            INSERT INTO order_items (order_id, product_id, quantity, price)
            SELECT $1, * FROM UNNEST($2::bigint[], $3::int4[], $4::numeric[])
        "#;

        let quantities: Vec<i32> = items.iter().map(|i| i.quantity).collect();
        let prices: Vec<Decimal> = items.iter().map(|i| i.price).collect();

        sqlx::query(insert_items)
            .bind(order_id)
            .bind(&product_ids)
            .bind(&quantities)
            .bind(&prices)
            .execute(&mut *tx)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(db) if db.code().as_deref() == Some(UNIQUE_VIOLATION) => {
                    StoreError::InvalidInput("duplicate product in order".to_string())
                }
                other => StoreError::SqlxError(other),
            })?;

        tx.commit().await?;

        let created = order_from_row(&row, items)?;

        tracing::info!("Registered order {} with {} items", created.id, created.items.len());

        Ok(created)
    }

    async fn list_orders(&self, status: Option<OrderStatus>) -> Result<Vec<Order>, StoreError> {
        let query = format!(
            r#"
            SELECT {ORDER_COLUMNS}
            FROM orders
            WHERE ($1::order_status IS NULL AND status <> 'done') OR status = $1
            ORDER BY status, created_at, id
            "#
        );

        let rows = sqlx::query(&query).bind(status).fetch_all(&self.pool).await?;

        let order_ids = rows
            .iter()
            .map(|row| row.try_get("id"))
            .collect::<Result<Vec<i64>, _>>()?;

        let mut items = self.line_items(&order_ids).await?;

        let orders = rows
            .iter()
            .zip(order_ids)
            .map(|(row, id)| order_from_row(row, items.remove(&id).unwrap_or_default()))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(orders)
    }
}
