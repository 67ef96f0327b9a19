//! MenuFlow - Multi-tenant Restaurant Ordering Backend

use anyhow::Result;
use axum::{extract::{Path, State}, http::StatusCode, response::IntoResponse, routing::{get, post, put}, Json, Router};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgPoolOptions;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;
use validator::Validate;

use menuflow::domain::delivery::{self, DeliveryZone, PricingMode, StoreDeliveryConfig};
use menuflow::domain::events::PlatformEvent;
use menuflow::domain::messaging::template::{self, TemplateVars};
use menuflow::domain::messaging::webhook::{reduce, StatusChange, WebhookEvent};
use menuflow::domain::messaging::{phone, MessageStatus};
use menuflow::domain::tracking::eta::{estimated_completion, OrderType};
use menuflow::domain::tracking::{self, OrderStatus, TRACKING_STEPS};
use menuflow::domain::value_objects::Price;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct StoreRow {
    pub id: Uuid, pub name: String, pub subdomain: String,
    pub delivery_price_mode: String, pub fixed_delivery_price: Decimal,
    pub free_delivery_enabled: bool, pub global_free_delivery_min_amount: Option<Decimal>,
    pub created_at: DateTime<Utc>, pub updated_at: DateTime<Utc>,
}

impl StoreRow {
    fn delivery_config(&self) -> StoreDeliveryConfig {
        StoreDeliveryConfig {
            pricing_mode: PricingMode::parse(&self.delivery_price_mode),
            fixed_price: Price::new(self.fixed_delivery_price),
            free_delivery_enabled: self.free_delivery_enabled,
            global_free_delivery_min_amount: self.global_free_delivery_min_amount.map(Price::new),
        }
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ZoneRow {
    pub id: Uuid, pub store_id: Uuid, pub name: String, pub delivery_price: Decimal,
    pub free_delivery_enabled: bool, pub free_delivery_min_amount: Option<Decimal>,
    pub created_at: DateTime<Utc>,
}

impl ZoneRow {
    fn to_domain(&self) -> DeliveryZone {
        DeliveryZone {
            id: self.id,
            name: self.name.clone(),
            delivery_price: Price::new(self.delivery_price),
            free_delivery_enabled: self.free_delivery_enabled,
            free_delivery_min_amount: self.free_delivery_min_amount.map(Price::new),
        }
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct OrderRow {
    pub id: Uuid, pub store_id: Uuid, pub order_number: i64,
    pub customer_name: Option<String>, pub customer_phone: Option<String>,
    pub status: String, pub order_type: String, pub subtotal: Decimal,
    pub created_at: DateTime<Utc>, pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct MessageRow {
    pub id: Uuid, pub store_id: Uuid, pub campaign_id: Option<Uuid>,
    pub evolution_message_id: Option<String>, pub customer_phone: String,
    pub message_type: String, pub message_body: String, pub status: String,
    pub sent_at: Option<DateTime<Utc>>, pub delivered_at: Option<DateTime<Utc>>,
    pub read_at: Option<DateTime<Utc>>, pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CampaignRow {
    pub id: Uuid, pub store_id: Uuid, pub name: String,
    pub messages_sent: i32, pub messages_delivered: i32, pub messages_failed: i32,
    pub created_at: DateTime<Utc>, pub updated_at: DateTime<Utc>,
}

#[derive(Clone)] pub struct AppState { pub db: sqlx::PgPool, pub nats: Option<async_nats::Client> }

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry().with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into())).with(tracing_subscriber::fmt::layer()).init();
    let db = PgPoolOptions::new().max_connections(10).connect(&std::env::var("DATABASE_URL")?).await?;
    sqlx::migrate!("./migrations").run(&db).await?;
    let nats = match std::env::var("NATS_URL") {
        Ok(url) => match async_nats::connect(&url).await {
            Ok(client) => Some(client),
            Err(e) => { tracing::warn!("NATS unavailable, events disabled: {e}"); None }
        },
        Err(_) => None,
    };
    let state = AppState { db, nats };

    let app = Router::new()
        .route("/health", get(|| async { Json(serde_json::json!({"status": "healthy", "service": "menuflow"})) }))
        .route("/api/v1/stores", post(create_store))
        .route("/api/v1/stores/:id/delivery-settings", get(get_delivery_settings).put(update_delivery_settings))
        .route("/api/v1/stores/:id/zones", get(list_zones).post(create_zone))
        .route("/api/v1/zones/:id", put(update_zone))
        .route("/api/v1/delivery/quote", post(delivery_quote))
        .route("/api/v1/orders", post(create_order))
        .route("/api/v1/orders/:id/status", put(update_order_status))
        .route("/api/v1/orders/:id/tracking", get(order_tracking))
        .route("/api/v1/order-statuses", get(list_order_statuses))
        .route("/api/v1/stores/:id/whatsapp-templates", put(upsert_template))
        .route("/api/v1/stores/:id/campaigns", post(create_campaign))
        .route("/api/v1/messages", post(send_message))
        .route("/webhooks/whatsapp", post(whatsapp_webhook))
        .layer(TraceLayer::new_for_http()).layer(CorsLayer::permissive()).with_state(state);

    let port = std::env::var("PORT").unwrap_or_else(|_| "8084".to_string());
    tracing::info!("MenuFlow listening on 0.0.0.0:{}", port);
    axum::serve(tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?, app).await?;
    Ok(())
}

fn internal<E: std::fmt::Display>(e: E) -> (StatusCode, String) {
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}

/// Publish to NATS when configured. Event delivery is best-effort and never
/// fails the request.
async fn publish_event(state: &AppState, event: &PlatformEvent) {
    let Some(nats) = &state.nats else { return };
    match serde_json::to_vec(event) {
        Ok(bytes) => {
            if let Err(e) = nats.publish(event.subject(), bytes.into()).await {
                tracing::warn!("failed to publish {}: {e}", event.subject());
            }
        }
        Err(e) => tracing::warn!("failed to serialize platform event: {e}"),
    }
}

// ---------------------------------------------------------------------------
// Stores, delivery settings, zones
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)] pub struct CreateStoreRequest { pub name: String, pub subdomain: String }

async fn create_store(State(s): State<AppState>, Json(r): Json<CreateStoreRequest>) -> Result<(StatusCode, Json<StoreRow>), (StatusCode, String)> {
    let store = sqlx::query_as::<_, StoreRow>("INSERT INTO stores (id, name, subdomain, created_at, updated_at) VALUES ($1, $2, $3, NOW(), NOW()) RETURNING *")
        .bind(Uuid::now_v7()).bind(&r.name).bind(r.subdomain.to_lowercase())
        .fetch_one(&s.db).await.map_err(internal)?;
    Ok((StatusCode::CREATED, Json(store)))
}

async fn get_delivery_settings(State(s): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<StoreDeliveryConfig>, (StatusCode, String)> {
    let store = sqlx::query_as::<_, StoreRow>("SELECT * FROM stores WHERE id = $1").bind(id)
        .fetch_optional(&s.db).await.map_err(internal)?
        .ok_or((StatusCode::NOT_FOUND, "Store not found".to_string()))?;
    Ok(Json(store.delivery_config()))
}

#[derive(Debug, Deserialize)]
pub struct UpdateDeliverySettingsRequest {
    pub delivery_price_mode: PricingMode,
    pub fixed_delivery_price: Decimal,
    pub free_delivery_enabled: bool,
    pub global_free_delivery_min_amount: Option<Decimal>,
}

async fn update_delivery_settings(State(s): State<AppState>, Path(id): Path<Uuid>, Json(r): Json<UpdateDeliverySettingsRequest>) -> Result<Json<StoreDeliveryConfig>, (StatusCode, String)> {
    let store = sqlx::query_as::<_, StoreRow>("UPDATE stores SET delivery_price_mode = $2, fixed_delivery_price = $3, free_delivery_enabled = $4, global_free_delivery_min_amount = $5, updated_at = NOW() WHERE id = $1 RETURNING *")
        .bind(id).bind(r.delivery_price_mode.as_str())
        .bind(Price::new(r.fixed_delivery_price).amount())
        .bind(r.free_delivery_enabled)
        .bind(r.global_free_delivery_min_amount.map(|a| Price::new(a).amount()))
        .fetch_optional(&s.db).await.map_err(internal)?
        .ok_or((StatusCode::NOT_FOUND, "Store not found".to_string()))?;
    Ok(Json(store.delivery_config()))
}

async fn list_zones(State(s): State<AppState>, Path(store_id): Path<Uuid>) -> Result<Json<Vec<ZoneRow>>, (StatusCode, String)> {
    let zones = sqlx::query_as::<_, ZoneRow>("SELECT * FROM delivery_zones WHERE store_id = $1 ORDER BY name")
        .bind(store_id).fetch_all(&s.db).await.map_err(internal)?;
    Ok(Json(zones))
}

#[derive(Debug, Deserialize)]
pub struct ZoneRequest {
    pub name: String,
    pub delivery_price: Decimal,
    #[serde(default = "default_true")] pub free_delivery_enabled: bool,
    pub free_delivery_min_amount: Option<Decimal>,
}

fn default_true() -> bool { true }

async fn create_zone(State(s): State<AppState>, Path(store_id): Path<Uuid>, Json(r): Json<ZoneRequest>) -> Result<(StatusCode, Json<ZoneRow>), (StatusCode, String)> {
    let zone = sqlx::query_as::<_, ZoneRow>("INSERT INTO delivery_zones (id, store_id, name, delivery_price, free_delivery_enabled, free_delivery_min_amount, created_at) VALUES ($1, $2, $3, $4, $5, $6, NOW()) RETURNING *")
        .bind(Uuid::now_v7()).bind(store_id).bind(&r.name)
        .bind(Price::new(r.delivery_price).amount())
        .bind(r.free_delivery_enabled)
        .bind(r.free_delivery_min_amount.map(|a| Price::new(a).amount()))
        .fetch_one(&s.db).await.map_err(internal)?;
    Ok((StatusCode::CREATED, Json(zone)))
}

async fn update_zone(State(s): State<AppState>, Path(id): Path<Uuid>, Json(r): Json<ZoneRequest>) -> Result<Json<ZoneRow>, (StatusCode, String)> {
    let zone = sqlx::query_as::<_, ZoneRow>("UPDATE delivery_zones SET name = $2, delivery_price = $3, free_delivery_enabled = $4, free_delivery_min_amount = $5 WHERE id = $1 RETURNING *")
        .bind(id).bind(&r.name)
        .bind(Price::new(r.delivery_price).amount())
        .bind(r.free_delivery_enabled)
        .bind(r.free_delivery_min_amount.map(|a| Price::new(a).amount()))
        .fetch_optional(&s.db).await.map_err(internal)?
        .ok_or((StatusCode::NOT_FOUND, "Zone not found".to_string()))?;
    Ok(Json(zone))
}

#[derive(Debug, Deserialize)]
pub struct QuoteRequest { pub store_id: Uuid, pub zone_id: Option<Uuid>, pub cart_total: Decimal }

/// Checkout calls this on every cart change. A store that is still loading
/// (or was deleted) quotes a zero fee with no free-delivery path rather than
/// erroring, matching what the cart UI expects.
async fn delivery_quote(State(s): State<AppState>, Json(r): Json<QuoteRequest>) -> Result<Json<delivery::DeliveryQuote>, (StatusCode, String)> {
    let store = sqlx::query_as::<_, StoreRow>("SELECT * FROM stores WHERE id = $1")
        .bind(r.store_id).fetch_optional(&s.db).await.map_err(internal)?;
    let zone = match r.zone_id {
        Some(zone_id) => Some(
            sqlx::query_as::<_, ZoneRow>("SELECT * FROM delivery_zones WHERE id = $1 AND store_id = $2")
                .bind(zone_id).bind(r.store_id)
                .fetch_optional(&s.db).await.map_err(internal)?
                .ok_or((StatusCode::NOT_FOUND, "Zone not found".to_string()))?,
        ),
        None => None,
    };
    let config = store.map(|row| row.delivery_config());
    let zone = zone.map(|row| row.to_domain());
    Ok(Json(delivery::quote(config.as_ref(), zone.as_ref(), Price::new(r.cart_total))))
}

// ---------------------------------------------------------------------------
// Orders and tracking
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub store_id: Uuid,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub order_type: String,
    pub items: Vec<OrderItemRequest>,
}

#[derive(Debug, Deserialize)]
pub struct OrderItemRequest { pub product_name: String, pub quantity: i32, pub unit_price: Decimal }

async fn create_order(State(s): State<AppState>, Json(r): Json<CreateOrderRequest>) -> Result<(StatusCode, Json<OrderRow>), (StatusCode, String)> {
    if r.items.is_empty() {
        return Err((StatusCode::UNPROCESSABLE_ENTITY, "Order has no items".to_string()));
    }
    let subtotal: Decimal = r.items.iter()
        .map(|i| Price::new(i.unit_price).amount() * Decimal::from(i.quantity.max(0)))
        .sum();
    let mut tx = s.db.begin().await.map_err(internal)?;
    let order = sqlx::query_as::<_, OrderRow>("INSERT INTO orders (id, store_id, customer_name, customer_phone, status, order_type, subtotal, created_at, updated_at) VALUES ($1, $2, $3, $4, 'pending', $5, $6, NOW(), NOW()) RETURNING *")
        .bind(Uuid::now_v7()).bind(r.store_id).bind(&r.customer_name).bind(&r.customer_phone)
        .bind(&r.order_type).bind(subtotal)
        .fetch_one(&mut *tx).await.map_err(internal)?;
    for item in &r.items {
        sqlx::query("INSERT INTO order_items (id, order_id, product_name, quantity, unit_price) VALUES ($1, $2, $3, $4, $5)")
            .bind(Uuid::now_v7()).bind(order.id).bind(&item.product_name)
            .bind(item.quantity.max(0)).bind(Price::new(item.unit_price).amount())
            .execute(&mut *tx).await.map_err(internal)?;
    }
    tx.commit().await.map_err(internal)?;
    publish_event(&s, &PlatformEvent::OrderStatusChanged { order_id: order.id, store_id: order.store_id, status: order.status.clone() }).await;
    Ok((StatusCode::CREATED, Json(order)))
}

#[derive(Debug, Deserialize)] pub struct UpdateOrderStatusRequest { pub status: String }

async fn update_order_status(State(s): State<AppState>, Path(id): Path<Uuid>, Json(r): Json<UpdateOrderStatusRequest>) -> Result<Json<OrderRow>, (StatusCode, String)> {
    let status = OrderStatus::parse(&r.status)
        .ok_or((StatusCode::UNPROCESSABLE_ENTITY, format!("Unknown status: {}", r.status)))?;
    let order = sqlx::query_as::<_, OrderRow>("UPDATE orders SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING *")
        .bind(id).bind(status.as_str())
        .fetch_optional(&s.db).await.map_err(internal)?
        .ok_or((StatusCode::NOT_FOUND, "Order not found".to_string()))?;
    publish_event(&s, &PlatformEvent::OrderStatusChanged { order_id: order.id, store_id: order.store_id, status: order.status.clone() }).await;
    Ok(Json(order))
}

#[derive(Debug, Serialize)]
pub struct TrackingStepView {
    pub status: &'static str,
    pub label: &'static str,
    pub description: &'static str,
    pub completed: bool,
}

#[derive(Debug, Serialize)]
pub struct TrackingResponse {
    pub order_id: Uuid,
    pub status: String,
    pub label: String,
    pub description: String,
    pub variant: &'static str,
    pub progress: u8,
    pub estimated_delivery_at: Option<DateTime<Utc>>,
    pub steps: Vec<TrackingStepView>,
}

async fn order_tracking(State(s): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<TrackingResponse>, (StatusCode, String)> {
    let order = sqlx::query_as::<_, OrderRow>("SELECT * FROM orders WHERE id = $1").bind(id)
        .fetch_optional(&s.db).await.map_err(internal)?
        .ok_or((StatusCode::NOT_FOUND, "Order not found".to_string()))?;
    let item_count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM order_items WHERE order_id = $1")
        .bind(id).fetch_one(&s.db).await.map_err(internal)?;

    let steps = TRACKING_STEPS.iter().map(|step| TrackingStepView {
        status: step.status.as_str(),
        label: step.label,
        description: step.description,
        completed: tracking::is_completed(&order.status, step.status.as_str()),
    }).collect();

    let estimated_delivery_at = if order.status == "cancelled" {
        None
    } else {
        Some(estimated_completion(order.created_at, item_count.0 as usize, OrderType::parse(&order.order_type), &order.status))
    };

    Ok(Json(TrackingResponse {
        order_id: order.id,
        label: tracking::label_of(&order.status).to_string(),
        description: tracking::description_of(&order.status).to_string(),
        variant: tracking::variant_of(&order.status),
        progress: tracking::progress_percentage(&order.status),
        estimated_delivery_at,
        steps,
        status: order.status,
    }))
}

async fn list_order_statuses() -> impl IntoResponse {
    Json(TRACKING_STEPS)
}

// ---------------------------------------------------------------------------
// WhatsApp messaging
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)] pub struct UpsertTemplateRequest { pub template_type: String, pub message_body: String, #[serde(default = "default_true")] pub is_active: bool }

async fn upsert_template(State(s): State<AppState>, Path(store_id): Path<Uuid>, Json(r): Json<UpsertTemplateRequest>) -> Result<StatusCode, (StatusCode, String)> {
    sqlx::query("INSERT INTO whatsapp_templates (id, store_id, template_type, message_body, is_active) VALUES ($1, $2, $3, $4, $5) ON CONFLICT (store_id, template_type) DO UPDATE SET message_body = $4, is_active = $5")
        .bind(Uuid::now_v7()).bind(store_id).bind(&r.template_type).bind(&r.message_body).bind(r.is_active)
        .execute(&s.db).await.map_err(internal)?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)] pub struct CreateCampaignRequest { pub name: String }

async fn create_campaign(State(s): State<AppState>, Path(store_id): Path<Uuid>, Json(r): Json<CreateCampaignRequest>) -> Result<(StatusCode, Json<CampaignRow>), (StatusCode, String)> {
    let campaign = sqlx::query_as::<_, CampaignRow>("INSERT INTO whatsapp_campaigns (id, store_id, name, created_at, updated_at) VALUES ($1, $2, $3, NOW(), NOW()) RETURNING *")
        .bind(Uuid::now_v7()).bind(store_id).bind(&r.name)
        .fetch_one(&s.db).await.map_err(internal)?;
    Ok((StatusCode::CREATED, Json(campaign)))
}

#[derive(Debug, Deserialize, Validate)]
pub struct SendMessageRequest {
    pub store_id: Uuid,
    #[validate(length(min = 5, message = "phone number too short"))]
    pub customer_phone: String,
    pub customer_name: Option<String>,
    pub message_type: String,
    pub campaign_id: Option<Uuid>,
    #[serde(default)]
    pub variables: TemplateVars,
}

/// Queue a WhatsApp notification: render the store's template, normalize the
/// destination number, insert a `pending` row. The dispatcher that talks to
/// the vendor picks the row up and fills `evolution_message_id`, which later
/// webhook receipts correlate on.
async fn send_message(State(s): State<AppState>, Json(r): Json<SendMessageRequest>) -> Result<(StatusCode, Json<MessageRow>), (StatusCode, String)> {
    r.validate().map_err(|e| (StatusCode::UNPROCESSABLE_ENTITY, e.to_string()))?;

    let body = if r.message_type == "manual" || r.message_type == "campaign" {
        r.variables.custom_message.clone().unwrap_or_default()
    } else {
        let template: (String,) = sqlx::query_as("SELECT message_body FROM whatsapp_templates WHERE store_id = $1 AND template_type = $2 AND is_active = TRUE")
            .bind(r.store_id).bind(&r.message_type)
            .fetch_optional(&s.db).await.map_err(internal)?
            .ok_or((StatusCode::NOT_FOUND, "Message template not found".to_string()))?;
        template::render(&template.0, &r.variables, r.customer_name.as_deref())
    };

    let message = sqlx::query_as::<_, MessageRow>("INSERT INTO whatsapp_messages (id, store_id, campaign_id, customer_phone, message_type, message_body, status, created_at) VALUES ($1, $2, $3, $4, $5, $6, 'pending', NOW()) RETURNING *")
        .bind(Uuid::now_v7()).bind(r.store_id).bind(r.campaign_id)
        .bind(phone::normalize(&r.customer_phone)).bind(&r.message_type).bind(&body)
        .fetch_one(&s.db).await.map_err(internal)?;
    Ok((StatusCode::CREATED, Json(message)))
}

/// Vendor delivery-receipt callback.
///
/// Only a payload that fails to parse is an error (500). Everything past
/// parsing acknowledges with `{"received": true}`: the vendor retries on
/// failure and only needs receipt confirmation, so unknown events, unknown
/// message ids and persistence failures are logged server-side instead of
/// surfacing.
async fn whatsapp_webhook(State(s): State<AppState>, body: String) -> Result<Json<serde_json::Value>, (StatusCode, String)> {
    let event: WebhookEvent = serde_json::from_str(&body).map_err(|e| {
        tracing::error!("whatsapp webhook: unparseable payload: {e}");
        internal(e)
    })?;
    let ack = Json(serde_json::json!({"received": true}));

    let Some(message_id) = event.message_id() else {
        tracing::debug!("whatsapp webhook: event without message id, skipping");
        return Ok(ack);
    };
    let Some(change) = reduce(&event, Utc::now()) else {
        tracing::debug!("whatsapp webhook: unhandled event for message {message_id}");
        return Ok(ack);
    };

    match apply_status_change(&s, message_id, &change).await {
        Ok(Some(campaign_id)) => {
            tracing::info!("whatsapp webhook: message {message_id} -> {}", change.status.as_str());
            publish_event(&s, &PlatformEvent::MessageStatusChanged {
                evolution_message_id: message_id.to_string(),
                status: change.status,
                campaign_id,
            }).await;
            if let (Some(campaign_id), Some(column)) = (campaign_id, change.status.campaign_stat_column()) {
                if let Err(e) = bump_campaign_counter(&s, campaign_id, column).await {
                    // Counter drift is accepted; the message row is already correct.
                    tracing::error!("whatsapp webhook: campaign {campaign_id} counter bump failed: {e}");
                }
            }
        }
        // Either no row matches the correlation id (message not tracked
        // locally) or the row already reached this status or a later one
        // (duplicate/out-of-order vendor event). Both are no-ops.
        Ok(None) => tracing::debug!("whatsapp webhook: no applicable message for {message_id}"),
        Err(e) => tracing::error!("whatsapp webhook: failed updating message {message_id}: {e}"),
    }
    Ok(ack)
}

/// Conditional update keyed on the vendor correlation id.
///
/// The `status = ANY(admissible)` predicate enforces the forward-only state
/// machine at the database, making at-least-once webhook delivery safe under
/// concurrent invocations. Returns the message's campaign id when a row was
/// actually transitioned, `None` when nothing applied.
async fn apply_status_change(s: &AppState, message_id: &str, change: &StatusChange) -> sqlx::Result<Option<Option<Uuid>>> {
    let admissible: Vec<String> = change.status.admissible_from().iter().map(|st| st.as_str().to_string()).collect();
    let row: Option<(Option<Uuid>,)> = match change.status {
        MessageStatus::Sent => {
            sqlx::query_as("UPDATE whatsapp_messages SET status = 'sent', sent_at = $2 WHERE evolution_message_id = $1 AND status = ANY($3) RETURNING campaign_id")
                .bind(message_id).bind(change.sent_at).bind(&admissible)
                .fetch_optional(&s.db).await?
        }
        MessageStatus::Delivered => {
            sqlx::query_as("UPDATE whatsapp_messages SET status = 'delivered', delivered_at = $2 WHERE evolution_message_id = $1 AND status = ANY($3) RETURNING campaign_id")
                .bind(message_id).bind(change.delivered_at).bind(&admissible)
                .fetch_optional(&s.db).await?
        }
        MessageStatus::Read => {
            sqlx::query_as("UPDATE whatsapp_messages SET status = 'read', read_at = $2 WHERE evolution_message_id = $1 AND status = ANY($3) RETURNING campaign_id")
                .bind(message_id).bind(change.read_at).bind(&admissible)
                .fetch_optional(&s.db).await?
        }
        MessageStatus::Failed => {
            sqlx::query_as("UPDATE whatsapp_messages SET status = 'failed', error_message = $2 WHERE evolution_message_id = $1 AND status = ANY($3) RETURNING campaign_id")
                .bind(message_id).bind(&change.error_message).bind(&admissible)
                .fetch_optional(&s.db).await?
        }
        // The reducer never asks to move a message back to pending.
        MessageStatus::Pending => None,
    };
    Ok(row.map(|(campaign_id,)| campaign_id))
}

/// Single atomic increment against the campaign aggregate. Never a
/// read-modify-write: concurrent webhook invocations for the same campaign
/// must not lose updates.
async fn bump_campaign_counter(s: &AppState, campaign_id: Uuid, column: &'static str) -> sqlx::Result<()> {
    let sql = format!("UPDATE whatsapp_campaigns SET {column} = {column} + 1, updated_at = NOW() WHERE id = $1");
    sqlx::query(&sql).bind(campaign_id).execute(&s.db).await?;
    Ok(())
}
