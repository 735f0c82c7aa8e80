//! Card economy endpoints: shop, crafting, cases and transfers.
//!
//! These are straight CRUD over `users.cards` plus weighted rolls from
//! [`crate::cards`]. The only multi-statement transaction in the whole
//! server is the two-row transfer.

use actix_web::{post, web, HttpResponse};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use sqlx::PgPool;
use std::collections::HashMap;

use crate::cards::{self, Inventory};
use crate::config::settings;
use crate::db::models::User;
use crate::error::ApiError;

async fn fetch_user(db: &PgPool, id: i64) -> Result<User, ApiError> {
    sqlx::query_as("SELECT * FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))
}

async fn save_cards_and_balance(
    db: &PgPool,
    id: i64,
    cards: &str,
    balance: i32,
) -> Result<User, ApiError> {
    let user = sqlx::query_as(
        "UPDATE users SET balance = $1, cards = $2, updated_at = CURRENT_TIMESTAMP \
         WHERE id = $3 RETURNING *",
    )
    .bind(balance)
    .bind(cards)
    .bind(id)
    .fetch_one(db)
    .await?;
    Ok(user)
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuyCardReq {
    pub card_name: String,
    pub price: i32,
}

/// POST /api/user/{id}/buy-card
#[post("/user/{id}/buy-card")]
pub async fn buy_card(
    path: web::Path<i64>,
    info: web::Json<BuyCardReq>,
    db: web::Data<PgPool>,
) -> Result<HttpResponse, ApiError> {
    if info.card_name.trim().is_empty() || info.price <= 0 {
        return Err(ApiError::validation("A card name and price are required"));
    }

    let user = fetch_user(&db, path.into_inner()).await?;
    if user.balance < info.price {
        return Err(ApiError::validation("Insufficient balance to buy this card"));
    }

    let mut inventory = Inventory::parse(&user.cards);
    inventory.add(info.card_name.trim());

    let updated = save_cards_and_balance(
        &db,
        user.id,
        &inventory.to_string(),
        user.balance - info.price,
    )
    .await?;

    log::info!("user {} bought card {}", updated.id, info.card_name);
    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "message": "Card purchased!",
        "user": updated,
        "purchasedCard": info.card_name,
    })))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SellCardReq {
    pub card_key: String,
    pub price: i32,
}

/// POST /api/user/{id}/sell-card
#[post("/user/{id}/sell-card")]
pub async fn sell_card(
    path: web::Path<i64>,
    info: web::Json<SellCardReq>,
    db: web::Data<PgPool>,
) -> Result<HttpResponse, ApiError> {
    if info.card_key.trim().is_empty() || info.price <= 0 {
        return Err(ApiError::validation("A card key and price are required"));
    }

    let user = fetch_user(&db, path.into_inner()).await?;
    let mut inventory = Inventory::parse(&user.cards);
    if !inventory.remove_one(&info.card_key) {
        return Err(ApiError::validation("You do not own this card"));
    }

    let updated = save_cards_and_balance(
        &db,
        user.id,
        &inventory.to_string(),
        user.balance + info.price,
    )
    .await?;

    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "message": "Card sold!",
        "user": updated,
        "soldCard": info.card_key,
        "earnedAmount": info.price,
    })))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CraftReq {
    pub recipe: String,
    pub selected_cards: HashMap<String, usize>,
}

/// POST /api/user/{id}/craft — burn 3 cards of a rarity for a random one
/// from its result list.
#[post("/user/{id}/craft")]
pub async fn craft(
    path: web::Path<i64>,
    info: web::Json<CraftReq>,
    db: web::Data<PgPool>,
) -> Result<HttpResponse, ApiError> {
    let recipe = cards::craft_recipe(&info.recipe)
        .ok_or_else(|| ApiError::validation("Unknown craft recipe"))?;

    let total: usize = info.selected_cards.values().sum();
    if total != recipe.required {
        return Err(ApiError::validation(format!(
            "Exactly {} cards are required",
            recipe.required
        )));
    }

    let user = fetch_user(&db, path.into_inner()).await?;
    let mut inventory = Inventory::parse(&user.cards);
    let owned = inventory.counts();

    for (card, &needed) in &info.selected_cards {
        let available = owned.get(&card.to_lowercase()).copied().unwrap_or(0);
        if available < needed {
            return Err(ApiError::validation(format!("Not enough \"{card}\" cards")));
        }
    }

    for (card, &count) in &info.selected_cards {
        for _ in 0..count {
            inventory.remove_one(card);
        }
    }

    let crafted = {
        use rand::seq::IndexedRandom;
        let mut rng = rand::rng();
        recipe.results.choose(&mut rng).copied().unwrap_or(recipe.results[0])
    };
    inventory.add(crafted);

    let updated: User = sqlx::query_as(
        "UPDATE users SET cards = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 RETURNING *",
    )
    .bind(inventory.to_string())
    .bind(user.id)
    .fetch_one(&**db)
    .await?;

    log::info!("user {} crafted {} via {}", updated.id, crafted, info.recipe);
    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "message": "Craft complete!",
        "user": updated,
        "craftedCard": crafted,
        "recipe": info.recipe,
    })))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferReq {
    pub from_user_id: i64,
    pub to_user_id: i64,
    pub card_key: String,
}

/// POST /api/user/transfer-card
///
/// Moves one card between two inventories inside a single transaction so
/// the card can never be duplicated or lost halfway.
#[post("/user/transfer-card")]
pub async fn transfer_card(
    info: web::Json<TransferReq>,
    db: web::Data<PgPool>,
) -> Result<HttpResponse, ApiError> {
    if info.card_key.trim().is_empty() {
        return Err(ApiError::validation(
            "fromUserId, toUserId and cardKey are required",
        ));
    }
    if info.from_user_id == info.to_user_id {
        return Err(ApiError::validation("You cannot transfer a card to yourself"));
    }

    let mut tx = db.begin().await?;

    let sender: User = sqlx::query_as("SELECT * FROM users WHERE id = $1 FOR UPDATE")
        .bind(info.from_user_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| ApiError::not_found("Sender not found"))?;
    let recipient: User = sqlx::query_as("SELECT * FROM users WHERE id = $1 FOR UPDATE")
        .bind(info.to_user_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| ApiError::not_found("Recipient not found"))?;

    let mut from_inventory = Inventory::parse(&sender.cards);
    if !from_inventory.remove_one(&info.card_key) {
        return Err(ApiError::validation("You do not own this card"));
    }
    let mut to_inventory = Inventory::parse(&recipient.cards);
    to_inventory.add(&info.card_key);

    sqlx::query("UPDATE users SET cards = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2")
        .bind(from_inventory.to_string())
        .bind(sender.id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("UPDATE users SET cards = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2")
        .bind(to_inventory.to_string())
        .bind(recipient.id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    log::info!(
        "card {} transferred from {} to {}",
        info.card_key,
        sender.id,
        recipient.id
    );
    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "message": "Card transferred!",
        "transferDetails": {
            "cardKey": info.card_key,
            "fromUser": sender.first_name,
            "toUser": recipient.first_name,
        },
    })))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenCaseReq {
    pub user_id: i64,
    pub case_type: String,
}

/// POST /api/case/open — paid case: weighted rarity, uniform card.
#[post("/case/open")]
pub async fn open_case(
    info: web::Json<OpenCaseReq>,
    db: web::Data<PgPool>,
) -> Result<HttpResponse, ApiError> {
    let config = cards::case_config(&info.case_type)
        .ok_or_else(|| ApiError::validation("Unknown case type"))?;

    let user = fetch_user(&db, info.user_id).await?;
    if user.balance < config.price {
        return Err(ApiError::validation("Insufficient balance to open this case"));
    }

    let (card, rarity) = {
        let mut rng = rand::rng();
        cards::roll_case(config, &mut rng)
    };

    let mut inventory = Inventory::parse(&user.cards);
    inventory.add(card);
    let new_balance = user.balance - config.price;

    let updated =
        save_cards_and_balance(&db, user.id, &inventory.to_string(), new_balance).await?;

    log::info!("user {} opened case {}: {card} ({rarity:?})", user.id, info.case_type);
    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "message": "Case opened!",
        "card": { "name": card, "rarity": rarity },
        "newBalance": new_balance,
        "user": updated,
    })))
}

/// POST /api/user/{id}/free-case — one direct weighted roll, gated by a
/// per-user cooldown stored as unix millis in `users.case_free`.
#[post("/user/{id}/free-case")]
pub async fn free_case(
    path: web::Path<i64>,
    db: web::Data<PgPool>,
) -> Result<HttpResponse, ApiError> {
    let user = fetch_user(&db, path.into_inner()).await?;

    let now_ms = Utc::now().timestamp_millis();
    if let Some(ready_at) = user.case_free {
        if now_ms < ready_at {
            let wait = (ready_at - now_ms + 999) / 1000;
            return Err(ApiError::validation(format!(
                "Next free case in {wait} seconds"
            )));
        }
    }

    let reward = {
        let mut rng = rand::rng();
        *cards::roll_drop(cards::FREE_CASE, &mut rng)
    };

    let mut inventory = Inventory::parse(&user.cards);
    inventory.add(reward.name);
    let next_ms = now_ms + settings().free_case_cooldown * 1000;
    let new_cards = inventory.to_string();

    sqlx::query(
        "UPDATE users SET cards = $1, case_free = $2, updated_at = CURRENT_TIMESTAMP \
         WHERE id = $3",
    )
    .bind(&new_cards)
    .bind(next_ms)
    .bind(user.id)
    .execute(&**db)
    .await?;

    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "card": { "name": reward.name, "rarity": reward.rarity },
        "next": next_ms,
        "next_sec": (next_ms - now_ms + 999) / 1000,
        "cards": new_cards,
    })))
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    // `transfer-card` is a literal segment under /user and must precede
    // the `{id}` captures.
    cfg.service(transfer_card)
        .service(buy_card)
        .service(sell_card)
        .service(craft)
        .service(free_case)
        .service(open_case);
}
