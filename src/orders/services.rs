use lazy_static::lazy_static;
use regex::Regex;
use time::Date;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::AppError;
use crate::events::CafeEvent;
use crate::ratings::update_item_rating;
use crate::rights::ledger::{check_order_rights_tx, update_order_rights, Placement};
use crate::state::AppState;

use super::dto::{CompletionSummary, NewOrderNotice, OrderReadyNotice, PlaceOrderRequest, PlacedOrder};
use super::repo::{self, archive_tx, get_active_tx, insert_active_tx};
use super::repo_types::{ActiveOrder, CompletedOrder};
use super::sequencer::next_order_number_tx;

/// Strips common separators and checks what is left looks like a phone number.
pub fn validate_phone(raw: &str) -> Result<String, AppError> {
    lazy_static! {
        static ref PHONE_RE: Regex = Regex::new(r"^\+?[0-9]{7,15}$").unwrap();
    }
    let phone: String = raw
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '(' | ')'))
        .collect();
    if phone.is_empty() {
        return Err(AppError::Validation("phone is required".into()));
    }
    if !PHONE_RE.is_match(&phone) {
        return Err(AppError::Validation("phone is invalid".into()));
    }
    Ok(phone)
}

fn required(field: &str, value: &str) -> Result<String, AppError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::Validation(format!("{field} is required")));
    }
    Ok(value.to_string())
}

/// Places an order if the customer still has a right for the current window.
///
/// The rights check, the order number and every write happen in one store
/// transaction, so two requests for the same phone or device cannot both
/// pass the check and numbers never repeat within a day.
pub async fn place_order(state: &AppState, req: PlaceOrderRequest) -> Result<PlacedOrder, AppError> {
    let phone = validate_phone(&req.phone)?;
    let guest_name = required("guestName", &req.guest_name)?;
    let device_id = required("deviceId", &req.device_id)?;
    let item = required("item", &req.item)?;
    let rating = req
        .rating
        .filter(|r| (1..=5).contains(r))
        .map(|r| r as u8);

    if !state.cafe.is_open().await {
        return Err(AppError::CafeClosed);
    }
    if !state.cafe.is_available(&item).await {
        return Err(AppError::OutOfStock(item));
    }

    let clock = &state.clock;
    let mut tx = state.store.begin().await?;

    let decision =
        check_order_rights_tx(tx.as_mut(), clock, state.config.locale, &phone, &device_id).await?;
    let Some(slot) = decision.granted_slot() else {
        info!(%phone, %device_id, reason = %decision.reason, "order refused");
        return Err(AppError::RightsDenied(decision.reason));
    };

    let today = clock.today();
    let now = clock.now_utc();
    let order_number = next_order_number_tx(tx.as_mut(), today, now).await?;
    let order = ActiveOrder {
        order_id: Uuid::new_v4().to_string(),
        order_number,
        guest_name,
        phone,
        device_id,
        device_info: req.device_info,
        item,
        slot,
        rating,
        push_token: req.push_token.filter(|t| !t.trim().is_empty()),
        created_at: now,
        date: today,
    };
    insert_active_tx(tx.as_mut(), &order).await?;
    update_order_rights(
        tx.as_mut(),
        clock,
        &order.phone,
        &order.device_id,
        &Placement {
            guest_name: &order.guest_name,
            order_number,
            order_id: &order.order_id,
            slot,
            device_info: &order.device_info,
        },
    )
    .await?;
    tx.commit().await?;

    if let Some(rating) = rating {
        if let Err(e) = update_item_rating(state.store.as_ref(), clock, &order.item, rating).await {
            warn!(error = %e, item = %order.item, "rating not recorded");
        }
    }

    info!(
        order_id = %order.order_id,
        order_number,
        slot = %slot,
        item = %order.item,
        "order placed"
    );
    state.events.publish(CafeEvent::NewOrder(NewOrderNotice {
        id: order.order_id.clone(),
        order_number,
        guest_name: order.guest_name.clone(),
        phone: order.phone.clone(),
        item: order.item.clone(),
        slot,
        created_at: now,
    }));

    Ok(PlacedOrder {
        order_id: order.order_id,
        order_number,
        slot,
    })
}

/// Hands an order over: archives it under the day it was placed, removes it
/// from the queue and puts it on the pickup screen.
pub async fn complete_order(state: &AppState, order_id: &str) -> Result<CompletionSummary, AppError> {
    let mut tx = state.store.begin().await?;
    let Some(order) = get_active_tx(tx.as_mut(), order_id).await? else {
        return Err(AppError::NotFound(format!("order {order_id} not found")));
    };
    let done = CompletedOrder {
        order,
        completed_at: state.clock.now_utc(),
    };
    archive_tx(tx.as_mut(), &done).await?;
    tx.commit().await?;

    let order = done.order;
    info!(order_id, order_number = order.order_number, "order completed");
    let ready = OrderReadyNotice {
        id: order.order_id.clone(),
        order_number: order.order_number,
        guest_name: order.guest_name.clone(),
        item: order.item.clone(),
    };
    state.board.post(ready.clone()).await;
    state.events.publish(CafeEvent::OrderReady(ready));

    Ok(CompletionSummary {
        order_number: order.order_number,
        item: order.item,
        guest_name: order.guest_name,
        rating: order.rating,
        push_token: order.push_token,
    })
}

/// Today's queue unless `date` says otherwise.
pub async fn get_active_orders(state: &AppState, date: Option<Date>) -> Result<Vec<ActiveOrder>, AppError> {
    let date = date.unwrap_or_else(|| state.clock.today());
    Ok(repo::list_active(state.store.as_ref(), date).await?)
}

pub async fn get_completed_orders(
    state: &AppState,
    date: Option<Date>,
) -> Result<Vec<CompletedOrder>, AppError> {
    let date = date.unwrap_or_else(|| state.clock.today());
    Ok(repo::list_completed(state.store.as_ref(), date).await?)
}
