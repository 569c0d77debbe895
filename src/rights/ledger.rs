//! Daily order rights per phone and per device.
//!
//! A customer may order up to three times a day: the first order at any
//! hour, the second only inside 18:00-20:00 and the third only inside
//! 20:00-23:00. A device is bound to the first phone that ordered from it
//! that day.

use std::str::FromStr;

use serde::Serialize;
use time::Date;
use tracing::debug;

use crate::clock::LocalClock;
use crate::rights::repo_types::{DeviceInfo, DeviceUsage, OrderRights, RightsEntry};
use crate::rights::slots::{resolve_slot, Slot};
use crate::store::{
    self, DocRef, DocumentStore, StoreResult, Transaction, DEVICE_USAGE, ORDER_RIGHTS,
};

pub const DAILY_ORDER_LIMIT: u32 = 3;

/// Language of the reason strings shown to customers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Locale {
    #[default]
    Tr,
    En,
}

impl FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tr" => Ok(Locale::Tr),
            "en" => Ok(Locale::En),
            other => Err(format!("unsupported locale {other:?} (expected tr or en)")),
        }
    }
}

pub fn rights_doc(phone: &str) -> DocRef {
    DocRef::new(ORDER_RIGHTS, phone)
}

pub fn device_doc(device_id: &str) -> DocRef {
    DocRef::new(DEVICE_USAGE, device_id)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Allowance {
    FirstOrder,
    NewDay,
    SecondOrder,
    ThirdOrder,
}

impl Allowance {
    fn reason(self, locale: Locale) -> &'static str {
        match (locale, self) {
            (Locale::Tr, Allowance::FirstOrder) => "İlk sipariş",
            (Locale::Tr, Allowance::NewDay) => "Yeni gün - ilk sipariş",
            (Locale::Tr, Allowance::SecondOrder) => "İkinci sipariş (18:00-20:00)",
            (Locale::Tr, Allowance::ThirdOrder) => "Üçüncü sipariş (20:00-23:00)",
            (Locale::En, Allowance::FirstOrder) => "First order of the day.",
            (Locale::En, Allowance::NewDay) => "New day, first order.",
            (Locale::En, Allowance::SecondOrder) => "Second order (18:00-20:00).",
            (Locale::En, Allowance::ThirdOrder) => "Third order (20:00-23:00).",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Denial {
    DeviceBoundElsewhere,
    SecondWindowMissed,
    SecondWindowNotYet,
    ThirdWindowClosed,
    DailyLimitReached,
}

impl Denial {
    pub fn reason(self, locale: Locale) -> &'static str {
        match (locale, self) {
            (Locale::Tr, Denial::DeviceBoundElsewhere) => {
                "Bu cihaz bugün başka bir numara ile eşleşmiş. Güvenlik nedeniyle işlem yapılamaz."
            }
            (Locale::Tr, Denial::SecondWindowMissed) => {
                "Bugünlük sipariş hakkınız dolmuştur. (18:00-20:00 aralığını kaçırdınız)"
            }
            (Locale::Tr, Denial::SecondWindowNotYet) => {
                "İkinci siparişinizi 18:00-20:00 arasında verebilirsiniz."
            }
            (Locale::Tr, Denial::ThirdWindowClosed) => {
                "Üçüncü siparişinizi 20:00-23:00 arasında verebilirsiniz."
            }
            (Locale::Tr, Denial::DailyLimitReached) => {
                "Bugün maksimum sipariş sayısına ulaştınız (3 sipariş)."
            }
            (Locale::En, Denial::DeviceBoundElsewhere) => {
                "This device is already linked to another phone number today. The order cannot be placed for security reasons."
            }
            (Locale::En, Denial::SecondWindowMissed) => {
                "You have used today's order rights. (The 18:00-20:00 window has passed.)"
            }
            (Locale::En, Denial::SecondWindowNotYet) => {
                "Your second order can be placed between 18:00 and 20:00."
            }
            (Locale::En, Denial::ThirdWindowClosed) => {
                "Your third order can be placed between 20:00 and 23:00."
            }
            (Locale::En, Denial::DailyLimitReached) => "You have reached today's maximum of 3 orders.",
        }
    }

    pub fn next_slot(self) -> Option<Slot> {
        match self {
            Denial::SecondWindowNotYet => Some(Slot::Early),
            Denial::ThirdWindowClosed => Some(Slot::Late),
            Denial::DeviceBoundElsewhere | Denial::SecondWindowMissed | Denial::DailyLimitReached => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RightsDecision {
    pub can_order: bool,
    pub reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slot: Option<Slot>,
    pub order_count: u32,
    pub next_slot: Option<Slot>,
    #[serde(skip)]
    pub denial: Option<Denial>,
}

impl RightsDecision {
    fn allowed(allowance: Allowance, locale: Locale, slot: Slot, order_count: u32) -> Self {
        Self {
            can_order: true,
            reason: allowance.reason(locale).to_string(),
            slot: Some(slot),
            order_count,
            next_slot: None,
            denial: None,
        }
    }

    fn denied(denial: Denial, locale: Locale, order_count: u32) -> Self {
        Self {
            can_order: false,
            reason: denial.reason(locale).to_string(),
            slot: None,
            order_count,
            next_slot: denial.next_slot(),
            denial: Some(denial),
        }
    }

    /// The slot to book, if ordering is allowed.
    pub fn granted_slot(&self) -> Option<Slot> {
        self.slot.filter(|_| self.can_order)
    }
}

/// Decides whether `phone` may order from the device now.
pub fn evaluate(
    phone: &str,
    device: Option<&DeviceUsage>,
    rights: Option<&OrderRights>,
    today: Date,
    hour: u8,
    locale: Locale,
) -> RightsDecision {
    let todays = rights.filter(|r| r.date == today);
    let order_count = todays.map(|r| r.order_count).unwrap_or(0);
    let allow = |allowance, slot, count| RightsDecision::allowed(allowance, locale, slot, count);
    let deny = |denial, count| RightsDecision::denied(denial, locale, count);

    if let Some(usage) = device {
        if usage.date == today && usage.phone != phone {
            return deny(Denial::DeviceBoundElsewhere, order_count);
        }
    }

    if todays.is_none() {
        let allowance = if rights.is_some() {
            Allowance::NewDay
        } else {
            Allowance::FirstOrder
        };
        return allow(allowance, resolve_slot(hour), 0);
    }

    match order_count {
        n if n >= DAILY_ORDER_LIMIT => deny(Denial::DailyLimitReached, n),
        0 => allow(Allowance::FirstOrder, resolve_slot(hour), 0),
        1 => match hour {
            18..=19 => allow(Allowance::SecondOrder, Slot::Early, 1),
            h if h >= 20 => deny(Denial::SecondWindowMissed, 1),
            _ => deny(Denial::SecondWindowNotYet, 1),
        },
        n => match hour {
            20..=22 => allow(Allowance::ThirdOrder, Slot::Late, n),
            _ => deny(Denial::ThirdWindowClosed, n),
        },
    }
}

pub async fn check_order_rights(
    store: &dyn DocumentStore,
    clock: &LocalClock,
    locale: Locale,
    phone: &str,
    device_id: &str,
) -> StoreResult<RightsDecision> {
    let device: Option<DeviceUsage> = store::load(store, &device_doc(device_id)).await?;
    let rights: Option<OrderRights> = store::load(store, &rights_doc(phone)).await?;
    Ok(evaluate(
        phone,
        device.as_ref(),
        rights.as_ref(),
        clock.today(),
        clock.hour(),
        locale,
    ))
}

/// Same as [`check_order_rights`], but reads through `tx` so both records
/// stay locked until the caller commits the reservation.
pub async fn check_order_rights_tx(
    tx: &mut dyn Transaction,
    clock: &LocalClock,
    locale: Locale,
    phone: &str,
    device_id: &str,
) -> StoreResult<RightsDecision> {
    let device: Option<DeviceUsage> = store::load_tx(tx, &device_doc(device_id)).await?;
    let rights: Option<OrderRights> = store::load_tx(tx, &rights_doc(phone)).await?;
    Ok(evaluate(
        phone,
        device.as_ref(),
        rights.as_ref(),
        clock.today(),
        clock.hour(),
        locale,
    ))
}

/// What was just placed, as recorded against the customer's rights.
#[derive(Debug, Clone)]
pub struct Placement<'a> {
    pub guest_name: &'a str,
    pub order_number: u32,
    pub order_id: &'a str,
    pub slot: Slot,
    pub device_info: &'a DeviceInfo,
}

/// Consumes one right. Only valid after an allowing check in the same transaction.
pub async fn update_order_rights(
    tx: &mut dyn Transaction,
    clock: &LocalClock,
    phone: &str,
    device_id: &str,
    placement: &Placement<'_>,
) -> StoreResult<OrderRights> {
    let today = clock.today();
    let now = clock.now_utc();

    let usage = DeviceUsage {
        device_id: device_id.to_string(),
        phone: phone.to_string(),
        date: today,
        last_order_at: now,
        device_info: placement.device_info.clone(),
    };
    store::save_tx(tx, &device_doc(device_id), &usage).await?;

    let entry = RightsEntry {
        order_number: placement.order_number,
        order_id: placement.order_id.to_string(),
        placed_at: now,
        slot: placement.slot,
    };

    let doc = rights_doc(phone);
    let existing: Option<OrderRights> = store::load_tx(tx, &doc).await?;
    let rights = match existing.filter(|r| r.date == today) {
        Some(mut rights) => {
            rights.orders.push(entry);
            rights.order_count += 1;
            rights.device_id = device_id.to_string();
            rights.device_info = placement.device_info.clone();
            rights.last_order_at = now;
            rights
        }
        None => OrderRights {
            phone: phone.to_string(),
            guest_name: Some(placement.guest_name.to_string()),
            date: today,
            order_count: 1,
            orders: vec![entry],
            device_id: device_id.to_string(),
            device_info: placement.device_info.clone(),
            last_order_at: now,
        },
    };
    store::save_tx(tx, &doc, &rights).await?;

    debug!(%phone, %device_id, order_count = rights.order_count, "order rights updated");
    Ok(rights)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use time::macros::{date, datetime, offset};

    use crate::clock::ManualTime;
    use crate::store::memory::MemoryStore;

    const TODAY: Date = date!(2025 - 01 - 16);

    fn rights_with(count: u32, date: Date) -> OrderRights {
        OrderRights {
            phone: "5551112233".into(),
            guest_name: Some("Ayla".into()),
            date,
            order_count: count,
            orders: vec![],
            device_id: "dev-1".into(),
            device_info: DeviceInfo::default(),
            last_order_at: datetime!(2025-01-16 09:00 UTC),
        }
    }

    fn usage(phone: &str, date: Date) -> DeviceUsage {
        DeviceUsage {
            device_id: "dev-1".into(),
            phone: phone.into(),
            date,
            last_order_at: datetime!(2025-01-16 09:00 UTC),
            device_info: DeviceInfo::default(),
        }
    }

    #[test]
    fn fresh_customer_may_always_order() {
        for hour in 0..24u8 {
            let d = evaluate("5551112233", None, None, TODAY, hour, Locale::En);
            assert!(d.can_order, "hour {hour}");
            assert_eq!(d.slot, Some(resolve_slot(hour)));
            assert_eq!(d.order_count, 0);
        }
    }

    #[test]
    fn stale_record_counts_as_new_day() {
        let old = rights_with(3, date!(2025 - 01 - 15));
        let d = evaluate("5551112233", None, Some(&old), TODAY, 10, Locale::En);
        assert!(d.can_order);
        assert_eq!(d.reason, Allowance::NewDay.reason(Locale::En));
        assert_eq!(d.order_count, 0);
    }

    #[test]
    fn second_order_only_inside_early_window() {
        let r = rights_with(1, TODAY);
        for hour in 0..24u8 {
            let d = evaluate("5551112233", None, Some(&r), TODAY, hour, Locale::En);
            assert_eq!(d.can_order, (18..20).contains(&hour), "hour {hour}");
        }
        let before = evaluate("5551112233", None, Some(&r), TODAY, 12, Locale::En);
        assert_eq!(before.denial, Some(Denial::SecondWindowNotYet));
        assert_eq!(before.next_slot, Some(Slot::Early));

        let after = evaluate("5551112233", None, Some(&r), TODAY, 20, Locale::En);
        assert_eq!(after.denial, Some(Denial::SecondWindowMissed));
        assert_eq!(after.next_slot, None);

        let inside = evaluate("5551112233", None, Some(&r), TODAY, 18, Locale::En);
        assert_eq!(inside.granted_slot(), Some(Slot::Early));
    }

    #[test]
    fn third_order_only_inside_late_window() {
        let r = rights_with(2, TODAY);
        for hour in 0..24u8 {
            let d = evaluate("5551112233", None, Some(&r), TODAY, hour, Locale::En);
            assert_eq!(d.can_order, (20..23).contains(&hour), "hour {hour}");
            if !d.can_order {
                assert_eq!(d.next_slot, Some(Slot::Late));
            }
        }
        let d = evaluate("5551112233", None, Some(&r), TODAY, 21, Locale::En);
        assert_eq!(d.granted_slot(), Some(Slot::Late));
    }

    #[test]
    fn fourth_order_never_allowed() {
        for count in [DAILY_ORDER_LIMIT, DAILY_ORDER_LIMIT + 1, 7] {
            let r = rights_with(count, TODAY);
            for hour in 0..24u8 {
                let d = evaluate("5551112233", None, Some(&r), TODAY, hour, Locale::En);
                assert!(!d.can_order);
                assert_eq!(d.denial, Some(Denial::DailyLimitReached));
                assert_eq!(d.next_slot, None);
            }
        }
    }

    #[test]
    fn device_bound_to_other_phone_today_is_rejected() {
        let bound = usage("5550000000", TODAY);
        for count in 0..4 {
            let r = rights_with(count, TODAY);
            let d = evaluate("5551112233", Some(&bound), Some(&r), TODAY, 21, Locale::En);
            assert!(!d.can_order);
            assert_eq!(d.denial, Some(Denial::DeviceBoundElsewhere));
            assert_eq!(d.slot, None);
        }
        let same_phone = usage("5551112233", TODAY);
        assert!(evaluate("5551112233", Some(&same_phone), None, TODAY, 9, Locale::En).can_order);

        let yesterday = usage("5550000000", date!(2025 - 01 - 15));
        assert!(evaluate("5551112233", Some(&yesterday), None, TODAY, 9, Locale::En).can_order);
    }

    #[test]
    fn decision_serializes_for_clients() {
        let d = evaluate("5551112233", None, Some(&rights_with(1, TODAY)), TODAY, 10, Locale::En);
        let json = serde_json::to_value(&d).unwrap();
        assert_eq!(json["canOrder"], false);
        assert_eq!(json["nextSlot"], "18:00-20:00");
        assert!(json.get("slot").is_none());
        assert!(json.get("denial").is_none());
    }

    #[test]
    fn reasons_follow_the_configured_locale() {
        let r = rights_with(1, TODAY);
        let tr = evaluate("5551112233", None, Some(&r), TODAY, 12, Locale::Tr);
        let en = evaluate("5551112233", None, Some(&r), TODAY, 12, Locale::En);
        assert_eq!(tr.reason, "İkinci siparişinizi 18:00-20:00 arasında verebilirsiniz.");
        assert_eq!(en.reason, "Your second order can be placed between 18:00 and 20:00.");
        assert_eq!(tr.denial, en.denial);
        assert_eq!(tr.next_slot, en.next_slot);

        assert_eq!("EN".parse::<Locale>().unwrap(), Locale::En);
        assert_eq!(Locale::default(), Locale::Tr);
        assert!("de".parse::<Locale>().is_err());
    }

    #[tokio::test]
    async fn update_creates_then_appends() {
        let store = MemoryStore::new();
        let source = Arc::new(ManualTime::local(TODAY, 10, offset!(+3)));
        let clock = LocalClock::with_source(source.clone(), offset!(+3));
        let info = DeviceInfo {
            os: Some("Android".into()),
            ..DeviceInfo::default()
        };

        let mut tx = store.begin().await.unwrap();
        let placement = Placement {
            guest_name: "Ayla",
            order_number: 1,
            order_id: "o-1",
            slot: Slot::Open,
            device_info: &info,
        };
        let first = update_order_rights(&mut *tx, &clock, "5551112233", "dev-1", &placement)
            .await
            .unwrap();
        tx.commit().await.unwrap();
        assert_eq!(first.order_count, 1);

        source.set_local_hour(18, offset!(+3));
        let mut tx = store.begin().await.unwrap();
        let placement = Placement {
            order_number: 7,
            order_id: "o-7",
            slot: Slot::Early,
            ..placement
        };
        update_order_rights(&mut *tx, &clock, "5551112233", "dev-1", &placement)
            .await
            .unwrap();
        tx.commit().await.unwrap();

        let rights: OrderRights = store::load(&store, &rights_doc("5551112233"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(rights.order_count, 2);
        assert_eq!(rights.orders.len(), 2);
        assert_eq!(rights.orders[1].order_number, 7);
        assert_eq!(rights.orders[1].slot, Slot::Early);

        let device: DeviceUsage = store::load(&store, &device_doc("dev-1"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(device.phone, "5551112233");
        assert_eq!(device.date, TODAY);

        let stored = store.get(&device_doc("dev-1")).await.unwrap().unwrap();
        assert_eq!(stored["deviceInfo"], serde_json::json!({"os": "Android"}));

        let decision = check_order_rights(&store, &clock, Locale::En, "5551112233", "dev-1")
            .await
            .unwrap();
        assert_eq!(decision.order_count, 2);
        assert_eq!(decision.denial, Some(Denial::ThirdWindowClosed));
    }
}
