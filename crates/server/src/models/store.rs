//! Store and store traffic domain types.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use energy_plus_core::{StoreId, StoreTrafficId, UserId};

/// A participating store. Exactly one per store owner.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Store {
    pub id: StoreId,
    /// User with role `store_owner` who owns this store.
    pub owner_user_id: UserId,
    pub name: String,
    pub location: String,
    /// Number of kinetic floor tiles installed.
    pub kinetic_floors: i32,
    /// Number of LED advertising totems installed.
    pub led_totems: i32,
    /// Watt-hours generated today, as reported on the store record.
    pub energy_today: f64,
    pub daily_foot_traffic: i32,
    pub created_at: DateTime<Utc>,
}

/// Data required to insert a store.
#[derive(Debug, Clone, PartialEq)]
pub struct NewStore {
    pub owner_user_id: UserId,
    pub name: String,
    pub location: String,
    pub kinetic_floors: i32,
    pub led_totems: i32,
    pub energy_today: f64,
    pub daily_foot_traffic: i32,
}

/// A daily traffic snapshot for a store.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreTraffic {
    /// Assigned in insertion order.
    pub id: StoreTrafficId,
    pub store_id: StoreId,
    pub pedestrians: i32,
    pub energy_generated: f64,
    /// Calendar day the snapshot describes.
    pub date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

/// Data required to insert a traffic snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct NewStoreTraffic {
    pub store_id: StoreId,
    pub pedestrians: i32,
    pub energy_generated: f64,
    pub date: NaiveDate,
}
