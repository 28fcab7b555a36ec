//! City-wide and per-store rollups.
//!
//! # Authorization
//!
//! | View | Allowed |
//! |---|---|
//! | City stats, store rollup, store list | `city_admin` |
//! | One store's stats or traffic | `city_admin`, owning `store_owner` |
//!
//! Everyone else gets `ServiceError::Forbidden` and no data.

use std::collections::HashSet;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::instrument;

use energy_plus_core::{Role, StoreId, UserId};

use super::stats::totals_by_user;
use super::{Caller, ServiceError};
use crate::db::RecordStore;
use crate::models::{Store, StoreTraffic, User, Walk};

/// Maximum number of entries in [`CityStats::top_walkers`].
pub const TOP_WALKERS_LIMIT: usize = 10;

// =============================================================================
// Authorization Gate
// =============================================================================

/// Allow city-wide views.
///
/// # Errors
///
/// Returns `ServiceError::Forbidden` unless the caller is a city admin.
pub fn authorize_city_view(caller: &Caller) -> Result<(), ServiceError> {
    match caller.role {
        Role::CityAdmin => Ok(()),
        Role::Citizen | Role::StoreOwner => Err(ServiceError::forbidden()),
    }
}

/// Allow views of a single store.
///
/// # Errors
///
/// Returns `ServiceError::Forbidden` unless the caller is a city admin or
/// the store's owner.
pub fn authorize_store_view(caller: &Caller, store: &Store) -> Result<(), ServiceError> {
    match caller.role {
        Role::CityAdmin => Ok(()),
        Role::StoreOwner if store.owner_user_id == caller.id => Ok(()),
        Role::StoreOwner | Role::Citizen => Err(ServiceError::forbidden()),
    }
}

// =============================================================================
// City Stats
// =============================================================================

/// City-wide walking statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CityStats {
    pub total_energy: f64,
    pub total_users: usize,
    /// Distinct users with at least one walk.
    pub active_users: usize,
    pub top_walkers: Vec<TopWalker>,
}

/// A row of the city's top walkers list.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopWalker {
    pub id: UserId,
    pub name: String,
    pub total_walks: u64,
    pub total_distance: f64,
    pub total_energy: f64,
}

/// Compute city statistics from every user and walk.
#[must_use]
pub fn city_stats(users: &[User], walks: &[Walk]) -> CityStats {
    let total_energy = walks.iter().map(|w| w.energy).sum();
    let active_users = walks
        .iter()
        .map(|w| w.user_id)
        .collect::<HashSet<_>>()
        .len();

    let totals = totals_by_user(walks);
    let mut top_walkers: Vec<TopWalker> = users
        .iter()
        .filter_map(|u| {
            let t = totals.get(&u.id)?;
            (t.total_distance > 0.0).then(|| TopWalker {
                id: u.id,
                name: u.display_name.clone(),
                total_walks: t.total_walks,
                total_distance: t.total_distance,
                total_energy: t.total_energy,
            })
        })
        .collect();

    top_walkers.sort_by(|a, b| {
        b.total_distance
            .total_cmp(&a.total_distance)
            .then_with(|| a.id.cmp(&b.id))
    });
    top_walkers.truncate(TOP_WALKERS_LIMIT);

    CityStats {
        total_energy,
        total_users: users.len(),
        active_users,
        top_walkers,
    }
}

// =============================================================================
// Store Stats
// =============================================================================

/// Traffic totals for one store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreStats {
    pub total_pedestrians: i64,
    pub total_energy: f64,
    pub today_pedestrians: i32,
    pub today_energy: f64,
}

/// Compute traffic totals for one store's snapshots.
///
/// The "today" figures come from the latest snapshot dated `today`. When
/// none is dated `today`, the latest snapshot overall is used instead.
#[must_use]
pub fn store_stats(traffic: &[StoreTraffic], today: NaiveDate) -> StoreStats {
    let latest = traffic
        .iter()
        .filter(|t| t.date == today)
        .max_by_key(|t| t.id)
        .or_else(|| traffic.iter().max_by_key(|t| t.id));

    StoreStats {
        total_pedestrians: traffic.iter().map(|t| i64::from(t.pedestrians)).sum(),
        total_energy: traffic.iter().map(|t| t.energy_generated).sum(),
        today_pedestrians: latest.map_or(0, |t| t.pedestrians),
        today_energy: latest.map_or(0.0, |t| t.energy_generated),
    }
}

// =============================================================================
// Store Rollup
// =============================================================================

/// Totals across all stores.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreRollup {
    pub total_kinetic_floors: i64,
    pub total_led_totems: i64,
    pub total_store_energy: f64,
    pub total_foot_traffic: i64,
    /// Store with the highest daily foot traffic; earliest id wins ties.
    pub peak_traffic_store: Option<Store>,
}

/// Roll up every store's installation and traffic figures.
#[must_use]
pub fn store_rollup(stores: &[Store]) -> StoreRollup {
    let peak = stores.iter().fold(None::<&Store>, |best, s| match best {
        Some(b)
            if b.daily_foot_traffic > s.daily_foot_traffic
                || (b.daily_foot_traffic == s.daily_foot_traffic && b.id < s.id) =>
        {
            Some(b)
        }
        _ => Some(s),
    });

    StoreRollup {
        total_kinetic_floors: stores.iter().map(|s| i64::from(s.kinetic_floors)).sum(),
        total_led_totems: stores.iter().map(|s| i64::from(s.led_totems)).sum(),
        total_store_energy: stores.iter().map(|s| s.energy_today).sum(),
        total_foot_traffic: stores
            .iter()
            .map(|s| i64::from(s.daily_foot_traffic))
            .sum(),
        peak_traffic_store: peak.cloned(),
    }
}

// =============================================================================
// Service
// =============================================================================

/// City dashboard service.
pub struct CityService<'a> {
    store: &'a dyn RecordStore,
}

impl<'a> CityService<'a> {
    #[must_use]
    pub const fn new(store: &'a dyn RecordStore) -> Self {
        Self { store }
    }

    /// City-wide walking statistics.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Forbidden` unless the caller is a city admin.
    #[instrument(skip(self), fields(caller_id = %caller.id))]
    pub async fn city_stats(&self, caller: &Caller) -> Result<CityStats, ServiceError> {
        authorize_city_view(caller)?;

        let users = self.store.list_users().await?;
        let walks = self.store.list_walks().await?;
        Ok(city_stats(&users, &walks))
    }

    /// Rollup across all stores.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Forbidden` unless the caller is a city admin.
    #[instrument(skip(self), fields(caller_id = %caller.id))]
    pub async fn store_rollup(&self, caller: &Caller) -> Result<StoreRollup, ServiceError> {
        authorize_city_view(caller)?;

        let stores = self.store.list_stores().await?;
        Ok(store_rollup(&stores))
    }

    /// Traffic totals for one store, with "today" taken as `today`.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the store doesn't exist and
    /// `ServiceError::Forbidden` if the caller may not view it.
    #[instrument(skip(self), fields(caller_id = %caller.id, store_id = %store_id))]
    pub async fn store_stats(
        &self,
        caller: &Caller,
        store_id: StoreId,
        today: NaiveDate,
    ) -> Result<StoreStats, ServiceError> {
        let store = self
            .store
            .get_store(store_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Store"))?;

        authorize_store_view(caller, &store)?;

        let traffic = self.store.list_store_traffic(store_id).await?;
        Ok(store_stats(&traffic, today))
    }
}
