//! Store management and traffic recording.

use chrono::NaiveDate;
use serde::Deserialize;
use tracing::instrument;

use energy_plus_core::{Role, StoreId, Username};

use super::city::{authorize_city_view, authorize_store_view};
use super::{Caller, ServiceError};
use crate::db::RecordStore;
use crate::models::{NewStore, NewStoreTraffic, Store, StoreTraffic};

const MAX_NAME_LENGTH: usize = 120;

/// Upper bound for daily counts (pedestrians, foot traffic, installations).
const MAX_DAILY_COUNT: i32 = 1_000_000;

/// Upper bound for one day's energy figure, in watt-hours.
const MAX_DAILY_ENERGY_WH: f64 = 100_000_000.0;

/// Input for creating a store.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateStoreInput {
    /// Username of the `store_owner` who will own the store.
    pub owner_username: String,
    pub name: String,
    pub location: String,
    #[serde(default)]
    pub kinetic_floors: i32,
    #[serde(default)]
    pub led_totems: i32,
    #[serde(default)]
    pub energy_today: f64,
    #[serde(default)]
    pub daily_foot_traffic: i32,
}

/// Input for recording a traffic snapshot.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordTrafficInput {
    pub pedestrians: i32,
    pub energy_generated: f64,
    /// Defaults to today.
    pub date: Option<NaiveDate>,
}

fn required_text(value: &str, field: &str) -> Result<String, ServiceError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ServiceError::Validation(format!("{field} is required")));
    }
    if value.chars().count() > MAX_NAME_LENGTH {
        return Err(ServiceError::Validation(format!(
            "{field} must be at most {MAX_NAME_LENGTH} characters"
        )));
    }
    Ok(value.to_owned())
}

fn non_negative_count(value: i32, field: &str) -> Result<i32, ServiceError> {
    if value < 0 {
        return Err(ServiceError::Validation(format!(
            "{field} must not be negative"
        )));
    }
    if value > MAX_DAILY_COUNT {
        return Err(ServiceError::Validation(format!(
            "{field} must be at most {MAX_DAILY_COUNT}"
        )));
    }
    Ok(value)
}

fn non_negative_energy(value: f64, field: &str) -> Result<f64, ServiceError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ServiceError::Validation(format!(
            "{field} must be a non-negative number"
        )));
    }
    if value > MAX_DAILY_ENERGY_WH {
        return Err(ServiceError::Validation(format!(
            "{field} must be at most {MAX_DAILY_ENERGY_WH} Wh"
        )));
    }
    Ok(value)
}

/// Store service.
pub struct StoreService<'a> {
    store: &'a dyn RecordStore,
}

impl<'a> StoreService<'a> {
    #[must_use]
    pub const fn new(store: &'a dyn RecordStore) -> Self {
        Self { store }
    }

    /// Create a store for an existing store owner.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Forbidden` unless the caller is a city admin,
    /// `ServiceError::Validation` for bad input or an owner without the
    /// `store_owner` role, `ServiceError::NotFound` if the owner doesn't exist
    /// and `ServiceError::Conflict` if the owner already has a store.
    #[instrument(skip(self, input), fields(caller_id = %caller.id))]
    pub async fn create_store(
        &self,
        caller: &Caller,
        input: CreateStoreInput,
    ) -> Result<Store, ServiceError> {
        authorize_city_view(caller)?;

        let name = required_text(&input.name, "Name")?;
        let location = required_text(&input.location, "Location")?;
        let kinetic_floors = non_negative_count(input.kinetic_floors, "Kinetic floors")?;
        let led_totems = non_negative_count(input.led_totems, "LED totems")?;
        let energy_today = non_negative_energy(input.energy_today, "Energy today")?;
        let daily_foot_traffic =
            non_negative_count(input.daily_foot_traffic, "Daily foot traffic")?;

        let username = Username::parse(&input.owner_username)
            .map_err(|e| ServiceError::Validation(e.to_string()))?;
        let owner = self
            .store
            .get_user_by_username(&username)
            .await?
            .ok_or_else(|| ServiceError::not_found("Owner"))?;

        match owner.role {
            Role::StoreOwner => {}
            Role::Citizen | Role::CityAdmin => {
                return Err(ServiceError::Validation(
                    "Owner must have the store_owner role".to_owned(),
                ));
            }
        }

        let store = self
            .store
            .create_store(NewStore {
                owner_user_id: owner.id,
                name,
                location,
                kinetic_floors,
                led_totems,
                energy_today,
                daily_foot_traffic,
            })
            .await
            .map_err(|e| ServiceError::from_write(e, "Owner"))?;

        tracing::info!(store_id = %store.id, owner_id = %owner.id, "Store created");

        Ok(store)
    }

    /// The caller's own store.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Forbidden` unless the caller is a store owner
    /// and `ServiceError::NotFound` if no store is assigned to them yet.
    #[instrument(skip(self), fields(caller_id = %caller.id))]
    pub async fn my_store(&self, caller: &Caller) -> Result<Store, ServiceError> {
        match caller.role {
            Role::StoreOwner => {}
            Role::Citizen | Role::CityAdmin => return Err(ServiceError::forbidden()),
        }

        self.store
            .get_store_by_owner(caller.id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Store"))
    }

    /// Every store.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Forbidden` unless the caller is a city admin.
    #[instrument(skip(self), fields(caller_id = %caller.id))]
    pub async fn list_stores(&self, caller: &Caller) -> Result<Vec<Store>, ServiceError> {
        authorize_city_view(caller)?;
        Ok(self.store.list_stores().await?)
    }

    /// Record a traffic snapshot for a store.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the store doesn't exist,
    /// `ServiceError::Forbidden` if the caller may not manage it and
    /// `ServiceError::Validation` for negative figures.
    #[instrument(skip(self, input), fields(caller_id = %caller.id, store_id = %store_id))]
    pub async fn record_traffic(
        &self,
        caller: &Caller,
        store_id: StoreId,
        input: RecordTrafficInput,
        today: NaiveDate,
    ) -> Result<StoreTraffic, ServiceError> {
        let store = self
            .store
            .get_store(store_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Store"))?;

        authorize_store_view(caller, &store)?;

        let pedestrians = non_negative_count(input.pedestrians, "Pedestrians")?;
        let energy_generated = non_negative_energy(input.energy_generated, "Energy generated")?;

        let traffic = self
            .store
            .create_store_traffic(NewStoreTraffic {
                store_id,
                pedestrians,
                energy_generated,
                date: input.date.unwrap_or(today),
            })
            .await
            .map_err(|e| ServiceError::from_write(e, "Store"))?;

        tracing::info!(traffic_id = %traffic.id, "Store traffic recorded");

        Ok(traffic)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use energy_plus_core::UserId;

    use super::*;
    use crate::db::MemoryRecordStore;
    use crate::services::test_support::user;

    fn input(owner: &str) -> CreateStoreInput {
        CreateStoreInput {
            owner_username: owner.to_owned(),
            name: "Café Central".to_owned(),
            location: "Rua Augusta, 100".to_owned(),
            kinetic_floors: 6,
            led_totems: 3,
            energy_today: 0.0,
            daily_foot_traffic: 0,
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
    }

    #[tokio::test]
    async fn test_create_store_as_admin() {
        let store = MemoryRecordStore::new();
        let admin = user(&store, "admin", Role::CityAdmin).await;
        let owner = user(&store, "owner", Role::StoreOwner).await;
        let caller = Caller::new(admin.id, Role::CityAdmin);

        let created = StoreService::new(&store)
            .create_store(&caller, input("owner"))
            .await
            .unwrap();
        assert_eq!(created.owner_user_id, owner.id);

        let err = StoreService::new(&store)
            .create_store(&caller, input("owner"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_create_store_checks() {
        let store = MemoryRecordStore::new();
        let admin = user(&store, "admin", Role::CityAdmin).await;
        let citizen = user(&store, "citizen", Role::Citizen).await;
        let service = StoreService::new(&store);
        let as_admin = Caller::new(admin.id, Role::CityAdmin);

        let err = service
            .create_store(&Caller::new(citizen.id, Role::Citizen), input("citizen"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));

        let err = service
            .create_store(&as_admin, input("citizen"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));

        let err = service
            .create_store(&as_admin, input("ghost"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));

        let mut bad = input("citizen");
        bad.kinetic_floors = -1;
        let err = service.create_store(&as_admin, bad).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));

        let mut bad = input("citizen");
        bad.energy_today = 1e307;
        let err = service.create_store(&as_admin, bad).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));

        let mut bad = input("citizen");
        bad.daily_foot_traffic = i32::MAX;
        let err = service.create_store(&as_admin, bad).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));

        assert!(store.list_stores().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_my_store() {
        let store = MemoryRecordStore::new();
        let admin = user(&store, "admin", Role::CityAdmin).await;
        let owner = user(&store, "owner", Role::StoreOwner).await;
        let service = StoreService::new(&store);
        let as_owner = Caller::new(owner.id, Role::StoreOwner);

        let err = service.my_store(&as_owner).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));

        service
            .create_store(&Caller::new(admin.id, Role::CityAdmin), input("owner"))
            .await
            .unwrap();
        assert_eq!(service.my_store(&as_owner).await.unwrap().owner_user_id, owner.id);

        let err = service
            .my_store(&Caller::new(admin.id, Role::CityAdmin))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_record_traffic() {
        let store = MemoryRecordStore::new();
        let admin = user(&store, "admin", Role::CityAdmin).await;
        let owner = user(&store, "owner", Role::StoreOwner).await;
        let service = StoreService::new(&store);
        let shop = service
            .create_store(&Caller::new(admin.id, Role::CityAdmin), input("owner"))
            .await
            .unwrap();

        let traffic = service
            .record_traffic(
                &Caller::new(owner.id, Role::StoreOwner),
                shop.id,
                RecordTrafficInput {
                    pedestrians: 487,
                    energy_generated: 2340.0,
                    date: None,
                },
                today(),
            )
            .await
            .unwrap();
        assert_eq!(traffic.date, today());

        let err = service
            .record_traffic(
                &Caller::new(UserId::new(999), Role::StoreOwner),
                shop.id,
                RecordTrafficInput {
                    pedestrians: 1,
                    energy_generated: 1.0,
                    date: None,
                },
                today(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));

        let err = service
            .record_traffic(
                &Caller::new(owner.id, Role::StoreOwner),
                shop.id,
                RecordTrafficInput {
                    pedestrians: -5,
                    energy_generated: 1.0,
                    date: None,
                },
                today(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
        assert_eq!(store.list_store_traffic(shop.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_traffic_above_daily_bounds_is_not_stored() {
        let store = MemoryRecordStore::new();
        let admin = user(&store, "admin", Role::CityAdmin).await;
        let owner = user(&store, "owner", Role::StoreOwner).await;
        let service = StoreService::new(&store);
        let shop = service
            .create_store(&Caller::new(admin.id, Role::CityAdmin), input("owner"))
            .await
            .unwrap();
        let as_owner = Caller::new(owner.id, Role::StoreOwner);

        for (pedestrians, energy_generated) in [
            (1, 1e307),
            (1, MAX_DAILY_ENERGY_WH + 1.0),
            (MAX_DAILY_COUNT + 1, 1.0),
            (i32::MAX, 1.0),
        ] {
            let err = service
                .record_traffic(
                    &as_owner,
                    shop.id,
                    RecordTrafficInput {
                        pedestrians,
                        energy_generated,
                        date: None,
                    },
                    today(),
                )
                .await
                .unwrap_err();
            assert!(matches!(err, ServiceError::Validation(_)));
        }
        assert!(store.list_store_traffic(shop.id).await.unwrap().is_empty());

        service
            .record_traffic(
                &as_owner,
                shop.id,
                RecordTrafficInput {
                    pedestrians: MAX_DAILY_COUNT,
                    energy_generated: MAX_DAILY_ENERGY_WH,
                    date: None,
                },
                today(),
            )
            .await
            .unwrap();
    }
}
