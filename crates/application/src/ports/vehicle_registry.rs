//! Vehicle registry port
//!
//! Read access to the drivers' vehicle records, which are owned and approved
//! elsewhere.

use async_trait::async_trait;
use domain::{
    entities::Vehicle,
    value_objects::{UserId, VehicleId},
};
#[cfg(test)]
use mockall::automock;

use crate::error::ApplicationError;

/// Port for vehicle lookups
#[cfg_attr(test, automock)]
#[async_trait]
pub trait VehicleRegistry: Send + Sync {
    /// An approved vehicle owned by the driver, if any
    async fn find_approved_for_owner(
        &self,
        owner_id: &UserId,
    ) -> Result<Option<Vehicle>, ApplicationError>;

    /// Any vehicle owned by the driver, regardless of approval status
    async fn find_any_for_owner(
        &self,
        owner_id: &UserId,
    ) -> Result<Option<Vehicle>, ApplicationError>;

    /// A vehicle by ID
    async fn find_by_id(&self, id: &VehicleId) -> Result<Option<Vehicle>, ApplicationError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trait_is_send_sync() {
        fn assert_send_sync<T: Send + Sync + ?Sized>() {}
        assert_send_sync::<dyn VehicleRegistry>();
    }
}
