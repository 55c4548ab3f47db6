use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

/// The service a booking was made for. Stored on the booking itself and used
/// to decide which provider role is allowed to join its tracking session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ServiceType {
    Driver,
    Caretaker,
    Shuttle,
}

impl ServiceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceType::Driver => "driver",
            ServiceType::Caretaker => "caretaker",
            ServiceType::Shuttle => "shuttle",
        }
    }
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ServiceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "driver" => Ok(ServiceType::Driver),
            "caretaker" => Ok(ServiceType::Caretaker),
            "shuttle" => Ok(ServiceType::Shuttle),
            other => Err(format!("unknown service type '{}'", other)),
        }
    }
}

/// Role a connection claims when joining a tracking session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Driver,
    Caretaker,
    Shuttle,
    Customer,
}

impl Role {
    /// Provider roles produce location; the customer role only consumes it.
    pub fn is_provider(&self) -> bool {
        !matches!(self, Role::Customer)
    }

    /// The service type a booking must carry for this role to be its provider.
    /// Kept out of the validator's control flow so adding a provider role does
    /// not touch authorization logic.
    pub fn expected_service(&self) -> Option<ServiceType> {
        match self {
            Role::Driver => Some(ServiceType::Driver),
            Role::Caretaker => Some(ServiceType::Caretaker),
            Role::Shuttle => Some(ServiceType::Shuttle),
            Role::Customer => None,
        }
    }

    /// The provider role that delivers a given service.
    pub fn for_service(service: ServiceType) -> Role {
        match service {
            ServiceType::Driver => Role::Driver,
            ServiceType::Caretaker => Role::Caretaker,
            ServiceType::Shuttle => Role::Shuttle,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Driver => "driver",
            Role::Caretaker => "caretaker",
            Role::Shuttle => "shuttle",
            Role::Customer => "customer",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_roles_map_to_their_service() {
        assert_eq!(Role::Driver.expected_service(), Some(ServiceType::Driver));
        assert_eq!(Role::Shuttle.expected_service(), Some(ServiceType::Shuttle));
        assert_eq!(Role::Customer.expected_service(), None);
        assert_eq!(Role::for_service(ServiceType::Caretaker), Role::Caretaker);
    }

    #[test]
    fn customer_is_not_a_provider() {
        assert!(Role::Driver.is_provider());
        assert!(Role::Caretaker.is_provider());
        assert!(Role::Shuttle.is_provider());
        assert!(!Role::Customer.is_provider());
    }

    #[test]
    fn roles_deserialize_from_lowercase() {
        let role: Role = serde_json::from_str("\"driver\"").unwrap();
        assert_eq!(role, Role::Driver);
        assert!(serde_json::from_str::<Role>("\"pilot\"").is_err());
    }
}
