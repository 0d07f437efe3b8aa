//! Principal domain model.
//!
//! A principal is an authenticated actor operating the platform: either
//! the single platform owner or one of the scoped operators it manages.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Role {
    PlatformOwner,
    ScopedOperator,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::PlatformOwner => "PlatformOwner",
            Role::ScopedOperator => "ScopedOperator",
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PlatformOwner" => Ok(Role::PlatformOwner),
            "ScopedOperator" => Ok(Role::ScopedOperator),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// The fixed universe of grantable capabilities.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    AddTenants,
    EditTenants,
    DeleteTenants,
    ViewAnalytics,
    ManageSchedule,
    ManageServices,
    ManageProviders,
    ManageOperators,
}

impl Capability {
    pub const ALL: [Capability; 8] = [
        Capability::AddTenants,
        Capability::EditTenants,
        Capability::DeleteTenants,
        Capability::ViewAnalytics,
        Capability::ManageSchedule,
        Capability::ManageServices,
        Capability::ManageProviders,
        Capability::ManageOperators,
    ];
}

/// Capability name → granted flag. Absent entries are not granted.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct CapabilitySet(BTreeMap<Capability, bool>);

impl CapabilitySet {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn all() -> Self {
        Capability::ALL.into_iter().collect()
    }

    pub fn grants(&self, capability: Capability) -> bool {
        self.0.get(&capability).copied().unwrap_or(false)
    }

    pub fn set(&mut self, capability: Capability, granted: bool) {
        self.0.insert(capability, granted);
    }

    pub fn with(mut self, capability: Capability) -> Self {
        self.set(capability, true);
        self
    }

    pub fn granted(&self) -> impl Iterator<Item = Capability> + '_ {
        self.0
            .iter()
            .filter_map(|(cap, granted)| granted.then_some(*cap))
    }
}

impl FromIterator<Capability> for CapabilitySet {
    fn from_iter<I: IntoIterator<Item = Capability>>(iter: I) -> Self {
        Self(iter.into_iter().map(|cap| (cap, true)).collect())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Principal {
    pub id: Uuid,
    pub role: Role,
    /// The platform owner that manages this operator. `None` for the
    /// platform owner itself.
    pub owner_id: Option<Uuid>,
    pub display_name: String,
    pub email: String,
    pub capabilities: CapabilitySet,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Principal {
    pub fn is_platform_owner(&self) -> bool {
        self.role == Role::PlatformOwner
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePrincipal {
    pub role: Role,
    pub owner_id: Option<Uuid>,
    pub display_name: String,
    pub email: String,
    pub capabilities: CapabilitySet,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdatePrincipal {
    pub display_name: Option<String>,
    pub capabilities: Option<CapabilitySet>,
    pub is_active: Option<bool>,
}
