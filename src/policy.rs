//! Ownership and role rules for appliance records.
//!
//! Every appliance operation funnels through [`Policy`]: administrators may act
//! on any record, everyone else only on records they own.

use std::collections::BTreeSet;

use uuid::Uuid;

pub const ADMIN_ROLE: &str = "Admin";
pub const USER_ROLE: &str = "User";

/// Authenticated caller: stable id plus the role names attached to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub id: Uuid,
    pub roles: BTreeSet<String>,
}

impl Principal {
    pub fn new<I, S>(id: Uuid, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id,
            roles: roles.into_iter().map(Into::into).collect(),
        }
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(ADMIN_ROLE)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    View,
    Edit,
    Delete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allowed,
    Denied,
}

/// Which appliances a listing may return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListScope {
    All,
    OwnedBy(Uuid),
}

impl ListScope {
    pub fn includes(&self, owner: Option<Uuid>) -> bool {
        match self {
            ListScope::All => true,
            ListScope::OwnedBy(id) => owner == Some(*id),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    Admin,
    Owner,
}

impl Policy {
    pub fn for_principal(principal: &Principal) -> Self {
        if principal.is_admin() {
            Policy::Admin
        } else {
            Policy::Owner
        }
    }

    pub fn authorize(&self, principal: &Principal, owner: Option<Uuid>, _op: Operation) -> Decision {
        match self {
            Policy::Admin => Decision::Allowed,
            Policy::Owner if owner == Some(principal.id) => Decision::Allowed,
            Policy::Owner => Decision::Denied,
        }
    }

    pub fn list_scope(&self, principal: &Principal) -> ListScope {
        match self {
            Policy::Admin => ListScope::All,
            Policy::Owner => ListScope::OwnedBy(principal.id),
        }
    }
}

pub fn authorize(principal: &Principal, owner: Option<Uuid>, op: Operation) -> Decision {
    Policy::for_principal(principal).authorize(principal, owner, op)
}
