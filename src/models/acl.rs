//! Access-control lists attached to objects on write.

use std::fmt;

/// URI of the group that matches every requester, signed or anonymous.
pub const ALL_USERS_URI: &str = "http://acs.amazonaws.com/groups/global/AllUsers";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Permission {
    FullControl,
    Read,
    Write,
    ReadAcp,
    WriteAcp,
}

impl Permission {
    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::FullControl => "FULL_CONTROL",
            Permission::Read => "READ",
            Permission::Write => "WRITE",
            Permission::ReadAcp => "READ_ACP",
            Permission::WriteAcp => "WRITE_ACP",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "FULL_CONTROL" => Some(Permission::FullControl),
            "READ" => Some(Permission::Read),
            "WRITE" => Some(Permission::Write),
            "READ_ACP" => Some(Permission::ReadAcp),
            "WRITE_ACP" => Some(Permission::WriteAcp),
            _ => None,
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Predefined group a grant can target.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GroupGrantee {
    AllUsers,
}

impl GroupGrantee {
    pub fn uri(&self) -> &'static str {
        match self {
            GroupGrantee::AllUsers => ALL_USERS_URI,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Grantee {
    CanonicalUser(String),
    Email(String),
    Group(String),
}

impl Grantee {
    /// Header form used by `x-amz-grant-*`: `id="…"`, `emailAddress="…"` or `uri="…"`.
    pub fn header_value(&self) -> String {
        match self {
            Grantee::CanonicalUser(id) => format!("id=\"{}\"", id),
            Grantee::Email(address) => format!("emailAddress=\"{}\"", address),
            Grantee::Group(uri) => format!("uri=\"{}\"", uri),
        }
    }
}

impl From<GroupGrantee> for Grantee {
    fn from(group: GroupGrantee) -> Self {
        Grantee::Group(group.uri().to_string())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Grant {
    pub grantee: Grantee,
    pub permission: Permission,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Owner {
    pub id: Option<String>,
    pub display_name: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AccessControlList {
    pub owner: Option<Owner>,
    grants: Vec<Grant>,
}

impl AccessControlList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_owner(mut self, owner: Owner) -> Self {
        self.owner = Some(owner);
        self
    }

    pub fn grants(&self) -> &[Grant] {
        &self.grants
    }

    /// Add a grant. Adding the same grantee/permission pair twice is a no-op.
    pub fn grant_permission(&mut self, grantee: impl Into<Grantee>, permission: Permission) {
        let grant = Grant {
            grantee: grantee.into(),
            permission,
        };
        if !self.grants.contains(&grant) {
            self.grants.push(grant);
        }
    }

    pub fn has_grant(&self, grantee: &Grantee, permission: Permission) -> bool {
        self.grants
            .iter()
            .any(|g| &g.grantee == grantee && g.permission == permission)
    }

    /// Comma-joined grantee list for one permission, `None` if nobody holds it.
    pub fn grant_header(&self, permission: Permission) -> Option<String> {
        let values: Vec<String> = self
            .grants
            .iter()
            .filter(|g| g.permission == permission)
            .map(|g| g.grantee.header_value())
            .collect();
        if values.is_empty() {
            None
        } else {
            Some(values.join(", "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grant_permission_is_idempotent() {
        let mut acl = AccessControlList::new();
        acl.grant_permission(GroupGrantee::AllUsers, Permission::Read);
        acl.grant_permission(GroupGrantee::AllUsers, Permission::Read);

        assert_eq!(acl.grants().len(), 1);
        assert!(acl.has_grant(&GroupGrantee::AllUsers.into(), Permission::Read));
        assert!(!acl.has_grant(&GroupGrantee::AllUsers.into(), Permission::Write));
    }

    #[test]
    fn grant_header_joins_grantees_per_permission() {
        let mut acl = AccessControlList::new();
        acl.grant_permission(Grantee::CanonicalUser("abc123".into()), Permission::FullControl);
        acl.grant_permission(GroupGrantee::AllUsers, Permission::Read);
        acl.grant_permission(Grantee::Email("ops@example.com".into()), Permission::Read);

        assert_eq!(
            acl.grant_header(Permission::Read).as_deref(),
            Some(
                "uri=\"http://acs.amazonaws.com/groups/global/AllUsers\", emailAddress=\"ops@example.com\""
            )
        );
        assert_eq!(
            acl.grant_header(Permission::FullControl).as_deref(),
            Some("id=\"abc123\"")
        );
        assert_eq!(acl.grant_header(Permission::WriteAcp), None);
    }

    #[test]
    fn permission_parse_matches_display() {
        for permission in [
            Permission::FullControl,
            Permission::Read,
            Permission::Write,
            Permission::ReadAcp,
            Permission::WriteAcp,
        ] {
            assert_eq!(Permission::parse(&permission.to_string()), Some(permission));
        }
        assert_eq!(Permission::parse("read"), None);
    }
}
