use serde::{Deserialize, Serialize};

/// Coarse identity classification used for RBAC.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    Officer,
    Booker,
    User,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Admin, Role::Officer, Role::Booker, Role::User];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Officer => "OFFICER",
            Role::Booker => "BOOKER",
            Role::User => "USER",
        }
    }

    /// Whether an administrator may grant this role permissions beyond its
    /// baseline. Public customer accounts never carry extra grants, and admins
    /// already hold everything.
    pub fn accepts_overrides(&self) -> bool {
        matches!(self, Role::Officer | Role::Booker)
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|r| r.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown role '{s}'"))
    }
}
