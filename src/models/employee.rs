use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Executive,
    Sales,
    Procurement,
    Technical,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Executive, Role::Sales, Role::Procurement, Role::Technical];

    pub fn focus(&self) -> &'static str {
        match self {
            Role::Executive => "strategic impact, revenue exposure and vendor consolidation",
            Role::Sales => "customer conversations, competitive positioning and upsell timing",
            Role::Procurement => "contract renewals, license terms and negotiation leverage",
            Role::Technical => "migration effort, platform changes and licensing enforcement",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Executive => write!(f, "executive"),
            Role::Sales => write!(f, "sales"),
            Role::Procurement => write!(f, "procurement"),
            Role::Technical => write!(f, "technical"),
        }
    }
}

impl From<&str> for Role {
    fn from(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "executive" | "exec" | "leadership" | "management" => Role::Executive,
            "sales" | "account manager" | "account management" => Role::Sales,
            "procurement" | "purchasing" | "finance" => Role::Procurement,
            _ => Role::Technical,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Employee {
    pub name: String,
    pub email: String,
    pub role: Role,
}
