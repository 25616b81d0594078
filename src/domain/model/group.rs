use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Raffle lifecycle of a group. `Completed` is terminal until a reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RaffleStatus {
    #[default]
    Pending,
    Completed,
}

impl RaffleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(Self::Pending),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }
}

/// Group entity - a set of members exchanging gifts, owned by an admin
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    pub id: String,
    pub name: String,
    pub admin_id: String,
    /// Ordered, unique member ids. The admin is always a member.
    pub members: Vec<String>,
    pub raffle_status: RaffleStatus,
    pub raffle_date: Option<DateTime<Utc>>,
    /// Draw whose assignments are the committed result of the raffle
    pub draw_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Group {
    pub fn new(name: String, admin_id: String) -> Self {
        Self {
            id: Ulid::new().to_string(),
            name,
            members: vec![admin_id.clone()],
            admin_id,
            raffle_status: RaffleStatus::Pending,
            raffle_date: None,
            draw_id: None,
            created_at: Utc::now(),
        }
    }

    pub fn is_admin(&self, user_id: &str) -> bool {
        self.admin_id == user_id
    }

    pub fn is_member(&self, user_id: &str) -> bool {
        self.members.iter().any(|m| m == user_id)
    }

    pub fn is_raffle_completed(&self) -> bool {
        self.raffle_status == RaffleStatus::Completed
    }

    /// Returns false if the user was already a member.
    pub fn add_member(&mut self, user_id: &str) -> bool {
        if self.is_member(user_id) {
            return false;
        }
        self.members.push(user_id.to_string());
        true
    }

    /// Returns false if the user was not a member.
    pub fn remove_member(&mut self, user_id: &str) -> bool {
        let before = self.members.len();
        self.members.retain(|m| m != user_id);
        self.members.len() != before
    }
}
