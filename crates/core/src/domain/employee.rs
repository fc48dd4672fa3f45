use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EmployeeId(pub String);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmployeeStatus {
    Active,
    Dismissed,
    Resigned,
}

impl EmployeeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Dismissed => "dismissed",
            Self::Resigned => "resigned",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "active" => Some(Self::Active),
            "dismissed" => Some(Self::Dismissed),
            "resigned" => Some(Self::Resigned),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    pub id: EmployeeId,
    pub email: String,
    pub full_name: String,
    pub position: String,
    pub department: String,
    pub status: EmployeeStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Partial update applied onto an employee record by an approved
/// `update_user` request. `None` fields are left untouched.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeUpdate {
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub position: Option<String>,
    pub department: Option<String>,
}

impl EmployeeUpdate {
    pub fn is_empty(&self) -> bool {
        self.email.is_none()
            && self.full_name.is_none()
            && self.position.is_none()
            && self.department.is_none()
    }

    pub fn apply(&self, employee: &mut Employee) {
        if let Some(email) = &self.email {
            employee.email = email.clone();
        }
        if let Some(full_name) = &self.full_name {
            employee.full_name = full_name.clone();
        }
        if let Some(position) = &self.position {
            employee.position = position.clone();
        }
        if let Some(department) = &self.department {
            employee.department = department.clone();
        }
    }
}
