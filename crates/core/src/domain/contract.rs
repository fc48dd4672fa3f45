use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::employee::EmployeeId;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContractId(pub String);

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contract {
    pub id: ContractId,
    pub employee_id: EmployeeId,
    pub position: String,
    pub salary: Decimal,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Partial update applied onto a contract by an approved `update_contract`
/// request.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractUpdate {
    pub position: Option<String>,
    pub salary: Option<Decimal>,
    pub end_date: Option<DateTime<Utc>>,
}

impl ContractUpdate {
    pub fn is_empty(&self) -> bool {
        self.position.is_none() && self.salary.is_none() && self.end_date.is_none()
    }

    pub fn apply(&self, contract: &mut Contract) {
        if let Some(position) = &self.position {
            contract.position = position.clone();
        }
        if let Some(salary) = self.salary {
            contract.salary = salary;
        }
        if let Some(end_date) = self.end_date {
            contract.end_date = Some(end_date);
        }
    }
}
