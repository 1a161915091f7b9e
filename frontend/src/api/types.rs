use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize};
use serde_json::Value;

pub type UserId = i64;
pub type RequestId = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "Empleado")]
    Employee,
    #[serde(rename = "Aprobador")]
    Approver,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LeaveBalance {
    pub total: i32,
    pub used: i32,
    pub available: i32,
}

impl LeaveBalance {
    pub fn new(total: i32) -> Self {
        Self {
            total,
            used: 0,
            available: total,
        }
    }

    pub fn with_used(self, used: i32) -> Self {
        Self {
            total: self.total,
            used,
            available: self.total - used,
        }
    }

    /// Moves `days` into `used` (negative values credit them back).
    pub fn adjusted(self, days: i32) -> Self {
        self.with_used(self.used + days)
    }

    pub fn with_total(self, total: i32) -> Self {
        Self {
            total,
            used: self.used,
            available: total - self.used,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: Role,
    #[serde(deserialize_with = "embedded_json")]
    pub annual_leave: LeaveBalance,
}

impl User {
    pub fn is_approver(&self) -> bool {
        self.role == Role::Approver
    }

    pub fn with_leave_adjusted(&self, days: i32) -> Self {
        Self {
            annual_leave: self.annual_leave.adjusted(days),
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub role: Role,
    pub password: String,
    pub total_leave: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub user: User,
    pub users: Vec<User>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequestStatus {
    #[serde(rename = "Pendiente")]
    Pending,
    #[serde(rename = "Aprobada")]
    Approved,
    #[serde(rename = "Rechazada")]
    Rejected,
    #[serde(rename = "Modificada")]
    Modified,
}

impl RequestStatus {
    pub const ALL: [RequestStatus; 4] = [
        RequestStatus::Pending,
        RequestStatus::Approved,
        RequestStatus::Rejected,
        RequestStatus::Modified,
    ];

    /// Approved and modified requests are the ones drawn from the balance.
    pub fn consumes_balance(self) -> bool {
        matches!(self, RequestStatus::Approved | RequestStatus::Modified)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RequestType {
    #[default]
    #[serde(rename = "Vacaciones")]
    Vacation,
    #[serde(rename = "Asuntos Propios")]
    Personal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApproverRef {
    pub id: UserId,
    pub name: String,
}

impl From<&User> for ApproverRef {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VacationRequest {
    pub id: RequestId,
    pub user_id: UserId,
    pub user_name: String,
    pub start_date: String,
    pub end_date: String,
    pub days: i32,
    #[serde(rename = "type")]
    pub request_type: RequestType,
    pub status: RequestStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub employee_comment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approver_comment: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_embedded_json",
        skip_serializing_if = "Option::is_none"
    )]
    pub approved_by: Option<ApproverRef>,
    pub created_at: String,
}

/// A request as submitted by an employee, before the store assigns an id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewVacationRequest {
    pub user_id: UserId,
    pub user_name: String,
    pub start_date: String,
    pub end_date: String,
    pub days: i32,
    #[serde(rename = "type")]
    pub request_type: RequestType,
    pub status: RequestStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub employee_comment: Option<String>,
    pub created_at: String,
}

/// Form output for a new request; the owner and timestamp are stamped later.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestSubmission {
    pub start_date: String,
    pub end_date: String,
    pub days: i32,
    pub request_type: RequestType,
    pub employee_comment: Option<String>,
}

/// Spreadsheet cells holding objects come back as JSON strings.
fn embedded_json<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    match Value::deserialize(deserializer)? {
        Value::String(raw) => serde_json::from_str(&raw).map_err(serde::de::Error::custom),
        other => serde_json::from_value(other).map_err(serde::de::Error::custom),
    }
}

fn lenient_embedded_json<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    let parsed = match value {
        Value::Null => return Ok(None),
        Value::String(raw) if raw.trim().is_empty() => return Ok(None),
        Value::String(raw) => serde_json::from_str(&raw),
        other => serde_json::from_value(other),
    };
    match parsed {
        Ok(parsed) => Ok(Some(parsed)),
        Err(err) => {
            log::warn!("Ignoring malformed embedded JSON: {}", err);
            Ok(None)
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ActionRequest<'a> {
    pub action: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    pub status: String,
    #[serde(default)]
    pub data: Value,
    #[serde(default)]
    pub message: Option<String>,
}

impl ResponseEnvelope {
    pub fn is_error(&self) -> bool {
        self.status == "error"
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
#[error("{error}")]
pub struct ApiError {
    pub error: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl From<ApiError> for String {
    fn from(error: ApiError) -> Self {
        error.error
    }
}

impl ApiError {
    fn with_code(msg: impl Into<String>, code: &str) -> Self {
        Self {
            error: msg.into(),
            code: code.to_string(),
            details: None,
        }
    }

    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::with_code(msg, "CONFIGURATION_ERROR")
    }

    pub fn network(msg: impl Into<String>) -> Self {
        Self::with_code(msg, "NETWORK_ERROR")
    }

    pub fn application(msg: impl Into<String>) -> Self {
        Self::with_code(msg, "APPLICATION_ERROR")
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::with_code(msg, "VALIDATION_ERROR")
    }

    pub fn unknown(msg: impl Into<String>) -> Self {
        Self::with_code(msg, "UNKNOWN")
    }

    pub fn is_network(&self) -> bool {
        self.code == "NETWORK_ERROR"
    }
}
