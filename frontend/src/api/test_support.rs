#[cfg(test)]
pub mod mock {
    use crate::api::{
        ApiClient, LeaveBalance, RequestStatus, RequestType, Role, User, UserId, VacationRequest,
    };
    use httpmock::{Mock, MockServer};
    use serde_json::{json, Value};

    pub use httpmock::Method::POST;

    pub const SCRIPT_PATH: &str = "/macros/s/test-deployment/exec";

    pub fn api_client(server: &MockServer) -> ApiClient {
        ApiClient::new_with_endpoint(server.url(SCRIPT_PATH))
    }

    pub fn ok_envelope(data: Value) -> Value {
        json!({ "status": "ok", "data": data })
    }

    pub fn error_envelope(message: &str) -> Value {
        json!({ "status": "error", "message": message })
    }

    pub fn action_marker(action: &str) -> String {
        format!("\"action\":\"{}\"", action)
    }

    /// Answers every POST for `action` with `envelope`.
    pub async fn mock_action<'a>(server: &'a MockServer, action: &str, envelope: Value) -> Mock<'a> {
        mock_action_matching(server, action, &[], envelope).await
    }

    /// Like [`mock_action`], but only when the body also contains each fragment.
    pub async fn mock_action_matching<'a>(
        server: &'a MockServer,
        action: &str,
        fragments: &[&str],
        envelope: Value,
    ) -> Mock<'a> {
        let marker = action_marker(action);
        let fragments: Vec<String> = fragments.iter().map(|f| f.to_string()).collect();
        server
            .mock_async(move |when, then| {
                fragments.into_iter().fold(
                    when.method(POST).path(SCRIPT_PATH).body_contains(marker),
                    |when, fragment| when.body_contains(fragment),
                );
                then.status(200)
                    .header("content-type", "application/json")
                    .json_body(envelope);
            })
            .await
    }

    pub fn user(id: UserId, name: &str, role: Role, balance: LeaveBalance) -> User {
        User {
            id,
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase().replace(' ', ".")),
            role,
            annual_leave: balance,
        }
    }

    pub fn approver() -> User {
        user(1, "Marta Gil", Role::Approver, LeaveBalance::new(25))
    }

    pub fn employee() -> User {
        user(
            7,
            "Lucia Perez",
            Role::Employee,
            LeaveBalance::new(22).with_used(4),
        )
    }

    pub fn request(id: i64, owner: &User, status: RequestStatus, days: i32) -> VacationRequest {
        VacationRequest {
            id,
            user_id: owner.id,
            user_name: owner.name.clone(),
            start_date: "10/06/2024".into(),
            end_date: "14/06/2024".into(),
            days,
            request_type: RequestType::Vacation,
            status,
            employee_comment: None,
            approver_comment: None,
            approved_by: None,
            created_at: format!("2024-05-{:02}T09:00:00.000Z", id.clamp(1, 28)),
        }
    }

    pub fn to_json<T: serde::Serialize>(value: &T) -> Value {
        serde_json::to_value(value).expect("fixture serializes")
    }
}
