use serde_json::{json, Value};

use super::{
    client::ApiClient,
    types::{ApiError, NewVacationRequest, RequestId, UserId, VacationRequest},
};

fn parse_request_list(data: Value) -> Result<Vec<VacationRequest>, ApiError> {
    match data {
        Value::Array(items) => items
            .into_iter()
            .map(|item| {
                serde_json::from_value(item).map_err(|e| {
                    ApiError::unknown(format!("Failed to parse requests response: {}", e))
                })
            })
            .collect(),
        other => {
            log::warn!("getRequests returned non-array data: {}", other);
            Ok(Vec::new())
        }
    }
}

impl ApiClient {
    pub async fn get_requests(&self) -> Result<Vec<VacationRequest>, ApiError> {
        let data = self.call("getRequests", None).await?;
        parse_request_list(data)
    }

    pub async fn add_request(
        &self,
        request: &NewVacationRequest,
    ) -> Result<VacationRequest, ApiError> {
        self.call_as("addRequest", Some(json!({ "request": request })))
            .await
    }

    pub async fn update_request(
        &self,
        request: &VacationRequest,
    ) -> Result<VacationRequest, ApiError> {
        self.call_as("updateRequest", Some(json!({ "request": request })))
            .await
    }

    pub async fn edit_request(
        &self,
        request: &VacationRequest,
    ) -> Result<VacationRequest, ApiError> {
        self.call_as("editRequest", Some(json!({ "request": request })))
            .await
    }

    pub async fn delete_request(&self, id: RequestId) -> Result<(), ApiError> {
        self.call("deleteRequest", Some(json!({ "requestId": id })))
            .await
            .map(|_| ())
    }

    pub async fn remove_requests_by_user(&self, user_id: UserId) -> Result<(), ApiError> {
        self.call("removeRequestsByUser", Some(json!({ "userId": user_id })))
            .await
            .map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_array_request_data_is_treated_as_empty() {
        assert!(parse_request_list(Value::Null).unwrap().is_empty());
        assert!(parse_request_list(json!({"rows": []})).unwrap().is_empty());
    }

    #[test]
    fn malformed_request_items_fail_the_whole_list() {
        let err = parse_request_list(json!([{ "id": "x" }])).unwrap_err();
        assert_eq!(err.code, "UNKNOWN");
    }
}
