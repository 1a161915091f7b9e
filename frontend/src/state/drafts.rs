use crate::{
    api::{ApiError, RequestStatus, RequestSubmission, RequestType, User, VacationRequest},
    utils::date::{business_days_between_inputs, to_api_format, to_input_format},
};

const INVALID_RANGE_MESSAGE: &str =
    "La fecha de fin debe ser posterior o igual a la fecha de inicio.";

/// Form state of the request modal. Dates are `yyyy-mm-dd`, as date inputs
/// produce them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestDraft {
    pub start_input: String,
    pub end_input: String,
    pub request_type: RequestType,
    pub comment: String,
}

impl RequestDraft {
    pub fn from_request(request: &VacationRequest) -> Self {
        Self {
            start_input: to_input_format(&request.start_date),
            end_input: to_input_format(&request.end_date),
            request_type: request.request_type,
            comment: request.employee_comment.clone().unwrap_or_default(),
        }
    }

    /// Moving the start past the end drags the end along.
    pub fn set_start(&mut self, start_input: &str) {
        self.start_input = start_input.to_string();
        if !self.end_input.is_empty() && self.start_input > self.end_input {
            self.end_input = self.start_input.clone();
        }
    }

    pub fn days(&self) -> i32 {
        business_days_between_inputs(&self.start_input, &self.end_input)
    }

    fn validated_days(&self) -> Result<i32, ApiError> {
        match self.days() {
            days if days > 0 => Ok(days),
            _ => Err(ApiError::validation(INVALID_RANGE_MESSAGE)),
        }
    }

    fn comment(&self) -> Option<String> {
        let comment = self.comment.trim();
        (!comment.is_empty()).then(|| comment.to_string())
    }

    pub fn into_submission(self) -> Result<RequestSubmission, ApiError> {
        let days = self.validated_days()?;
        Ok(RequestSubmission {
            start_date: to_api_format(&self.start_input),
            end_date: to_api_format(&self.end_input),
            days,
            request_type: self.request_type,
            employee_comment: self.comment(),
        })
    }

    pub fn apply_to(&self, existing: &VacationRequest) -> Result<VacationRequest, ApiError> {
        let days = self.validated_days()?;
        Ok(VacationRequest {
            start_date: to_api_format(&self.start_input),
            end_date: to_api_format(&self.end_input),
            days,
            request_type: self.request_type,
            employee_comment: self.comment(),
            ..existing.clone()
        })
    }
}

/// An approver's edit always lands as Modified and says who changed it.
pub fn approver_edit(edited: VacationRequest, approver: &User) -> VacationRequest {
    VacationRequest {
        status: RequestStatus::Modified,
        approver_comment: Some(format!("Modificado por {}.", approver.name)),
        ..edited
    }
}
