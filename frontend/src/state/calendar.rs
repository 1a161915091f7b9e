use chrono::{Datelike, NaiveDate};

use crate::{
    api::{RequestId, RequestType, VacationRequest},
    utils::date::parse_date,
};

/// One approved absence as the team calendar draws it.
#[derive(Debug, Clone, PartialEq)]
pub struct TeamAbsence {
    pub request_id: RequestId,
    pub user_name: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub request_type: RequestType,
}

impl TeamAbsence {
    pub fn covers(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Approved and modified requests whose dates parse.
pub fn team_absences(requests: &[VacationRequest]) -> Vec<TeamAbsence> {
    requests
        .iter()
        .filter(|request| request.status.consumes_balance())
        .filter_map(|request| {
            let start = parse_date(&request.start_date)?;
            let end = parse_date(&request.end_date)?;
            Some(TeamAbsence {
                request_id: request.id,
                user_name: request.user_name.clone(),
                start,
                end,
                request_type: request.request_type,
            })
        })
        .collect()
}

pub fn absences_on(absences: &[TeamAbsence], date: NaiveDate) -> Vec<&TeamAbsence> {
    absences.iter().filter(|absence| absence.covers(date)).collect()
}

/// Every day of the month, paired with the absences covering it.
pub fn month_absences(
    absences: &[TeamAbsence],
    year: i32,
    month: u32,
) -> Vec<(NaiveDate, Vec<TeamAbsence>)> {
    let Some(first) = NaiveDate::from_ymd_opt(year, month, 1) else {
        return Vec::new();
    };
    first
        .iter_days()
        .take_while(|day| day.month() == month)
        .map(|day| {
            let covering = absences_on(absences, day).into_iter().cloned().collect();
            (day, covering)
        })
        .collect()
}

/// Month navigation: `(year, month)` moved by `offset` months.
pub fn shift_month(year: i32, month: u32, offset: i32) -> (i32, u32) {
    let index = year * 12 + month as i32 - 1 + offset;
    (index.div_euclid(12), index.rem_euclid(12) as u32 + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::RequestStatus;

    fn request(id: i64, name: &str, start: &str, end: &str, status: RequestStatus) -> VacationRequest {
        VacationRequest {
            id,
            user_id: id,
            user_name: name.into(),
            start_date: start.into(),
            end_date: end.into(),
            days: 1,
            request_type: RequestType::Vacation,
            status,
            employee_comment: None,
            approver_comment: None,
            approved_by: None,
            created_at: "2024-05-01T09:00:00.000Z".into(),
        }
    }

    fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn only_approved_and_modified_requests_show_up() {
        let requests = vec![
            request(1, "Ana", "10/06/2024", "12/06/2024", RequestStatus::Approved),
            request(2, "Luis", "11/06/2024", "11/06/2024", RequestStatus::Pending),
            request(3, "Eva", "28/06/2024", "02/07/2024", RequestStatus::Modified),
            request(4, "Rut", "11/06/2024", "11/06/2024", RequestStatus::Rejected),
            request(5, "Sol", "fecha rota", "11/06/2024", RequestStatus::Approved),
        ];
        let absences = team_absences(&requests);
        let names: Vec<_> = absences.iter().map(|a| a.user_name.as_str()).collect();
        assert_eq!(names, vec!["Ana", "Eva"]);
    }

    #[test]
    fn month_grid_spans_every_day_and_crosses_month_ends() {
        let absences = team_absences(&[
            request(1, "Ana", "10/06/2024", "12/06/2024", RequestStatus::Approved),
            request(3, "Eva", "28/06/2024", "02/07/2024", RequestStatus::Modified),
        ]);

        let june = month_absences(&absences, 2024, 6);
        assert_eq!(june.len(), 30);
        assert_eq!(june[10].0, ymd(2024, 6, 11));
        assert_eq!(june[10].1.len(), 1);
        assert!(june[12].1.is_empty());
        assert_eq!(june[29].1[0].user_name, "Eva");

        let july = month_absences(&absences, 2024, 7);
        assert_eq!(july.len(), 31);
        assert_eq!(july[1].1.len(), 1);
        assert!(july[2].1.is_empty());

        assert!(month_absences(&absences, 2024, 13).is_empty());
    }

    #[test]
    fn shifting_months_wraps_years() {
        assert_eq!(shift_month(2024, 12, 1), (2025, 1));
        assert_eq!(shift_month(2024, 1, -1), (2023, 12));
        assert_eq!(shift_month(2024, 6, 0), (2024, 6));
    }
}
