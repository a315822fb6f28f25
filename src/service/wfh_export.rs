//! Admin-side WFH list views: filtering, counts and CSV export.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::model::wfh_request::{WfhRequest, WfhStatus};

#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct WfhFilter {
    /// `all`, `pending`, `approved` or `rejected`
    #[schema(example = "pending")]
    pub status: Option<String>,
    /// matches name, email or department
    #[schema(example = "sales")]
    pub search: Option<String>,
}

pub fn filter_requests(requests: Vec<WfhRequest>, filter: &WfhFilter) -> Vec<WfhRequest> {
    let status = filter
        .status
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty() && !s.eq_ignore_ascii_case("all"));
    let needle = filter
        .search
        .as_deref()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty());

    requests
        .into_iter()
        .filter(|r| status.is_none_or(|s| r.status.as_ref().eq_ignore_ascii_case(s)))
        .filter(|r| {
            needle.as_deref().is_none_or(|n| {
                [&r.employee_name, &r.employee_email, &r.department]
                    .iter()
                    .any(|field| field.to_lowercase().contains(n))
            })
        })
        .collect()
}

#[derive(Debug, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct WfhStats {
    pub total: usize,
    pub pending: usize,
    pub approved: usize,
    pub rejected: usize,
}

pub fn stats(requests: &[WfhRequest]) -> WfhStats {
    requests.iter().fold(
        WfhStats {
            total: requests.len(),
            ..Default::default()
        },
        |mut acc, r| {
            match r.status {
                WfhStatus::Pending => acc.pending += 1,
                WfhStatus::Approved => acc.approved += 1,
                WfhStatus::Rejected => acc.rejected += 1,
            }
            acc
        },
    )
}

const CSV_HEADER: [&str; 8] = [
    "Employee Name",
    "Email",
    "Department",
    "Request Type",
    "Start Date",
    "End Date",
    "Status",
    "Submitted Date",
];

/// Prefixes cells a spreadsheet would evaluate as a formula.
fn neutralize(value: &str) -> String {
    let trimmed = value.trim_start();
    match trimmed.chars().next() {
        Some('=' | '+' | '-' | '@') => format!("'{value}"),
        _ => value.to_string(),
    }
}

pub fn to_csv(requests: &[WfhRequest]) -> anyhow::Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(CSV_HEADER)?;

    for r in requests {
        writer.write_record([
            neutralize(&r.employee_name),
            neutralize(&r.employee_email),
            neutralize(&r.department),
            r.request_type.to_string(),
            r.start_date.to_string(),
            r.end_date.to_string(),
            r.status.to_string(),
            r.submitted_at.format("%b %-d, %Y").to_string(),
        ])?;
    }

    Ok(writer.into_inner()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::wfh_request::WfhType;
    use chrono::NaiveDate;

    fn request(id: u64, name: &str, department: &str, status: WfhStatus) -> WfhRequest {
        let day = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
        WfhRequest {
            id,
            employee_id: id,
            admin_id: 1,
            employee_name: name.into(),
            employee_email: format!("{}@example.com", name.to_lowercase().replace(' ', ".")),
            department: department.into(),
            request_type: WfhType::FullDay,
            start_date: day,
            end_date: day,
            status,
            reason: "internet install".into(),
            work_location: "Home".into(),
            emergency_phone: None,
            additional_notes: None,
            admin_notes: None,
            submitted_at: day.and_hms_opt(9, 0, 0).unwrap(),
            decided_at: None,
        }
    }

    fn sample() -> Vec<WfhRequest> {
        vec![
            request(1, "Jane Smith", "Sales", WfhStatus::Pending),
            request(2, "John Doe", "Engineering", WfhStatus::Approved),
            request(3, "Ravi Kumar", "Sales", WfhStatus::Rejected),
        ]
    }

    #[test]
    fn search_matches_department_and_email() {
        let filter = WfhFilter {
            status: Some("all".into()),
            search: Some("SALES".into()),
        };
        assert_eq!(filter_requests(sample(), &filter).len(), 2);

        let filter = WfhFilter {
            status: Some("Approved".into()),
            search: Some("john.doe@".into()),
        };
        let hits = filter_requests(sample(), &filter);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, 2);
    }

    #[test]
    fn stats_count_each_status() {
        assert_eq!(
            stats(&sample()),
            WfhStats {
                total: 3,
                pending: 1,
                approved: 1,
                rejected: 1
            }
        );
    }

    #[test]
    fn csv_has_header_and_quoted_dates() {
        let mut rows = sample();
        rows[0].employee_name = "=HYPERLINK(1)".into();
        let body = String::from_utf8(to_csv(&rows[..1]).unwrap()).unwrap();
        let mut lines = body.lines();
        assert_eq!(
            lines.next(),
            Some("Employee Name,Email,Department,Request Type,Start Date,End Date,Status,Submitted Date")
        );
        assert_eq!(
            lines.next(),
            Some("'=HYPERLINK(1),jane.smith@example.com,Sales,Full Day,2026-01-05,2026-01-05,pending,\"Jan 5, 2026\"")
        );
    }
}
