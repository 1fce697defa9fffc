use chrono::NaiveDate;

#[derive(sqlx::FromRow, Debug, Clone, PartialEq)]
pub struct ProjectAssignment {
    pub id: i32,
    pub user_id: i32,
    pub project_id: i32,
    pub start_date: NaiveDate,
    /// Open ended when `None`
    pub end_date: Option<NaiveDate>,
    pub bill_rate: f64,
}

impl ProjectAssignment {
    pub fn covers(&self, date: NaiveDate) -> bool {
        date >= self.start_date && self.end_date.map_or(true, |end| date <= end)
    }

    /// Two assignments overlap when their date ranges share at least one day.
    pub fn overlaps(&self, other: &ProjectAssignment) -> bool {
        let self_starts_before_other_ends = other.end_date.map_or(true, |end| self.start_date <= end);
        let other_starts_before_self_ends = self.end_date.map_or(true, |end| other.start_date <= end);
        self_starts_before_other_ends && other_starts_before_self_ends
    }
}

/// First existing assignment for the same employee and project whose range
/// overlaps `candidate`. The candidate's own row is ignored when editing.
pub fn find_overlap<'a>(candidate: &ProjectAssignment, existing: &'a [ProjectAssignment]) -> Option<&'a ProjectAssignment> {
    existing.iter().find(|other| {
        other.id != candidate.id
            && other.user_id == candidate.user_id
            && other.project_id == candidate.project_id
            && other.overlaps(candidate)
    })
}

/// Assignment joined with the names shown in lists
#[derive(sqlx::FromRow, Debug, Clone)]
pub struct AssignmentOverview {
    pub id: i32,
    pub user_id: i32,
    pub project_id: i32,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub bill_rate: f64,
    pub employee_name: String,
    pub project_name: String,
    pub client_name: String,
}

impl AssignmentOverview {
    pub fn assignment(&self) -> ProjectAssignment {
        ProjectAssignment {
            id: self.id,
            user_id: self.user_id,
            project_id: self.project_id,
            start_date: self.start_date,
            end_date: self.end_date,
            bill_rate: self.bill_rate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assignment(start: (i32, u32, u32), end: Option<(i32, u32, u32)>) -> ProjectAssignment {
        ProjectAssignment {
            id: 0,
            user_id: 1,
            project_id: 1,
            start_date: NaiveDate::from_ymd_opt(start.0, start.1, start.2).unwrap(),
            end_date: end.map(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d).unwrap()),
            bill_rate: 100.0,
        }
    }

    #[test]
    fn adjacent_ranges_do_not_overlap() {
        let first = assignment((2024, 1, 1), Some((2024, 1, 31)));
        let second = assignment((2024, 2, 1), None);
        assert!(!first.overlaps(&second));
        assert!(!second.overlaps(&first));
    }

    #[test]
    fn shared_boundary_day_overlaps() {
        let first = assignment((2024, 1, 1), Some((2024, 1, 31)));
        let second = assignment((2024, 1, 31), Some((2024, 3, 1)));
        assert!(first.overlaps(&second));
    }

    #[test]
    fn open_ended_ranges_overlap_anything_later() {
        let open = assignment((2024, 1, 1), None);
        let later = assignment((2030, 6, 1), Some((2030, 6, 2)));
        assert!(open.overlaps(&later));
        assert!(later.overlaps(&open));
    }

    #[test]
    fn find_overlap_ignores_self_and_other_projects() {
        let mut existing = assignment((2024, 1, 1), None);
        existing.id = 5;
        let mut other_project = assignment((2024, 1, 1), None);
        other_project.id = 6;
        other_project.project_id = 2;

        let mut edited = existing.clone();
        edited.start_date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert!(find_overlap(&edited, &[existing.clone(), other_project.clone()]).is_none());

        let fresh = assignment((2025, 1, 1), Some((2025, 2, 1)));
        assert_eq!(find_overlap(&fresh, &[existing, other_project]).map(|a| a.id), Some(5));
    }

    #[test]
    fn covers_is_inclusive() {
        let a = assignment((2024, 1, 1), Some((2024, 1, 31)));
        assert!(a.covers(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()));
        assert!(a.covers(NaiveDate::from_ymd_opt(2024, 1, 31).unwrap()));
        assert!(!a.covers(NaiveDate::from_ymd_opt(2024, 2, 1).unwrap()));
        assert!(!a.covers(NaiveDate::from_ymd_opt(2023, 12, 31).unwrap()));
    }
}
