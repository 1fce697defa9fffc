/// Problems with form input, caught before anything is written.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ValidationError {
    #[error("{0} is required")]
    Required(&'static str),
    #[error("{field} is not a valid number: {value}")]
    InvalidNumber { field: &'static str, value: String },
    #[error("{field} is not a valid date (YYYY-MM-DD): {value}")]
    InvalidDate { field: &'static str, value: String },
    #[error("hours must be greater than 0 and at most 24, got {0}")]
    HoursOutOfRange(f64),
    #[error("amount must be greater than 0, got {0}")]
    AmountOutOfRange(f64),
    #[error("end date {end} is before start date {start}")]
    EndBeforeStart { start: chrono::NaiveDate, end: chrono::NaiveDate },
    #[error("{date} is outside the week starting {week_start}")]
    OutsideWeek { date: chrono::NaiveDate, week_start: chrono::NaiveDate },
    #[error("employee is already assigned to this project from {start} to {end}")]
    OverlappingAssignment { start: chrono::NaiveDate, end: String },
    #[error("project is not assigned to this employee on {0}")]
    NotAssigned(chrono::NaiveDate),
    #[error("{0} is not a valid email address")]
    InvalidEmail(String),
}

pub fn parse_number(field: &'static str, value: &str) -> Result<f64, ValidationError> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .ok_or_else(|| ValidationError::InvalidNumber { field, value: value.to_string() })
}

pub fn require(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::Required(field))
    } else {
        Ok(())
    }
}

pub fn check_email(value: &str) -> Result<(), ValidationError> {
    require("Email", value)?;
    let valid = value
        .split_once('@')
        .map_or(false, |(local, domain)| !local.is_empty() && domain.contains('.') && !domain.starts_with('.'));
    if valid {
        Ok(())
    } else {
        Err(ValidationError::InvalidEmail(value.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_numbers_and_rejects_garbage() {
        assert_eq!(parse_number("Hours", " 7.5 "), Ok(7.5));
        assert!(matches!(parse_number("Hours", "seven"), Err(ValidationError::InvalidNumber { .. })));
        assert!(parse_number("Hours", "NaN").is_err());
    }

    #[test]
    fn email_shape() {
        assert!(check_email("a@b.co").is_ok());
        assert_eq!(check_email(""), Err(ValidationError::Required("Email")));
        assert!(check_email("nobody").is_err());
        assert!(check_email("@b.co").is_err());
        assert!(check_email("a@.co").is_err());
    }
}
