use chrono::NaiveDate;

pub const CHECKPOINT_DATE_FORMAT: &str = "%Y/%m/%d";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckpointParseError {
    value: String,
    source: chrono::ParseError,
}

impl CheckpointParseError {
    pub fn value(&self) -> &str {
        &self.value
    }
}

impl std::fmt::Display for CheckpointParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid checkpoint date '{}': {}", self.value, self.source)
    }
}

impl std::error::Error for CheckpointParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

pub fn parse_checkpoint(value: &str) -> Result<NaiveDate, CheckpointParseError> {
    NaiveDate::parse_from_str(value.trim(), CHECKPOINT_DATE_FORMAT).map_err(|source| {
        CheckpointParseError {
            value: value.to_string(),
            source,
        }
    })
}

pub fn format_checkpoint(day: NaiveDate) -> String {
    day.format(CHECKPOINT_DATE_FORMAT).to_string()
}

/// Consecutive calendar days after `checkpoint` and before `today`, ascending.
pub fn pending_days(checkpoint: NaiveDate, today: NaiveDate) -> Vec<NaiveDate> {
    let mut days = Vec::new();
    let mut cursor = checkpoint;
    while let Some(day) = cursor.succ_opt() {
        if day >= today {
            break;
        }
        days.push(day);
        cursor = day;
    }
    days
}
