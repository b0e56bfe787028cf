use chrono::NaiveDate;

use crate::calendar::CHECKPOINT_DATE_FORMAT;
use crate::contract::ObjectDescriptor;

pub const PREFIX_DELIMITER: &str = "/";

/// Listing prefix for one calendar day. The base prefix is used verbatim;
/// the formatted day and a trailing delimiter are appended to it.
pub fn dated_prefix(base_prefix: &str, day: NaiveDate) -> String {
    format!(
        "{base_prefix}{}{PREFIX_DELIMITER}",
        day.format(CHECKPOINT_DATE_FORMAT)
    )
}

/// Drops the zero-byte folder-marker object whose key equals the prefix
/// itself, keeping only real log objects.
pub fn exclude_folder_marker(
    objects: Vec<ObjectDescriptor>,
    prefix: &str,
) -> Vec<ObjectDescriptor> {
    objects
        .into_iter()
        .filter(|object| object.key != prefix)
        .collect()
}
