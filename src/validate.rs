use crate::{error::ValidationError, mapping::CodeMapping};

/// Checks every header code against the mapping and reports all unknown codes
/// at once, in header order.
pub fn validate_codes(codes: &[String], mapping: &CodeMapping) -> Result<(), ValidationError> {
    let messages = codes
        .iter()
        .filter(|code| !mapping.contains_key(code))
        .map(|code| format!("Spreadsheet header \"{code}\" is not present in this survey"))
        .collect::<Vec<_>>();
    if messages.is_empty() {
        Ok(())
    } else {
        Err(ValidationError { messages })
    }
}
