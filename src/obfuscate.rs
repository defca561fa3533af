//! Batch-scoped record identifier obfuscation.
//!
//! The first column of every response row carries the original sequential
//! record id. Each import draws one [`BatchSalt`] and rewrites every id `v` as
//! the integer spelled by `format!("{salt:04}{v:05}")`. Within a batch the
//! mapping is injective because the salt prefix is constant; across batches it
//! only spreads ids over the salt space and offers no secrecy.

use rand::Rng;

use crate::{error::IdentifierError, responses::CellValue};

pub const SALT_LIMIT: u16 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchSalt(u16);

impl BatchSalt {
    pub fn new(value: u16) -> Result<Self, IdentifierError> {
        if value < SALT_LIMIT {
            Ok(Self(value))
        } else {
            Err(IdentifierError::SaltOutOfRange(value))
        }
    }

    pub fn random() -> Self {
        Self(rand::rng().random_range(0..SALT_LIMIT))
    }

    pub fn value(&self) -> u16 {
        self.0
    }

    /// Obfuscated form of a single original id.
    pub fn apply(&self, original: u64) -> Option<i64> {
        format!("{:04}{:05}", self.0, original).parse().ok()
    }
}

/// Rewrites the first value of every row in place.
pub fn obfuscate_ids(rows: &mut [Vec<CellValue>], salt: BatchSalt) -> Result<(), IdentifierError> {
    for (idx, row) in rows.iter_mut().enumerate() {
        let Some(first) = row.first_mut() else {
            continue;
        };
        let row_number = idx + 1;
        let original = original_id(first).ok_or_else(|| IdentifierError::NotAnInteger {
            row: row_number,
            value: first.to_string(),
        })?;
        let obfuscated = salt.apply(original).ok_or_else(|| IdentifierError::Overflow {
            row: row_number,
            digits: format!("{:04}{:05}", salt.value(), original),
        })?;
        *first = CellValue::Integer(obfuscated);
    }
    Ok(())
}

fn original_id(cell: &CellValue) -> Option<u64> {
    match cell {
        CellValue::Integer(i) => u64::try_from(*i).ok(),
        CellValue::Float(f) if f.fract() == 0.0 && *f >= 0.0 && *f < u64::MAX as f64 => {
            Some(*f as u64)
        }
        CellValue::Text(s) => {
            let trimmed = s.trim();
            if !trimmed.is_empty() && trimmed.bytes().all(|b| b.is_ascii_digit()) {
                trimmed.parse().ok()
            } else {
                None
            }
        }
        _ => None,
    }
}
