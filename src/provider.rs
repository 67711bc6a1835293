//! Reading signature sets from a file or stdin
//!
//! Two encodings are understood: a JSON array of `{r, s, z}` objects, or CSV
//! whose header names `r`, `s` and `z` in any order and case. A leading byte
//! order mark is ignored.

use crate::campaign::MIN_SIGNATURES;
use crate::error::InputError;
use crate::signature::{Signature, SignatureInput};
use csv::StringRecord;
use std::io;

const BOM: char = '\u{FEFF}';
const COLUMNS: [&str; 3] = ["r", "s", "z"];

/// Reads `input`, a path or `-` for stdin, and parses it.
pub fn load_signatures(input: &str) -> Result<Vec<Signature>, InputError> {
    let (origin, read) = if input == "-" {
        ("stdin", io::read_to_string(io::stdin()))
    } else {
        (input, std::fs::read_to_string(input))
    };
    let text = read.map_err(|source| InputError::Read {
        origin: origin.to_string(),
        source,
    })?;

    parse_signatures(&text)
}

/// Decodes a signature set and checks it is large enough to search.
pub fn parse_signatures(text: &str) -> Result<Vec<Signature>, InputError> {
    let text = text.trim_start_matches(BOM);
    let rows = if text.trim_start().starts_with('[') {
        serde_json::from_str::<Vec<SignatureInput>>(text)?
    } else {
        csv_rows(text)?
    };

    let signatures = rows
        .into_iter()
        .enumerate()
        .map(|(index, row)| {
            Signature::try_from(row).map_err(|e| InputError::Value {
                index,
                reason: format!("{e:#}"),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    if signatures.len() < MIN_SIGNATURES {
        return Err(InputError::TooFew {
            required: MIN_SIGNATURES,
            actual: signatures.len(),
        });
    }
    Ok(signatures)
}

fn csv_rows(text: &str) -> Result<Vec<SignatureInput>, InputError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let header: StringRecord = reader
        .headers()
        .map_err(|_| InputError::UnknownFormat)?
        .iter()
        .map(str::to_ascii_lowercase)
        .collect();
    if !COLUMNS.iter().all(|col| header.iter().any(|h| h == *col)) {
        return Err(InputError::UnknownFormat);
    }

    reader
        .records()
        .enumerate()
        .map(|(row, record)| {
            record
                .and_then(|record| record.deserialize(Some(&header)))
                .map_err(|source| InputError::Csv { row, source })
        })
        .collect()
}
