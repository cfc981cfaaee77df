//! Reading and writing the JSON artifacts exchanged between stages.

use std::{
    borrow::Cow,
    fs::{self, File},
    io::{BufWriter, Write},
    path::Path,
};

use serde::{de::DeserializeOwned, Serialize};

use crate::error::PipelineError;

/// Reads a JSON file. Bare `NaN` and `Infinity` tokens, as written by Python's
/// `json.dump`, are read as missing values.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, PipelineError> {
    let text =
        fs::read_to_string(path).map_err(|e| PipelineError::MissingInput(path.to_path_buf(), e))?;

    serde_json::from_str(&replace_non_finite_tokens(&text)).map_err(|e| {
        PipelineError::MalformedInput {
            path: path.to_path_buf(),
            message: e.to_string(),
        }
    })
}

/// Writes `value` as JSON, creating the parent directory if needed.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), PipelineError> {
    let io_err = |e| PipelineError::OutputWrite(path.to_path_buf(), e);

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io_err)?;
    }

    let mut writer = BufWriter::new(File::create(path).map_err(io_err)?);
    serde_json::to_writer(&mut writer, value)
        .map_err(|e| PipelineError::OutputWrite(path.to_path_buf(), e.into()))?;
    writer.flush().map_err(io_err)?;

    Ok(())
}

const NON_FINITE_TOKENS: [&str; 3] = ["-Infinity", "Infinity", "NaN"];

/// Replaces non-finite number tokens outside string literals with `null`.
pub fn replace_non_finite_tokens(text: &str) -> Cow<'_, str> {
    if !text.contains("NaN") && !text.contains("Infinity") {
        return Cow::Borrowed(text);
    }

    let mut out = String::with_capacity(text.len());
    let mut in_string = false;
    let mut escaped = false;
    let mut rest = text;

    while let Some(c) = rest.chars().next() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
        } else if c == '"' {
            in_string = true;
        } else if let Some(token) = NON_FINITE_TOKENS.iter().find(|t| rest.starts_with(**t)) {
            out.push_str("null");
            rest = &rest[token.len()..];
            continue;
        }

        out.push(c);
        rest = &rest[c.len_utf8()..];
    }

    Cow::Owned(out)
}

// -- Tests -------------------------------------------------------------------
