//! Lens File Parser

use crate::error::*;
use crate::lens::*;
use lens_core::pbrt::Float;
use pest::iterators::Pair;
use pest::Parser;
use std::fs;
use std::result::Result;

#[derive(Parser)]
#[grammar = "parser/grammar.pest"]
struct LensFileParser;

/// Number of fields in each surface record.
const FIELDS_PER_RECORD: usize = 4;

/// Reads a tabular lens prescription. Each data line holds the curvature
/// radius, thickness, index of refraction and aperture diameter of one
/// surface separated by single tabs. Lines starting with `#` and blank lines
/// are skipped. Surfaces are returned front to back, in file order.
///
/// * `path` - Path to file.
pub fn parse_lens_file(path: &str) -> Result<Vec<LensSurface>, LensError> {
    let unparsed_file = fs::read_to_string(path).map_err(|source| LensError::Io {
        path: path.to_string(),
        source,
    })?;

    let surfaces = parse_lens_str(&unparsed_file)?;
    if surfaces.is_empty() {
        return Err(LensError::Empty(path.to_string()));
    }
    Ok(surfaces)
}

/// Parses the contents of a tabular lens prescription. See `parse_lens_file`.
///
/// * `unparsed_file` - File contents.
pub fn parse_lens_str(unparsed_file: &str) -> Result<Vec<LensSurface>, LensError> {
    let file = parse_file_rule(unparsed_file)?;

    let mut surfaces = vec![];
    for pair in file.into_inner() {
        match pair.as_rule() {
            Rule::record => surfaces.push(parse_record(pair)?),
            Rule::comment => trace!("Skipping comment '{}'", pair.as_str()),
            Rule::EOI => (), // End of input.
            _ => unreachable!(),
        }
    }

    Ok(surfaces)
}

/// Parse the initial `file` rule of the grammar and return the resulting token
/// pairs for remaining rules.
///
/// * `unparsed_file` - File contents.
fn parse_file_rule(unparsed_file: &str) -> Result<Pair<'_, Rule>, LensError> {
    LensFileParser::parse(Rule::file, unparsed_file)
        .map_err(|err| LensError::Parse(err.to_string()))?
        .next()
        .ok_or_else(|| LensError::Parse(String::from("missing file rule")))
}

/// Converts a `record` into a lens surface.
///
/// * `record` - The record pair.
fn parse_record(record: Pair<'_, Rule>) -> Result<LensSurface, LensError> {
    let (line, _) = record.as_span().start_pos().line_col();

    let mut values: Vec<Float> = Vec::with_capacity(FIELDS_PER_RECORD);
    for pair in record.into_inner() {
        match pair.as_rule() {
            Rule::separator => {
                if pair.as_str() != "\t" {
                    return Err(LensError::Separator { line });
                }
            }
            Rule::field => {
                // Only the radius may be infinite, for a flat surface.
                let token = pair.as_str();
                let value = token
                    .parse::<Float>()
                    .ok()
                    .filter(|v| v.is_finite() || (values.is_empty() && v.is_infinite()))
                    .ok_or_else(|| LensError::MalformedNumber {
                        line,
                        token: token.to_string(),
                    })?;
                values.push(value);
            }
            _ => unreachable!(),
        }
    }

    match values[..] {
        [radius, thickness, eta, aperture_diameter] => Ok(LensSurface::from_table_row(
            radius,
            thickness,
            eta,
            aperture_diameter,
        )),
        _ => Err(LensError::FieldCount {
            line,
            found: values.len(),
        }),
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
