//! Duration text normalization.
//!
//! Both sources publish completion times as free text ("8 Hours", "12½ Hours",
//! "--"). Everything funnels through one parser so there is a single place that
//! decides what a duration looks like.

use thiserror::Error;
use tracing::warn;

/// Glyph both sources use for a trailing half hour.
const HALF_GLYPH: char = '½';

/// Texts that mean "nobody measured this".
const UNKNOWN_MARKERS: &[&str] = &["--", "-", "—", "N/A", "n/a"];

/// Errors produced by the strict duration parser.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NormalizeError {
    /// The numeric part is not a decimal number.
    #[error("not a number: {0:?}")]
    NotANumber(String),

    /// Negative or non-finite value.
    #[error("duration out of range: {0}")]
    OutOfRange(f64),
}

/// A duration token split into its half-glyph contribution and its numeric part.
struct Token {
    half: f64,
    whole: Result<f64, NormalizeError>,
}

fn tokenize(text: &str) -> Option<Token> {
    // Only the first word counts, unit words ("Hours") are dropped.
    let token = text.split_whitespace().next()?;
    if UNKNOWN_MARKERS.contains(&token) {
        return None;
    }

    let (number, half) = if token.contains(HALF_GLYPH) {
        (token.replace(HALF_GLYPH, ""), 0.5)
    } else {
        (token.to_string(), 0.0)
    };

    let whole = if number.is_empty() {
        Ok(0.0)
    } else {
        parse_decimal(&number)
    };

    Some(Token { half, whole })
}

/// Parse a bare decimal, accepting a single `,` as the decimal separator.
fn parse_decimal(number: &str) -> Result<f64, NormalizeError> {
    let canonical = if !number.contains('.') && number.matches(',').count() == 1 {
        number.replace(',', ".")
    } else {
        number.to_string()
    };

    let value: f64 = canonical
        .parse()
        .map_err(|_| NormalizeError::NotANumber(number.to_string()))?;

    if !value.is_finite() || value < 0.0 {
        return Err(NormalizeError::OutOfRange(value));
    }
    Ok(value)
}

/// Strictly parse duration text into hours.
///
/// Returns `Ok(None)` for empty text and unmeasured markers such as `--`.
/// Any text whose numeric part does not parse is an error; manual entry uses
/// this to reject bad input.
pub fn parse_hours(text: &str) -> Result<Option<f64>, NormalizeError> {
    match tokenize(text) {
        None => Ok(None),
        Some(token) => Ok(Some(token.whole? + token.half)),
    }
}

/// Best-effort duration parsing used while scraping.
///
/// Unparsable numbers are logged and contribute zero, so a malformed page
/// never aborts a fetch. A `½` glyph still adds its half hour.
pub fn normalize(text: &str) -> Option<f64> {
    let token = tokenize(text)?;
    let whole = match token.whole {
        Ok(whole) => whole,
        Err(e) => {
            warn!(text, error = %e, "Unparsable duration, counting as zero");
            0.0
        }
    };
    Some(whole + token.half)
}
