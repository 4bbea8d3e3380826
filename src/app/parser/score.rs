//! Score notation arithmetic
//!
//! A round is written either as a gross stroke count or relative to the
//! course par ("LEVEL", "+3", "-2"). Given the par of the tee played, either
//! form yields the other.

use once_cell::sync::Lazy;
use regex::Regex;

static RELATIVE_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([+-]?)(\d+)$").expect("static par token regex"));

/// Relative-to-par text for a gross score, `None` if out of range
pub fn par_text_from_gross(gross: i32, course_par: i32) -> Option<String> {
    let text = match gross.checked_sub(course_par)? {
        0 => "LEVEL".to_string(),
        d if d > 0 => format!("+{}", d),
        d => d.to_string(),
    };
    Some(text)
}

/// Gross score for a relative-to-par token, if the token is recognised
pub fn gross_from_par_text(text: &str, course_par: i32) -> Option<i32> {
    let token = text.trim().to_uppercase();
    match token.as_str() {
        "LEVEL" | "EVEN" | "E" => return Some(course_par),
        _ => {}
    }

    let captures = RELATIVE_TOKEN.captures(&token)?;
    let amount: i32 = captures.get(2)?.as_str().parse().ok()?;
    match captures.get(1).map(|sign| sign.as_str()) {
        Some("-") => course_par.checked_sub(amount),
        _ => course_par.checked_add(amount),
    }
}

/// Fill whichever of gross and par text is missing
///
/// Nothing happens unless exactly one of the two is present and a course
/// par is known. Returns whether a value was derived.
pub fn derive_missing(
    gross: &mut Option<i32>,
    par_text: &mut Option<String>,
    course_par: Option<i32>,
) -> bool {
    let Some(course_par) = course_par else {
        return false;
    };

    match (gross.as_ref(), par_text.as_ref()) {
        (Some(g), None) => match par_text_from_gross(*g, course_par) {
            Some(derived) => {
                *par_text = Some(derived);
                true
            }
            None => false,
        },
        (None, Some(text)) => match gross_from_par_text(text, course_par) {
            Some(derived) => {
                *gross = Some(derived);
                true
            }
            None => false,
        },
        _ => false,
    }
}
