//! Course field validation.
//!
//! Field-value problems and reference problems are collected separately so
//! the caller can tell a bad payload from a dangling instructor/category id.

use bigdecimal::{BigDecimal, Zero};

use super::types::{Category, CourseInput, Instructor};
use crate::core::error::{CatalogError, CatalogResult, FieldErrors};

pub const MIN_DESCRIPTION_CHARS: usize = 50;
pub const MAX_TITLE_CHARS: usize = 200;
pub const MAX_LANGUAGE_CHARS: usize = 50;

/// Integer digits allowed by `NUMERIC(10, 2)` and `NUMERIC(5, 2)`.
const PRICE_INTEGER_DIGITS: u32 = 8;
const HOURS_INTEGER_DIGITS: u32 = 3;

fn scale(value: &BigDecimal) -> i64 {
    value.normalized().as_bigint_and_exponent().1
}

fn check_decimal(errors: &mut FieldErrors, field: &str, value: &BigDecimal, integer_digits: u32) {
    if scale(value) > 2 {
        errors.add(field, "Ensure that there are no more than 2 decimal places.");
    }
    if value.abs() >= BigDecimal::from(10u64.pow(integer_digits)) {
        errors.add(
            field,
            format!("Ensure that there are no more than {} digits before the decimal point.", integer_digits),
        );
    }
}

/// Checks every field value of a course, independent of storage.
pub fn check_fields(input: &CourseInput) -> FieldErrors {
    let mut errors = FieldErrors::new();

    let title = input.title.trim();
    if title.is_empty() {
        errors.add("title", "Title must not be empty.");
    } else if title.chars().count() > MAX_TITLE_CHARS {
        errors.add("title", format!("Title must be at most {} characters.", MAX_TITLE_CHARS));
    } else if !title.chars().any(char::is_alphanumeric) {
        errors.add("title", "Title must contain at least one letter or digit.");
    }

    if input.description.chars().count() < MIN_DESCRIPTION_CHARS {
        errors.add(
            "description",
            format!("Description must be at least {} characters long.", MIN_DESCRIPTION_CHARS),
        );
    }

    if input.price < BigDecimal::zero() {
        errors.add("price", "Price must be greater than or equal to 0.");
    }
    check_decimal(&mut errors, "price", &input.price, PRICE_INTEGER_DIGITS);

    if !(0..=100).contains(&input.discount_percentage) {
        errors.add("discount_percentage", "Discount percentage must be between 0-100.");
    }

    if input.duration_hours <= BigDecimal::zero() {
        errors.add("duration_hours", "Duration must be greater than 0.");
    }
    check_decimal(&mut errors, "duration_hours", &input.duration_hours, HOURS_INTEGER_DIGITS);

    let language = input.language.trim();
    if language.is_empty() {
        errors.add("language", "Language must not be empty.");
    } else if language.chars().count() > MAX_LANGUAGE_CHARS {
        errors.add(
            "language",
            format!("Language must be at most {} characters.", MAX_LANGUAGE_CHARS),
        );
    }

    errors
}

/// Checks that the referenced instructor and category exist and are active.
pub fn check_references(instructor: Option<&Instructor>, category: Option<&Category>) -> FieldErrors {
    let mut errors = FieldErrors::new();
    match instructor {
        None => errors.add("instructor", "Instructor does not exist."),
        Some(i) if !i.is_active => errors.add("instructor", "Instructor is not active."),
        Some(_) => {}
    }
    match category {
        None => errors.add("category", "Category does not exist."),
        Some(c) if !c.is_active => errors.add("category", "Category is not active."),
        Some(_) => {}
    }
    errors
}

/// Reference-only failures are integrity errors; anything else is a
/// validation error carrying every message.
pub fn verdict(fields: FieldErrors, references: FieldErrors) -> CatalogResult<()> {
    match (fields.is_empty(), references.is_empty()) {
        (true, true) => Ok(()),
        (true, false) => Err(CatalogError::Integrity(references)),
        (false, _) => {
            let mut all = fields;
            all.merge(references);
            Err(CatalogError::Validation(all))
        }
    }
}

/// Stores money and hours at two decimal places.
pub fn normalize(mut input: CourseInput) -> CourseInput {
    input.title = input.title.trim().to_string();
    input.language = input.language.trim().to_string();
    input.price = input.price.with_scale(2);
    input.duration_hours = input.duration_hours.with_scale(2);
    input
}
