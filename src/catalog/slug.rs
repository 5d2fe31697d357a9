//! URL slugs for courses and categories.

use deunicode::deunicode_with_tofu;
use std::collections::HashSet;
use std::future::Future;

use crate::core::error::{CatalogError, CatalogResult};
use crate::core::store::{StoreError, COURSES_SLUG_KEY};

/// Transliterates the title to ASCII, lowercases it, keeps ASCII letters and
/// digits and collapses every other run of characters into a single `-`.
pub fn slugify(title: &str) -> CatalogResult<String> {
    if title.trim().is_empty() {
        return Err(CatalogError::field("title", "Title must not be empty"));
    }

    let ascii = deunicode_with_tofu(title, "-");
    let mut slug = String::with_capacity(ascii.len());
    let mut pending_dash = false;
    for ch in ascii.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }

    if slug.is_empty() {
        return Err(CatalogError::field(
            "title",
            "Title must contain at least one letter or digit",
        ));
    }
    Ok(slug)
}

/// Picks `base`, or the first free `base-N` for N = 1, 2, ...
pub fn first_free(base: &str, existing: &HashSet<String>) -> String {
    if !existing.contains(base) {
        return base.to_string();
    }
    (1u64..)
        .map(|n| format!("{}-{}", base, n))
        .find(|candidate| !existing.contains(candidate))
        .unwrap_or_else(|| base.to_string())
}

pub fn assign_slug(title: &str, existing: &HashSet<String>) -> CatalogResult<String> {
    let base = slugify(title)?;
    Ok(first_free(&base, existing))
}

/// Category slugs embed the id prefix, so they never need a suffix search.
pub fn category_slug(name: &str, id: &uuid::Uuid) -> CatalogResult<String> {
    let base = slugify(name).map_err(|_| {
        CatalogError::field("name", "Name must contain at least one letter or digit")
    })?;
    let simple = id.simple().to_string();
    Ok(format!("{}-{}", base, &simple[..8]))
}

/// Re-runs `op` when it loses the course slug uniqueness race, at most
/// `attempts` times in total.
pub async fn retry_on_slug_conflict<T, F, Fut>(attempts: u32, mut op: F) -> CatalogResult<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, CatalogAttempt>>,
{
    let attempts = attempts.max(1);
    let mut attempt = 1;
    loop {
        match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(CatalogAttempt::Store(err)) if err.is_conflict_on(COURSES_SLUG_KEY) && attempt < attempts => {
                log::warn!(
                    "Course slug taken by a concurrent write, regenerating (attempt {}/{})",
                    attempt,
                    attempts
                );
                attempt += 1;
            }
            Err(CatalogAttempt::Store(err)) => return Err(err.into()),
            Err(CatalogAttempt::Failed(err)) => return Err(err),
        }
    }
}

/// Outcome of one attempt inside [`retry_on_slug_conflict`]: storage errors
/// stay raw so the slug conflict can be recognised.
#[derive(Debug)]
pub enum CatalogAttempt {
    Store(StoreError),
    Failed(CatalogError),
}

impl From<StoreError> for CatalogAttempt {
    fn from(err: StoreError) -> Self {
        Self::Store(err)
    }
}

impl From<CatalogError> for CatalogAttempt {
    fn from(err: CatalogError) -> Self {
        Self::Failed(err)
    }
}
