//! Course listing filters.
//!
//! Raw query-string parameters arrive as [`CourseListParams`] and are parsed
//! into a typed [`CourseQuery`]. Every parameter is optional; the ones given
//! are combined with AND, and ordering is applied last with a stable sort so
//! ties keep the order of the underlying collection.

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering as CmpOrdering;
use std::str::FromStr;
use uuid::Uuid;

use super::types::Course;
use crate::core::error::{CatalogError, FieldErrors};
use crate::core::shared::enums::CourseLevel;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CourseListParams {
    pub category: Option<String>,
    pub instructor: Option<String>,
    pub level: Option<String>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
    pub is_featured: Option<String>,
    pub search: Option<String>,
    pub ordering: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderField {
    Title,
    Price,
    DiscountPercentage,
    DurationHours,
    Level,
    CreatedAt,
    UpdatedAt,
}

impl OrderField {
    pub const ALLOWED: [&'static str; 7] = [
        "title",
        "price",
        "discount_percentage",
        "duration_hours",
        "level",
        "created_at",
        "updated_at",
    ];

    fn compare(&self, a: &Course, b: &Course) -> CmpOrdering {
        match self {
            Self::Title => a.title.cmp(&b.title),
            Self::Price => a.price.cmp(&b.price),
            Self::DiscountPercentage => a.discount_percentage.cmp(&b.discount_percentage),
            Self::DurationHours => a.duration_hours.cmp(&b.duration_hours),
            Self::Level => a.level.cmp(&b.level),
            Self::CreatedAt => a.created_at.cmp(&b.created_at),
            Self::UpdatedAt => a.updated_at.cmp(&b.updated_at),
        }
    }
}

impl FromStr for OrderField {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "title" => Ok(Self::Title),
            "price" => Ok(Self::Price),
            "discount_percentage" => Ok(Self::DiscountPercentage),
            "duration_hours" => Ok(Self::DurationHours),
            "level" => Ok(Self::Level),
            "created_at" => Ok(Self::CreatedAt),
            "updated_at" => Ok(Self::UpdatedAt),
            _ => Err(format!(
                "Unknown ordering field '{}'. Allowed: {}",
                s,
                Self::ALLOWED.join(", ")
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ordering {
    pub field: OrderField,
    pub descending: bool,
}

impl FromStr for Ordering {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (descending, name) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s),
        };
        Ok(Self {
            field: name.parse()?,
            descending,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CourseQuery {
    pub category: Option<Uuid>,
    pub instructor: Option<Uuid>,
    pub level: Option<CourseLevel>,
    pub min_price: Option<BigDecimal>,
    pub max_price: Option<BigDecimal>,
    pub is_featured: Option<bool>,
    /// Lowercased title fragment.
    pub search: Option<String>,
    pub ordering: Option<Ordering>,
}

fn present(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_field<T: FromStr>(
    errors: &mut FieldErrors,
    field: &str,
    raw: Option<String>,
    message: impl Fn(&str) -> String,
) -> Option<T> {
    let raw = present(raw)?;
    match raw.parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            errors.add(field, message(&raw));
            None
        }
    }
}

impl TryFrom<CourseListParams> for CourseQuery {
    type Error = CatalogError;

    fn try_from(params: CourseListParams) -> Result<Self, Self::Error> {
        let mut errors = FieldErrors::new();

        let category = parse_field::<Uuid>(&mut errors, "category", params.category, |raw| {
            format!("'{}' is not a valid id", raw)
        });
        let instructor = parse_field::<Uuid>(&mut errors, "instructor", params.instructor, |raw| {
            format!("'{}' is not a valid id", raw)
        });
        let level = parse_field::<CourseLevel>(&mut errors, "level", params.level, |raw| {
            format!("'{}' is not one of beginner, intermediate, advanced", raw)
        });
        let min_price = parse_field::<BigDecimal>(&mut errors, "min_price", params.min_price, |raw| {
            format!("'{}' is not a valid number", raw)
        });
        let max_price = parse_field::<BigDecimal>(&mut errors, "max_price", params.max_price, |raw| {
            format!("'{}' is not a valid number", raw)
        });

        let is_featured = present(params.is_featured).and_then(|raw| match raw.to_lowercase().as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        });

        let search = present(params.search).map(|s| s.to_lowercase());

        let ordering = match present(params.ordering) {
            Some(raw) => match raw.parse::<Ordering>() {
                Ok(ordering) => Some(ordering),
                Err(msg) => {
                    errors.add("ordering", msg);
                    None
                }
            },
            None => None,
        };

        if !errors.is_empty() {
            return Err(CatalogError::Validation(errors));
        }

        Ok(Self {
            category,
            instructor,
            level,
            min_price,
            max_price,
            is_featured,
            search,
            ordering,
        })
    }
}

impl CourseQuery {
    pub fn matches(&self, course: &Course) -> bool {
        if self.category.is_some_and(|id| course.category_id != id) {
            return false;
        }
        if self.instructor.is_some_and(|id| course.instructor_id != id) {
            return false;
        }
        if self.level.is_some_and(|level| course.level != level) {
            return false;
        }
        if let Some(min) = &self.min_price {
            if course.price < *min {
                return false;
            }
        }
        if let Some(max) = &self.max_price {
            if course.price > *max {
                return false;
            }
        }
        if self.is_featured.is_some_and(|featured| course.is_featured != featured) {
            return false;
        }
        if let Some(search) = &self.search {
            if !course.title.to_lowercase().contains(search.as_str()) {
                return false;
            }
        }
        true
    }

    /// Filters then orders. `courses` must already be in insertion order.
    pub fn apply(&self, courses: Vec<Course>) -> Vec<Course> {
        let mut matched: Vec<Course> = courses.into_iter().filter(|c| self.matches(c)).collect();
        if let Some(ordering) = self.ordering {
            if ordering.descending {
                matched.sort_by(|a, b| ordering.field.compare(b, a));
            } else {
                matched.sort_by(|a, b| ordering.field.compare(a, b));
            }
        }
        matched
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::shared::enums::CourseStatus;
    use chrono::{Duration, Utc};

    fn course(title: &str, price: &str, featured: bool, minutes_ago: i64) -> Course {
        let at = Utc::now() - Duration::minutes(minutes_ago);
        Course {
            id: Uuid::new_v4(),
            title: title.to_string(),
            slug: title.to_lowercase(),
            description: "d".repeat(50),
            instructor_id: Uuid::nil(),
            category_id: Uuid::nil(),
            thumbnail: String::new(),
            trailer_url: None,
            price: BigDecimal::from_str(price).unwrap(),
            discount_percentage: 0,
            level: CourseLevel::Beginner,
            status: CourseStatus::Published,
            duration_hours: BigDecimal::from(1),
            requirements: String::new(),
            what_you_learn: String::new(),
            language: "Uzbek".to_string(),
            is_featured: featured,
            created_at: at,
            updated_at: at,
        }
    }

    fn params(pairs: &[(&str, &str)]) -> CourseListParams {
        let mut p = CourseListParams::default();
        for (key, value) in pairs {
            let value = Some(value.to_string());
            match *key {
                "category" => p.category = value,
                "instructor" => p.instructor = value,
                "level" => p.level = value,
                "min_price" => p.min_price = value,
                "max_price" => p.max_price = value,
                "is_featured" => p.is_featured = value,
                "search" => p.search = value,
                "ordering" => p.ordering = value,
                _ => unreachable!(),
            }
        }
        p
    }

    #[test]
    fn test_price_window_is_inclusive() {
        let courses = vec![
            course("A", "10", false, 3),
            course("B", "50", false, 2),
            course("C", "100", false, 1),
        ];
        let query = CourseQuery::try_from(params(&[("min_price", "10"), ("max_price", "50")])).unwrap();
        let titles: Vec<_> = query.apply(courses).into_iter().map(|c| c.title).collect();
        assert_eq!(titles, vec!["A", "B"]);
    }

    #[test]
    fn test_is_featured_case_insensitive_and_ignores_garbage() {
        let courses = vec![course("A", "1", true, 2), course("B", "1", false, 1)];
        let query = CourseQuery::try_from(params(&[("is_featured", "TRUE")])).unwrap();
        assert_eq!(query.apply(courses.clone()).len(), 1);

        let query = CourseQuery::try_from(params(&[("is_featured", "yes")])).unwrap();
        assert_eq!(query.is_featured, None);
        assert_eq!(query.apply(courses).len(), 2);
    }

    #[test]
    fn test_search_matches_title_substring() {
        let courses = vec![course("Intro to Rust", "1", false, 2), course("Go Basics", "1", false, 1)];
        let query = CourseQuery::try_from(params(&[("search", "RUST")])).unwrap();
        let found = query.apply(courses);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].title, "Intro to Rust");
    }

    #[test]
    fn test_descending_price_keeps_ties_stable() {
        let courses = vec![
            course("first-tie", "20", false, 4),
            course("cheap", "5", false, 3),
            course("second-tie", "20", false, 2),
            course("pricey", "99", false, 1),
        ];
        let query = CourseQuery::try_from(params(&[("ordering", "-price")])).unwrap();
        let titles: Vec<_> = query.apply(courses).into_iter().map(|c| c.title).collect();
        assert_eq!(titles, vec!["pricey", "first-tie", "second-tie", "cheap"]);
    }

    #[test]
    fn test_malformed_parameters_are_rejected_together() {
        let err = CourseQuery::try_from(params(&[
            ("category", "not-a-uuid"),
            ("min_price", "cheap"),
            ("level", "expert"),
            ("ordering", "-popularity"),
        ]))
        .unwrap_err();
        match err {
            CatalogError::Validation(fields) => {
                for field in ["category", "min_price", "level", "ordering"] {
                    assert!(fields.contains(field), "missing {}", field);
                }
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_blank_parameters_are_absent() {
        let query = CourseQuery::try_from(params(&[("category", ""), ("search", "  ")])).unwrap();
        assert_eq!(query, CourseQuery::default());
    }
}
