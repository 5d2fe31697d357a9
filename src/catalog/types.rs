//! Types for the catalog module: entities, request bodies and response views
use bigdecimal::{BigDecimal, RoundingMode};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Deserializer, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use crate::core::error::FieldErrors;
use crate::core::shared::enums::{CourseLevel, CourseStatus};
use crate::core::shared::schema::{categories, courses, instructors, lessons, sections, users};

pub const DEFAULT_LANGUAGE: &str = "Uzbek";

// ============================================================================
// DATA MODELS
// ============================================================================

// ----- Identity -----

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Queryable, Selectable, Insertable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = instructors)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Instructor {
    pub id: Uuid,
    pub user_id: Uuid,
    pub bio: String,
    pub profile_image: String,
    pub expertise: String,
    pub total_students: i32,
    pub rating: BigDecimal,
    pub is_verified: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

// ----- Catalog -----

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = categories)]
#[diesel(treat_none_as_null = true)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub icon: String,
    pub parent_id: Option<Uuid>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = courses)]
#[diesel(treat_none_as_null = true)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Course {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub instructor_id: Uuid,
    pub category_id: Uuid,
    pub thumbnail: String,
    pub trailer_url: Option<String>,
    pub price: BigDecimal,
    pub discount_percentage: i32,
    pub level: CourseLevel,
    pub status: CourseStatus,
    pub duration_hours: BigDecimal,
    pub requirements: String,
    pub what_you_learn: String,
    pub language: String,
    pub is_featured: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Course {
    pub fn final_price(&self) -> BigDecimal {
        final_price(&self.price, self.discount_percentage)
    }
}

/// `price * (1 - discount / 100)`, rounded half-up to cents.
pub fn final_price(price: &BigDecimal, discount_percentage: i32) -> BigDecimal {
    let remaining = BigDecimal::from(100 - discount_percentage);
    (price * remaining / BigDecimal::from(100)).with_scale_round(2, RoundingMode::HalfUp)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Queryable, Selectable, Insertable)]
#[diesel(table_name = sections)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Section {
    pub id: Uuid,
    pub course_id: Uuid,
    pub title: String,
    pub description: String,
    #[diesel(column_name = position)]
    pub order: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Queryable, Selectable, Insertable)]
#[diesel(table_name = lessons)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Lesson {
    pub id: Uuid,
    pub section_id: Uuid,
    pub title: String,
    pub content: String,
    pub video_url: String,
    pub duration_minutes: i32,
    #[diesel(column_name = position)]
    pub order: i32,
    pub is_preview: bool,
    pub resources: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

// ============================================================================
// REQUESTS
// ============================================================================

/// Distinguishes an absent field (`None`) from an explicit `null` (`Some(None)`).
pub(crate) fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// JSON numbers are read through their shortest textual form so `49.9`
/// becomes exactly 49.9 rather than its binary approximation.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawDecimal {
    Text(String),
    Number(serde_json::Number),
}

impl RawDecimal {
    fn parse<E: serde::de::Error>(self) -> Result<BigDecimal, E> {
        let text = match self {
            Self::Text(text) => text,
            Self::Number(number) => number.to_string(),
        };
        BigDecimal::from_str(text.trim()).map_err(|_| E::custom(format!("'{}' is not a valid number", text)))
    }
}

pub(crate) fn decimal<'de, D>(deserializer: D) -> Result<BigDecimal, D::Error>
where
    D: Deserializer<'de>,
{
    RawDecimal::deserialize(deserializer)?.parse()
}

pub(crate) fn nullable_decimal<'de, D>(deserializer: D) -> Result<Option<Option<BigDecimal>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<RawDecimal>::deserialize(deserializer)?
        .map(RawDecimal::parse)
        .transpose()
        .map(Some)
}

fn default_language() -> String {
    DEFAULT_LANGUAGE.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateInstructorRequest {
    pub user: CreateUserRequest,
    pub bio: String,
    #[serde(default)]
    pub profile_image: String,
    pub expertise: String,
    #[serde(default)]
    pub is_verified: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCategoryRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default, alias = "parent_id")]
    pub parent: Option<Uuid>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateCategoryRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub icon: Option<String>,
    #[serde(default, alias = "parent_id", deserialize_with = "double_option")]
    pub parent: Option<Option<Uuid>>,
    pub is_active: Option<bool>,
}

/// Writable course fields. Used as the body of create and full-replace
/// requests and as the merged result of a partial update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseInput {
    pub title: String,
    pub description: String,
    #[serde(alias = "instructor_id")]
    pub instructor: Uuid,
    #[serde(alias = "category_id")]
    pub category: Uuid,
    #[serde(default)]
    pub thumbnail: String,
    #[serde(default)]
    pub trailer_url: Option<String>,
    #[serde(deserialize_with = "decimal")]
    pub price: BigDecimal,
    #[serde(default)]
    pub discount_percentage: i32,
    pub level: CourseLevel,
    #[serde(default)]
    pub status: CourseStatus,
    #[serde(deserialize_with = "decimal")]
    pub duration_hours: BigDecimal,
    #[serde(default)]
    pub requirements: String,
    #[serde(default)]
    pub what_you_learn: String,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default)]
    pub is_featured: bool,
}

impl From<&Course> for CourseInput {
    fn from(course: &Course) -> Self {
        Self {
            title: course.title.clone(),
            description: course.description.clone(),
            instructor: course.instructor_id,
            category: course.category_id,
            thumbnail: course.thumbnail.clone(),
            trailer_url: course.trailer_url.clone(),
            price: course.price.clone(),
            discount_percentage: course.discount_percentage,
            level: course.level,
            status: course.status,
            duration_hours: course.duration_hours.clone(),
            requirements: course.requirements.clone(),
            what_you_learn: course.what_you_learn.clone(),
            language: course.language.clone(),
            is_featured: course.is_featured,
        }
    }
}

/// Partial course update. Outer `None` leaves the field alone; `Some(None)`
/// is an explicit `null`, which only `trailer_url` accepts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CoursePatch {
    #[serde(default, deserialize_with = "double_option")]
    pub title: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    #[serde(default, alias = "instructor_id", deserialize_with = "double_option")]
    pub instructor: Option<Option<Uuid>>,
    #[serde(default, alias = "category_id", deserialize_with = "double_option")]
    pub category: Option<Option<Uuid>>,
    #[serde(default, deserialize_with = "double_option")]
    pub thumbnail: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub trailer_url: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable_decimal")]
    pub price: Option<Option<BigDecimal>>,
    #[serde(default, deserialize_with = "double_option")]
    pub discount_percentage: Option<Option<i32>>,
    #[serde(default, deserialize_with = "double_option")]
    pub level: Option<Option<CourseLevel>>,
    #[serde(default, deserialize_with = "double_option")]
    pub status: Option<Option<CourseStatus>>,
    #[serde(default, deserialize_with = "nullable_decimal")]
    pub duration_hours: Option<Option<BigDecimal>>,
    #[serde(default, deserialize_with = "double_option")]
    pub requirements: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub what_you_learn: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub language: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub is_featured: Option<Option<bool>>,
}

fn set<T>(errors: &mut FieldErrors, field: &str, value: Option<Option<T>>, slot: &mut T) {
    match value {
        None => {}
        Some(None) => errors.add(field, "This field may not be null."),
        Some(Some(value)) => *slot = value,
    }
}

impl CoursePatch {
    /// Merges the patch over `input`. Every explicit `null` on a required
    /// field is reported.
    pub fn apply(self, mut input: CourseInput) -> Result<CourseInput, FieldErrors> {
        let mut errors = FieldErrors::new();
        set(&mut errors, "title", self.title, &mut input.title);
        set(&mut errors, "description", self.description, &mut input.description);
        set(&mut errors, "instructor", self.instructor, &mut input.instructor);
        set(&mut errors, "category", self.category, &mut input.category);
        set(&mut errors, "thumbnail", self.thumbnail, &mut input.thumbnail);
        if let Some(trailer_url) = self.trailer_url {
            input.trailer_url = trailer_url;
        }
        set(&mut errors, "price", self.price, &mut input.price);
        set(
            &mut errors,
            "discount_percentage",
            self.discount_percentage,
            &mut input.discount_percentage,
        );
        set(&mut errors, "level", self.level, &mut input.level);
        set(&mut errors, "status", self.status, &mut input.status);
        set(&mut errors, "duration_hours", self.duration_hours, &mut input.duration_hours);
        set(&mut errors, "requirements", self.requirements, &mut input.requirements);
        set(&mut errors, "what_you_learn", self.what_you_learn, &mut input.what_you_learn);
        set(&mut errors, "language", self.language, &mut input.language);
        set(&mut errors, "is_featured", self.is_featured, &mut input.is_featured);
        if errors.is_empty() {
            Ok(input)
        } else {
            Err(errors)
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSectionRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub order: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateLessonRequest {
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub video_url: String,
    #[serde(default)]
    pub duration_minutes: i32,
    pub order: Option<i32>,
    #[serde(default)]
    pub is_preview: bool,
    pub resources: Option<serde_json::Value>,
}

// ============================================================================
// RESPONSE VIEWS
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

impl From<User> for UserSummary {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstructorView {
    pub id: Uuid,
    pub user: UserSummary,
    pub bio: String,
    pub profile_image: String,
    pub expertise: String,
    pub total_students: i32,
    pub rating: BigDecimal,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
}

impl InstructorView {
    pub fn new(instructor: Instructor, user: User) -> Self {
        Self {
            id: instructor.id,
            user: user.into(),
            bio: instructor.bio,
            profile_image: instructor.profile_image,
            expertise: instructor.expertise,
            total_students: instructor.total_students,
            rating: instructor.rating,
            is_verified: instructor.is_verified,
            created_at: instructor.created_at,
        }
    }
}

/// Category as nested inside course views (no parent, no active flag).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategorySummary {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub icon: String,
}

impl From<Category> for CategorySummary {
    fn from(category: Category) -> Self {
        Self {
            id: category.id,
            name: category.name,
            slug: category.slug,
            description: category.description,
            icon: category.icon,
        }
    }
}

/// Returned by create and update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseView {
    #[serde(flatten)]
    pub course: Course,
    pub final_price: BigDecimal,
}

impl From<Course> for CourseView {
    fn from(course: Course) -> Self {
        let final_price = course.final_price();
        Self { course, final_price }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseListItem {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub thumbnail: String,
    pub price: BigDecimal,
    pub discount_percentage: i32,
    pub final_price: BigDecimal,
    pub level: CourseLevel,
    pub status: CourseStatus,
    pub duration_hours: BigDecimal,
    pub language: String,
    pub created_at: DateTime<Utc>,
    pub category: CategorySummary,
    pub instructor: InstructorView,
}

impl CourseListItem {
    pub fn new(course: Course, category: CategorySummary, instructor: InstructorView) -> Self {
        let final_price = course.final_price();
        Self {
            id: course.id,
            title: course.title,
            slug: course.slug,
            description: course.description,
            thumbnail: course.thumbnail,
            price: course.price,
            discount_percentage: course.discount_percentage,
            final_price,
            level: course.level,
            status: course.status,
            duration_hours: course.duration_hours,
            language: course.language,
            created_at: course.created_at,
            category,
            instructor,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionDetail {
    #[serde(flatten)]
    pub section: Section,
    pub lessons: Vec<Lesson>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseDetail {
    #[serde(flatten)]
    pub course: Course,
    pub final_price: BigDecimal,
    pub category: CategorySummary,
    pub instructor: InstructorView,
    pub sections: Vec<SectionDetail>,
    pub students_count: i64,
    pub reviews_count: i64,
    pub average_rating: Option<BigDecimal>,
}
