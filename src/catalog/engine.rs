use bigdecimal::{BigDecimal, RoundingMode};
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

use super::filter::{CourseListParams, CourseQuery};
use super::slug::{self, CatalogAttempt};
use super::types::{
    Category, CategorySummary, Course, CourseDetail, CourseInput, CourseListItem, CoursePatch, CourseView,
    CreateCategoryRequest, CreateInstructorRequest, CreateLessonRequest, CreateSectionRequest, Instructor,
    InstructorView, Lesson, Section, SectionDetail, UpdateCategoryRequest, User,
};
use super::validation;
use crate::core::error::{CatalogError, CatalogResult, FieldErrors};
use crate::core::store::{CatalogStore, StoreError, USERS_USERNAME_KEY};

const MAX_NAME_CHARS: usize = 100;
const MAX_SECTION_TITLE_CHARS: usize = 200;

/// One past the largest sibling order, or 1 for the first child.
fn next_order(orders: impl Iterator<Item = i32>) -> CatalogResult<i32> {
    match orders.max() {
        None => Ok(1),
        Some(max) => max.checked_add(1).ok_or_else(|| {
            CatalogError::field("order", "No order is left after the last sibling; pass an explicit order.")
        }),
    }
}

fn build_course(id: Uuid, input: CourseInput, slug: String, created_at: DateTime<Utc>) -> Course {
    Course {
        id,
        title: input.title,
        slug,
        description: input.description,
        instructor_id: input.instructor,
        category_id: input.category,
        thumbnail: input.thumbnail,
        trailer_url: input.trailer_url,
        price: input.price,
        discount_percentage: input.discount_percentage,
        level: input.level,
        status: input.status,
        duration_hours: input.duration_hours,
        requirements: input.requirements,
        what_you_learn: input.what_you_learn,
        language: input.language,
        is_featured: input.is_featured,
        created_at,
        updated_at: Utc::now(),
    }
}

/// Catalog operations: instructors, categories, courses and their content.
#[derive(Clone)]
pub struct CatalogEngine<S> {
    store: S,
    slug_retry_attempts: u32,
}

impl<S: CatalogStore> CatalogEngine<S> {
    pub fn new(store: S, slug_retry_attempts: u32) -> Self {
        Self {
            store,
            slug_retry_attempts,
        }
    }

    // ------------------------------------------------------------------
    // Instructors
    // ------------------------------------------------------------------

    pub async fn create_instructor(&self, request: CreateInstructorRequest) -> CatalogResult<InstructorView> {
        let mut errors = FieldErrors::new();
        let username = request.user.username.trim().to_string();
        if username.is_empty() {
            errors.add("user.username", "Username must not be empty.");
        }
        if request.expertise.trim().is_empty() {
            errors.add("expertise", "Expertise must not be empty.");
        }
        if !errors.is_empty() {
            return Err(CatalogError::Validation(errors));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            username,
            email: request.user.email,
            first_name: request.user.first_name,
            last_name: request.user.last_name,
            created_at: now,
        };
        let instructor = Instructor {
            id: Uuid::new_v4(),
            user_id: user.id,
            bio: request.bio,
            profile_image: request.profile_image,
            expertise: request.expertise.trim().to_string(),
            total_students: 0,
            rating: BigDecimal::from(0).with_scale(2),
            is_verified: request.is_verified,
            is_active: true,
            created_at: now,
        };

        let saved = match self.store.insert_instructor(user.clone(), instructor).await {
            Ok(saved) => saved,
            Err(err) if err.is_conflict_on(USERS_USERNAME_KEY) => {
                return Err(CatalogError::Conflict(format!(
                    "A user named '{}' already exists",
                    user.username
                )))
            }
            Err(err) => return Err(err.into()),
        };
        log::info!("Created instructor {} for user {}", saved.id, user.username);
        Ok(InstructorView::new(saved, user))
    }

    pub async fn get_instructor(&self, id: Uuid) -> CatalogResult<InstructorView> {
        let instructor = self
            .store
            .get_instructor(id)
            .await?
            .ok_or_else(|| CatalogError::not_found("Instructor"))?;
        self.instructor_view(instructor).await
    }

    pub async fn list_instructors(&self) -> CatalogResult<Vec<InstructorView>> {
        let mut views = Vec::new();
        for instructor in self.store.list_instructors().await? {
            views.push(self.instructor_view(instructor).await?);
        }
        Ok(views)
    }

    async fn instructor_view(&self, instructor: Instructor) -> CatalogResult<InstructorView> {
        let user = self
            .store
            .get_user(instructor.user_id)
            .await?
            .ok_or_else(|| CatalogError::not_found("User"))?;
        Ok(InstructorView::new(instructor, user))
    }

    // ------------------------------------------------------------------
    // Categories
    // ------------------------------------------------------------------

    fn check_category_name(name: &str, errors: &mut FieldErrors) {
        let name = name.trim();
        if name.is_empty() {
            errors.add("name", "Name must not be empty.");
        } else if name.chars().count() > MAX_NAME_CHARS {
            errors.add("name", format!("Name must be at most {} characters.", MAX_NAME_CHARS));
        }
    }

    pub async fn create_category(&self, request: CreateCategoryRequest) -> CatalogResult<Category> {
        let mut errors = FieldErrors::new();
        Self::check_category_name(&request.name, &mut errors);
        if !errors.is_empty() {
            return Err(CatalogError::Validation(errors));
        }

        if let Some(parent) = request.parent {
            if self.store.get_category(parent).await?.is_none() {
                let mut refs = FieldErrors::new();
                refs.add("parent", "Parent category does not exist.");
                return Err(CatalogError::Integrity(refs));
            }
        }

        let id = Uuid::new_v4();
        let name = request.name.trim().to_string();
        let category = Category {
            id,
            slug: slug::category_slug(&name, &id)?,
            name,
            description: request.description,
            icon: request.icon,
            parent_id: request.parent,
            is_active: request.is_active.unwrap_or(true),
            created_at: Utc::now(),
        };
        let saved = self.store.insert_category(category).await?;
        log::info!("Created category {} ({})", saved.slug, saved.id);
        Ok(saved)
    }

    pub async fn get_category(&self, id: Uuid) -> CatalogResult<Category> {
        self.store
            .get_category(id)
            .await?
            .ok_or_else(|| CatalogError::not_found("Category"))
    }

    pub async fn list_categories(&self) -> CatalogResult<Vec<Category>> {
        Ok(self.store.list_categories().await?)
    }

    /// The slug is fixed at creation and survives renames.
    pub async fn update_category(&self, id: Uuid, request: UpdateCategoryRequest) -> CatalogResult<Category> {
        let mut category = self.get_category(id).await?;

        if let Some(name) = request.name {
            let mut errors = FieldErrors::new();
            Self::check_category_name(&name, &mut errors);
            if !errors.is_empty() {
                return Err(CatalogError::Validation(errors));
            }
            category.name = name.trim().to_string();
        }
        if let Some(description) = request.description {
            category.description = description;
        }
        if let Some(icon) = request.icon {
            category.icon = icon;
        }
        if let Some(is_active) = request.is_active {
            category.is_active = is_active;
        }
        if let Some(parent) = request.parent {
            if let Some(parent_id) = parent {
                self.ensure_acyclic(id, parent_id).await?;
            }
            category.parent_id = parent;
        }

        Ok(self.store.update_category(category).await?)
    }

    /// Walks up from `parent` and fails if `id` is met on the way.
    async fn ensure_acyclic(&self, id: Uuid, parent: Uuid) -> CatalogResult<()> {
        let mut seen = HashSet::new();
        let mut cursor = Some(parent);
        while let Some(current) = cursor {
            if current == id || !seen.insert(current) {
                return Err(CatalogError::field(
                    "parent",
                    "A category cannot be its own ancestor.",
                ));
            }
            let node = match self.store.get_category(current).await? {
                Some(node) => node,
                None => {
                    let mut refs = FieldErrors::new();
                    refs.add("parent", "Parent category does not exist.");
                    return Err(CatalogError::Integrity(refs));
                }
            };
            cursor = node.parent_id;
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Courses
    // ------------------------------------------------------------------

    async fn validate_course(&self, input: &CourseInput) -> CatalogResult<()> {
        let fields = validation::check_fields(input);
        let instructor = self.store.get_instructor(input.instructor).await?;
        let category = self.store.get_category(input.category).await?;
        let references = validation::check_references(instructor.as_ref(), category.as_ref());
        validation::verdict(fields, references)
    }

    pub async fn create_course(&self, input: CourseInput) -> CatalogResult<CourseView> {
        self.validate_course(&input).await?;
        let input = validation::normalize(input);
        let base = slug::slugify(&input.title)?;
        let id = Uuid::new_v4();
        let created_at = Utc::now();

        let store = &self.store;
        let (base, input) = (&base, &input);
        let course = slug::retry_on_slug_conflict(self.slug_retry_attempts, move |_| async move {
            let taken: HashSet<String> = store.slugs_with_prefix(base).await?.into_iter().collect();
            let course = build_course(id, input.clone(), slug::first_free(base, &taken), created_at);
            Ok::<_, CatalogAttempt>(store.insert_course(course).await?)
        })
        .await?;

        log::info!("Created course {} ({})", course.slug, course.id);
        Ok(course.into())
    }

    /// Full replace. All writable fields come from `input`.
    pub async fn update_course(&self, id: Uuid, input: CourseInput) -> CatalogResult<CourseView> {
        let existing = self.get_course(id).await?;
        self.save_course(existing, input).await
    }

    /// Partial update, validated against the merged result.
    pub async fn patch_course(&self, id: Uuid, patch: CoursePatch) -> CatalogResult<CourseView> {
        let existing = self.get_course(id).await?;
        let merged = patch
            .apply(CourseInput::from(&existing))
            .map_err(CatalogError::Validation)?;
        self.save_course(existing, merged).await
    }

    async fn save_course(&self, existing: Course, input: CourseInput) -> CatalogResult<CourseView> {
        self.validate_course(&input).await?;
        let input = validation::normalize(input);
        let title_changed = input.title != existing.title;
        let base = if title_changed {
            Some(slug::slugify(&input.title)?)
        } else {
            None
        };

        let store = &self.store;
        let (existing_ref, base, input) = (&existing, &base, &input);
        let course = slug::retry_on_slug_conflict(self.slug_retry_attempts, move |_| async move {
            let slug = match base {
                Some(base) => {
                    let mut taken: HashSet<String> = store.slugs_with_prefix(base).await?.into_iter().collect();
                    taken.remove(&existing_ref.slug);
                    slug::first_free(base, &taken)
                }
                None => existing_ref.slug.clone(),
            };
            let course = build_course(existing_ref.id, input.clone(), slug, existing_ref.created_at);
            Ok::<_, CatalogAttempt>(store.update_course(course).await?)
        })
        .await?;

        if title_changed {
            log::info!("Course {} renamed, slug {} -> {}", course.id, existing.slug, course.slug);
        }
        Ok(course.into())
    }

    pub async fn delete_course(&self, id: Uuid) -> CatalogResult<()> {
        match self.store.delete_course(id).await {
            Ok(()) => {
                log::info!("Deleted course {} and its dependents", id);
                Ok(())
            }
            Err(StoreError::NotFound) => Err(CatalogError::not_found("Course")),
            Err(err) => Err(err.into()),
        }
    }

    pub async fn get_course(&self, id: Uuid) -> CatalogResult<Course> {
        self.store
            .get_course(id)
            .await?
            .ok_or_else(|| CatalogError::not_found("Course"))
    }

    pub async fn course_detail(&self, id: Uuid) -> CatalogResult<CourseDetail> {
        let course = self.get_course(id).await?;
        self.detail(course).await
    }

    pub async fn course_detail_by_slug(&self, slug: &str) -> CatalogResult<CourseDetail> {
        let course = self
            .store
            .get_course_by_slug(slug)
            .await?
            .ok_or_else(|| CatalogError::not_found("Course"))?;
        self.detail(course).await
    }

    async fn detail(&self, course: Course) -> CatalogResult<CourseDetail> {
        let category = self.get_category(course.category_id).await?;
        let instructor = self.get_instructor(course.instructor_id).await?;

        let mut sections = Vec::new();
        for section in self.store.list_sections(course.id).await? {
            let lessons = self.store.list_lessons(section.id).await?;
            sections.push(SectionDetail { section, lessons });
        }

        let students_count = self.store.count_course_enrollments(course.id).await?;
        let reviews = self.store.list_reviews(course.id).await?;
        let average_rating = if reviews.is_empty() {
            None
        } else {
            let total: i64 = reviews.iter().map(|r| i64::from(r.rating)).sum();
            let average = BigDecimal::from(total) / BigDecimal::from(reviews.len() as i64);
            Some(average.with_scale_round(2, RoundingMode::HalfUp))
        };

        Ok(CourseDetail {
            final_price: course.final_price(),
            course,
            category: category.into(),
            instructor,
            sections,
            students_count,
            reviews_count: reviews.len() as i64,
            average_rating,
        })
    }

    /// Filtered listing. An empty result is reported as not found.
    pub async fn list_courses(&self, params: CourseListParams) -> CatalogResult<Vec<CourseListItem>> {
        let query = CourseQuery::try_from(params)?;
        let courses = self.store.list_courses(&query).await?;
        if courses.is_empty() {
            return Err(CatalogError::NotFound(
                "No courses found matching the given filters".to_string(),
            ));
        }

        let mut categories: HashMap<Uuid, CategorySummary> = HashMap::new();
        let mut instructors: HashMap<Uuid, InstructorView> = HashMap::new();
        let mut items = Vec::with_capacity(courses.len());
        for course in courses {
            if !categories.contains_key(&course.category_id) {
                let category = self.get_category(course.category_id).await?;
                categories.insert(course.category_id, category.into());
            }
            if !instructors.contains_key(&course.instructor_id) {
                let instructor = self.get_instructor(course.instructor_id).await?;
                instructors.insert(course.instructor_id, instructor);
            }
            let category = categories[&course.category_id].clone();
            let instructor = instructors[&course.instructor_id].clone();
            items.push(CourseListItem::new(course, category, instructor));
        }
        Ok(items)
    }

    // ------------------------------------------------------------------
    // Sections & lessons
    // ------------------------------------------------------------------

    fn check_title(title: &str) -> CatalogResult<String> {
        let title = title.trim();
        if title.is_empty() {
            return Err(CatalogError::field("title", "Title must not be empty."));
        }
        if title.chars().count() > MAX_SECTION_TITLE_CHARS {
            return Err(CatalogError::field(
                "title",
                format!("Title must be at most {} characters.", MAX_SECTION_TITLE_CHARS),
            ));
        }
        Ok(title.to_string())
    }

    pub async fn create_section(&self, course_id: Uuid, request: CreateSectionRequest) -> CatalogResult<Section> {
        self.get_course(course_id).await?;
        let title = Self::check_title(&request.title)?;
        let order = match request.order {
            Some(order) => order,
            None => next_order(self.store.list_sections(course_id).await?.iter().map(|s| s.order))?,
        };
        let section = Section {
            id: Uuid::new_v4(),
            course_id,
            title,
            description: request.description,
            order,
            created_at: Utc::now(),
        };
        Ok(self.store.insert_section(section).await?)
    }

    pub async fn list_sections(&self, course_id: Uuid) -> CatalogResult<Vec<Section>> {
        self.get_course(course_id).await?;
        Ok(self.store.list_sections(course_id).await?)
    }

    pub async fn get_section(&self, id: Uuid) -> CatalogResult<SectionDetail> {
        let section = self
            .store
            .get_section(id)
            .await?
            .ok_or_else(|| CatalogError::not_found("Section"))?;
        let lessons = self.store.list_lessons(section.id).await?;
        Ok(SectionDetail { section, lessons })
    }

    pub async fn delete_section(&self, id: Uuid) -> CatalogResult<()> {
        match self.store.delete_section(id).await {
            Ok(()) => Ok(()),
            Err(StoreError::NotFound) => Err(CatalogError::not_found("Section")),
            Err(err) => Err(err.into()),
        }
    }

    pub async fn create_lesson(&self, section_id: Uuid, request: CreateLessonRequest) -> CatalogResult<Lesson> {
        if self.store.get_section(section_id).await?.is_none() {
            return Err(CatalogError::not_found("Section"));
        }
        let title = Self::check_title(&request.title)?;
        if request.duration_minutes < 0 {
            return Err(CatalogError::field(
                "duration_minutes",
                "Duration must be greater than or equal to 0.",
            ));
        }
        let order = match request.order {
            Some(order) => order,
            None => next_order(self.store.list_lessons(section_id).await?.iter().map(|l| l.order))?,
        };
        let lesson = Lesson {
            id: Uuid::new_v4(),
            section_id,
            title,
            content: request.content,
            video_url: request.video_url,
            duration_minutes: request.duration_minutes,
            order,
            is_preview: request.is_preview,
            resources: request.resources.unwrap_or_else(|| serde_json::json!({})),
            created_at: Utc::now(),
        };
        Ok(self.store.insert_lesson(lesson).await?)
    }

    pub async fn list_lessons(&self, section_id: Uuid) -> CatalogResult<Vec<Lesson>> {
        if self.store.get_section(section_id).await?.is_none() {
            return Err(CatalogError::not_found("Section"));
        }
        Ok(self.store.list_lessons(section_id).await?)
    }

    pub async fn get_lesson(&self, id: Uuid) -> CatalogResult<Lesson> {
        self.store
            .get_lesson(id)
            .await?
            .ok_or_else(|| CatalogError::not_found("Lesson"))
    }

    pub async fn delete_lesson(&self, id: Uuid) -> CatalogResult<()> {
        match self.store.delete_lesson(id).await {
            Ok(()) => Ok(()),
            Err(StoreError::NotFound) => Err(CatalogError::not_found("Lesson")),
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::types::CreateUserRequest;
    use crate::core::shared::enums::{CourseLevel, CourseStatus};
    use crate::core::store::InMemoryCatalogStore;
    use std::str::FromStr;

    async fn setup() -> (CatalogEngine<InMemoryCatalogStore>, Uuid, Uuid) {
        let engine = CatalogEngine::new(InMemoryCatalogStore::new(), 3);
        let instructor = engine
            .create_instructor(CreateInstructorRequest {
                user: CreateUserRequest {
                    username: "aziz".to_string(),
                    email: "aziz@example.com".to_string(),
                    first_name: "Aziz".to_string(),
                    last_name: String::new(),
                },
                bio: "Teaches systems programming".to_string(),
                profile_image: String::new(),
                expertise: "Rust".to_string(),
                is_verified: true,
            })
            .await
            .unwrap();
        let category = engine
            .create_category(CreateCategoryRequest {
                name: "Programming".to_string(),
                description: String::new(),
                icon: String::new(),
                parent: None,
                is_active: None,
            })
            .await
            .unwrap();
        (engine, instructor.id, category.id)
    }

    fn input(title: &str, instructor: Uuid, category: Uuid) -> CourseInput {
        CourseInput {
            title: title.to_string(),
            description: "x".repeat(60),
            instructor,
            category,
            thumbnail: String::new(),
            trailer_url: None,
            price: BigDecimal::from_str("100").unwrap(),
            discount_percentage: 25,
            level: CourseLevel::Beginner,
            status: CourseStatus::Published,
            duration_hours: BigDecimal::from(3),
            requirements: String::new(),
            what_you_learn: String::new(),
            language: "Uzbek".to_string(),
            is_featured: false,
        }
    }

    #[tokio::test]
    async fn test_same_title_gets_suffixed_slug() {
        let (engine, instructor, category) = setup().await;
        let first = engine.create_course(input("T1", instructor, category)).await.unwrap();
        let second = engine.create_course(input("T1", instructor, category)).await.unwrap();
        assert_eq!(first.course.slug, "t1");
        assert_eq!(second.course.slug, "t1-1");
        let fetched = engine.course_detail_by_slug("t1-1").await.unwrap();
        assert_eq!(fetched.course.id, second.course.id);
    }

    #[tokio::test]
    async fn test_final_price_in_view() {
        let (engine, instructor, category) = setup().await;
        let view = engine.create_course(input("Priced", instructor, category)).await.unwrap();
        assert_eq!(view.final_price.to_string(), "75.00");
    }

    #[tokio::test]
    async fn test_unchanged_title_keeps_slug() {
        let (engine, instructor, category) = setup().await;
        let view = engine.create_course(input("Stable", instructor, category)).await.unwrap();
        let patch = CoursePatch {
            price: Some(Some(BigDecimal::from(5))),
            ..Default::default()
        };
        let updated = engine.patch_course(view.course.id, patch).await.unwrap();
        assert_eq!(updated.course.slug, "stable");
        assert_eq!(updated.course.price.to_string(), "5.00");
    }

    #[tokio::test]
    async fn test_renamed_course_takes_next_suffix() {
        let (engine, instructor, category) = setup().await;
        engine.create_course(input("Alpha", instructor, category)).await.unwrap();
        engine.create_course(input("Alpha", instructor, category)).await.unwrap();
        let beta = engine.create_course(input("Beta", instructor, category)).await.unwrap();
        let patch = CoursePatch {
            title: Some(Some("Alpha".to_string())),
            ..Default::default()
        };
        let renamed = engine.patch_course(beta.course.id, patch).await.unwrap();
        assert_eq!(renamed.course.slug, "alpha-2");
    }

    #[tokio::test]
    async fn test_invalid_discount_creates_nothing() {
        let (engine, instructor, category) = setup().await;
        let mut bad = input("Bad", instructor, category);
        bad.discount_percentage = 101;
        let err = engine.create_course(bad).await.unwrap_err();
        assert!(matches!(err, CatalogError::Validation(ref f) if f.contains("discount_percentage")));
        assert!(engine.list_courses(CourseListParams::default()).await.is_err());
    }

    #[tokio::test]
    async fn test_unknown_instructor_is_integrity_error() {
        let (engine, _, category) = setup().await;
        let err = engine
            .create_course(input("Orphan", Uuid::new_v4(), category))
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::Integrity(ref f) if f.contains("instructor")));
    }

    #[tokio::test]
    async fn test_category_cycle_rejected() {
        let (engine, _, root) = setup().await;
        let child = engine
            .create_category(CreateCategoryRequest {
                name: "Rust".to_string(),
                description: String::new(),
                icon: String::new(),
                parent: Some(root),
                is_active: None,
            })
            .await
            .unwrap();
        let err = engine
            .update_category(
                root,
                UpdateCategoryRequest {
                    parent: Some(Some(child.id)),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::Validation(ref f) if f.contains("parent")));

        let err = engine
            .update_category(
                root,
                UpdateCategoryRequest {
                    parent: Some(Some(root)),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::Validation(_)));
    }

    #[tokio::test]
    async fn test_category_slug_survives_rename() {
        let (engine, _, category) = setup().await;
        let before = engine.get_category(category).await.unwrap();
        let after = engine
            .update_category(
                category,
                UpdateCategoryRequest {
                    name: Some("Software".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(after.name, "Software");
        assert_eq!(after.slug, before.slug);
        assert!(after.slug.starts_with("programming-"));
    }

    #[tokio::test]
    async fn test_default_order_follows_siblings() {
        let (engine, instructor, category) = setup().await;
        let course = engine.create_course(input("Ordered", instructor, category)).await.unwrap();
        let request = |title: &str, order: Option<i32>| CreateSectionRequest {
            title: title.to_string(),
            description: String::new(),
            order,
        };
        let first = engine.create_section(course.course.id, request("One", None)).await.unwrap();
        let jumped = engine.create_section(course.course.id, request("Ten", Some(10))).await.unwrap();
        let next = engine.create_section(course.course.id, request("Eleven", None)).await.unwrap();
        assert_eq!(first.order, 1);
        assert_eq!(jumped.order, 10);
        assert_eq!(next.order, 11);
    }

    #[tokio::test]
    async fn test_default_order_after_max_is_rejected() {
        let (engine, instructor, category) = setup().await;
        let course = engine.create_course(input("Crowded", instructor, category)).await.unwrap();
        let section = |order: Option<i32>| CreateSectionRequest {
            title: "Last".to_string(),
            description: String::new(),
            order,
        };
        let last = engine.create_section(course.course.id, section(Some(i32::MAX))).await.unwrap();
        let err = engine.create_section(course.course.id, section(None)).await.unwrap_err();
        assert!(matches!(&err, CatalogError::Validation(fields) if fields.contains("order")));

        let lesson = |order: Option<i32>| CreateLessonRequest {
            title: "Tail".to_string(),
            content: String::new(),
            video_url: String::new(),
            duration_minutes: 5,
            order,
            is_preview: false,
            resources: None,
        };
        engine.create_lesson(last.id, lesson(Some(i32::MAX))).await.unwrap();
        let err = engine.create_lesson(last.id, lesson(None)).await.unwrap_err();
        assert!(matches!(&err, CatalogError::Validation(fields) if fields.contains("order")));
        assert_eq!(engine.list_lessons(last.id).await.unwrap().len(), 1);
    }

    #[test]
    fn test_next_order() {
        assert_eq!(next_order(std::iter::empty()).unwrap(), 1);
        assert_eq!(next_order([3, 7, 2].into_iter()).unwrap(), 8);
        assert!(next_order([i32::MAX].into_iter()).is_err());
    }

    #[tokio::test]
    async fn test_duplicate_username_conflicts() {
        let (engine, _, _) = setup().await;
        let err = engine
            .create_instructor(CreateInstructorRequest {
                user: CreateUserRequest {
                    username: "aziz".to_string(),
                    email: "other@example.com".to_string(),
                    first_name: String::new(),
                    last_name: String::new(),
                },
                bio: String::new(),
                profile_image: String::new(),
                expertise: "Go".to_string(),
                is_verified: false,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::Conflict(_)));
    }
}
