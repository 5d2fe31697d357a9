diesel::table! {
    users (id) {
        id -> Uuid,
        username -> Text,
        email -> Text,
        first_name -> Text,
        last_name -> Text,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    instructors (id) {
        id -> Uuid,
        user_id -> Uuid,
        bio -> Text,
        profile_image -> Text,
        expertise -> Text,
        total_students -> Int4,
        rating -> Numeric,
        is_verified -> Bool,
        is_active -> Bool,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    categories (id) {
        id -> Uuid,
        name -> Text,
        slug -> Text,
        description -> Text,
        icon -> Text,
        parent_id -> Nullable<Uuid>,
        is_active -> Bool,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    courses (id) {
        id -> Uuid,
        title -> Text,
        slug -> Text,
        description -> Text,
        instructor_id -> Uuid,
        category_id -> Uuid,
        thumbnail -> Text,
        trailer_url -> Nullable<Text>,
        price -> Numeric,
        discount_percentage -> Int4,
        level -> Text,
        status -> Text,
        duration_hours -> Numeric,
        requirements -> Text,
        what_you_learn -> Text,
        language -> Text,
        is_featured -> Bool,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    sections (id) {
        id -> Uuid,
        course_id -> Uuid,
        title -> Text,
        description -> Text,
        position -> Int4,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    lessons (id) {
        id -> Uuid,
        section_id -> Uuid,
        title -> Text,
        content -> Text,
        video_url -> Text,
        duration_minutes -> Int4,
        position -> Int4,
        is_preview -> Bool,
        resources -> Jsonb,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    enrollments (id) {
        id -> Uuid,
        student_id -> Uuid,
        course_id -> Uuid,
        status -> Text,
        progress_percentage -> Int4,
        enrolled_at -> Timestamptz,
        completed_at -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    lesson_progress (id) {
        id -> Uuid,
        enrollment_id -> Uuid,
        lesson_id -> Uuid,
        is_completed -> Bool,
        completed_at -> Nullable<Timestamptz>,
        watch_time_minutes -> Int4,
    }
}

diesel::table! {
    certificates (id) {
        id -> Uuid,
        enrollment_id -> Uuid,
        certificate_number -> Text,
        certificate_url -> Text,
        issued_at -> Timestamptz,
    }
}

diesel::table! {
    course_reviews (id) {
        id -> Uuid,
        course_id -> Uuid,
        student_id -> Uuid,
        rating -> Int4,
        title -> Text,
        comment -> Text,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    questions (id) {
        id -> Uuid,
        lesson_id -> Uuid,
        student_id -> Uuid,
        title -> Text,
        content -> Text,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    answers (id) {
        id -> Uuid,
        question_id -> Uuid,
        user_id -> Uuid,
        content -> Text,
        is_instructor_answer -> Bool,
        created_at -> Timestamptz,
    }
}

diesel::joinable!(instructors -> users (user_id));
diesel::joinable!(courses -> instructors (instructor_id));
diesel::joinable!(courses -> categories (category_id));
diesel::joinable!(sections -> courses (course_id));
diesel::joinable!(lessons -> sections (section_id));
diesel::joinable!(enrollments -> courses (course_id));
diesel::joinable!(lesson_progress -> enrollments (enrollment_id));
diesel::joinable!(lesson_progress -> lessons (lesson_id));
diesel::joinable!(certificates -> enrollments (enrollment_id));
diesel::joinable!(course_reviews -> courses (course_id));
diesel::joinable!(questions -> lessons (lesson_id));
diesel::joinable!(answers -> questions (question_id));

diesel::allow_tables_to_appear_in_same_query!(
    users,
    instructors,
    categories,
    courses,
    sections,
    lessons,
    enrollments,
    lesson_progress,
    certificates,
    course_reviews,
    questions,
    answers,
);
