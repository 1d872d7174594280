use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::models::{course::{Course, CourseStatus}, structure::{Chapter, Lesson}};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CourseLevel{
    Beginner,
    Intermediate,
    Advanced,
}

impl CourseLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            CourseLevel::Beginner => "Beginner",
            CourseLevel::Intermediate => "Intermediate",
            CourseLevel::Advanced => "Advanced",
        }
    }
}

/// Course form, used for both create and edit.
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct CourseInput{
    #[validate(length(min = 3, max = 100))]
    pub title: String,
    #[validate(length(min = 3))]
    pub description: String,
    #[validate(length(min = 1))]
    pub file_key: String,
    #[validate(range(min = 1))]
    pub price: i32,
    #[validate(range(min = 1, max = 500))]
    pub duration: i32,
    pub level: CourseLevel,
    #[validate(length(min = 1, max = 100))]
    pub category: String,
    #[validate(length(min = 3, max = 200))]
    pub small_description: String,
    /// Derived from the title when absent.
    #[validate(custom(function = "validate_slug"))]
    pub slug: Option<String>,
    pub status: CourseStatus,
}

pub fn validate_slug(slug: &str) -> Result<(), ValidationError> {
    let well_formed = slug.len() >= 3
        && !slug.starts_with('-')
        && !slug.ends_with('-')
        && !slug.contains("--")
        && slug.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');

    if well_formed {
        Ok(())
    } else {
        Err(ValidationError::new("slug"))
    }
}

#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct CreateChapter{
    #[validate(length(min = 3, max = 100))]
    pub title: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct LessonInput{
    #[validate(length(min = 3, max = 100))]
    pub title: String,
    #[validate(length(min = 3))]
    pub description: Option<String>,
    pub thumbnail_key: Option<String>,
    pub video_key: Option<String>,
}

/// Full new ordering of a sibling set; position = index + 1.
#[derive(Debug, Deserialize, Serialize)]
pub struct ReorderInput{
    pub ids: Vec<Uuid>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LessonOutline{
    pub id: Uuid,
    pub title: String,
    pub position: i32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChapterOutline{
    pub id: Uuid,
    pub title: String,
    pub position: i32,
    pub lessons: Vec<LessonOutline>,
}

/// A course together with its ordered chapters and lessons.
#[derive(Debug, Serialize, Deserialize)]
pub struct CourseDetail{
    #[serde(flatten)]
    pub course: Course,
    pub chapters: Vec<ChapterOutline>,
}

impl CourseDetail {
    /// Groups lessons under their chapters. Both inputs must already be sorted by position.
    pub fn assemble(course: Course, chapters: Vec<Chapter>, lessons: Vec<Lesson>) -> Self {
        let mut outlines: Vec<ChapterOutline> = chapters.into_iter().map(|chapter|{
            ChapterOutline{
                id: chapter.id,
                title: chapter.title,
                position: chapter.position,
                lessons: Vec::new(),
            }
        }).collect();

        for lesson in lessons {
            if let Some(chapter) = outlines.iter_mut().find(|c| c.id == lesson.chapter_id) {
                chapter.lessons.push(LessonOutline{
                    id: lesson.id,
                    title: lesson.title,
                    position: lesson.position,
                });
            }
        }

        CourseDetail { course, chapters: outlines }
    }
}

#[cfg(test)]
mod tests{
    use super::*;

    fn input() -> CourseInput {
        CourseInput{
            title: "Rust for Web".to_string(),
            description: "A long description".to_string(),
            file_key: "cover.png".to_string(),
            price: 49,
            duration: 10,
            level: CourseLevel::Beginner,
            category: "Development".to_string(),
            small_description: "Short".to_string(),
            slug: Some("rust-for-web".to_string()),
            status: CourseStatus::Draft,
        }
    }

    #[test]
    fn test_valid_course_passes(){
        assert!(input().validate().is_ok());
    }

    #[test]
    fn test_bad_slug_and_price_are_rejected(){
        let mut course = input();
        course.slug = Some("Rust For Web".to_string());
        assert!(course.validate().is_err());

        let mut course = input();
        course.price = 0;
        assert!(course.validate().is_err());
    }

    #[test]
    fn test_missing_slug_is_allowed(){
        let mut course = input();
        course.slug = None;
        assert!(course.validate().is_ok());
    }
}
