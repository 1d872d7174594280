//! Course structure editor: the client-side model behind drag-and-drop reordering.
//!
//! A drag is applied to the local structure straight away and a reorder request
//! is handed back to the caller. The state from before the drag is held until
//! the server answers; `settle` either drops it or restores it.

use uuid::Uuid;

use crate::schema::{course::{CourseDetail, ReorderInput}, ApiResponse, Status};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LessonItem{
    pub id: Uuid,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterItem{
    pub id: Uuid,
    pub title: String,
    pub is_open: bool,
    pub lessons: Vec<LessonItem>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReorderRequest{
    Chapters{ course_id: Uuid, ids: Vec<Uuid> },
    Lessons{ course_id: Uuid, chapter_id: Uuid, ids: Vec<Uuid> },
}

impl ReorderRequest {
    /// Admin API path the request is sent to.
    pub fn endpoint(&self) -> String {
        match self {
            ReorderRequest::Chapters { course_id, .. } => {
                format!("/api/v1/admin/courses/{course_id}/chapters/order")
            }
            ReorderRequest::Lessons { course_id, chapter_id, .. } => {
                format!("/api/v1/admin/courses/{course_id}/chapters/{chapter_id}/lessons/order")
            }
        }
    }

    pub fn body(&self) -> ReorderInput {
        match self {
            ReorderRequest::Chapters { ids, .. } | ReorderRequest::Lessons { ids, .. } => {
                ReorderInput { ids: ids.clone() }
            }
        }
    }

    fn failure_notice(&self) -> &'static str {
        match self {
            ReorderRequest::Chapters { .. } => "Failed to reorder chapters",
            ReorderRequest::Lessons { .. } => "Failed to reorder lessons",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragOutcome{
    /// Nothing moved and nothing is sent.
    Unchanged,
    /// The gesture is not allowed; state is untouched and the notice is shown.
    Rejected(&'static str),
    /// Applied locally; the request must be sent and its answer passed to `settle`.
    Pending(ReorderRequest),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice{
    Success(String),
    Error(String),
}

struct InFlight{
    snapshot: Vec<ChapterItem>,
    request: ReorderRequest,
}

pub struct CourseEditor{
    course_id: Uuid,
    chapters: Vec<ChapterItem>,
    in_flight: Option<InFlight>,
}

fn move_item<T>(items: &mut Vec<T>, from: usize, to: usize) {
    let item = items.remove(from);
    items.insert(to, item);
}

impl CourseEditor {
    /// Chapters start open.
    pub fn new(course: &CourseDetail) -> Self {
        let mut editor = CourseEditor { course_id: course.course.id, chapters: Vec::new(), in_flight: None };
        editor.sync(course);
        editor
    }

    pub fn chapters(&self) -> &[ChapterItem] {
        &self.chapters
    }

    pub fn is_pending(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Replaces the structure with server data, keeping each chapter's open state.
    pub fn sync(&mut self, course: &CourseDetail) {
        self.course_id = course.course.id;
        self.chapters = course
            .chapters
            .iter()
            .map(|chapter| ChapterItem {
                id: chapter.id,
                title: chapter.title.clone(),
                is_open: self
                    .chapters
                    .iter()
                    .find(|c| c.id == chapter.id)
                    .map_or(true, |c| c.is_open),
                lessons: chapter
                    .lessons
                    .iter()
                    .map(|lesson| LessonItem { id: lesson.id, title: lesson.title.clone() })
                    .collect(),
            })
            .collect();
    }

    pub fn toggle_chapter(&mut self, chapter_id: Uuid) {
        if let Some(chapter) = self.chapters.iter_mut().find(|c| c.id == chapter_id) {
            chapter.is_open = !chapter.is_open;
        }
    }

    fn chapter_index(&self, id: Uuid) -> Option<usize> {
        self.chapters.iter().position(|c| c.id == id)
    }

    /// `(chapter index, lesson index)` of a lesson id.
    fn lesson_index(&self, id: Uuid) -> Option<(usize, usize)> {
        self.chapters.iter().enumerate().find_map(|(ci, chapter)| {
            chapter.lessons.iter().position(|l| l.id == id).map(|li| (ci, li))
        })
    }

    pub fn drag_end(&mut self, active: Uuid, over: Option<Uuid>) -> DragOutcome {
        let Some(over) = over else {
            return DragOutcome::Unchanged;
        };
        if active == over {
            return DragOutcome::Unchanged;
        }
        if self.in_flight.is_some() {
            return DragOutcome::Rejected("Wait for the previous reorder to finish");
        }

        if let Some(from) = self.chapter_index(active) {
            // dropping a chapter onto a lesson targets that lesson's chapter
            let to = match self.chapter_index(over) {
                Some(index) => index,
                None => match self.lesson_index(over) {
                    Some((chapter, _)) => chapter,
                    None => return DragOutcome::Unchanged,
                },
            };
            if from == to {
                return DragOutcome::Unchanged;
            }

            let snapshot = self.chapters.clone();
            move_item(&mut self.chapters, from, to);

            let request = ReorderRequest::Chapters {
                course_id: self.course_id,
                ids: self.chapters.iter().map(|c| c.id).collect(),
            };
            self.in_flight = Some(InFlight { snapshot, request: request.clone() });
            return DragOutcome::Pending(request);
        }

        let Some((chapter, from)) = self.lesson_index(active) else {
            return DragOutcome::Rejected("Could not find the dragged item");
        };
        let Some((over_chapter, to)) = self.lesson_index(over) else {
            if self.chapter_index(over).is_some() {
                return DragOutcome::Rejected("Moving a lesson to a different chapter is not allowed");
            }
            return DragOutcome::Unchanged;
        };
        if chapter != over_chapter {
            return DragOutcome::Rejected("Moving a lesson to a different chapter is not allowed");
        }

        let snapshot = self.chapters.clone();
        let lessons = &mut self.chapters[chapter].lessons;
        move_item(lessons, from, to);

        let request = ReorderRequest::Lessons {
            course_id: self.course_id,
            chapter_id: self.chapters[chapter].id,
            ids: self.chapters[chapter].lessons.iter().map(|l| l.id).collect(),
        };
        self.in_flight = Some(InFlight { snapshot, request: request.clone() });
        DragOutcome::Pending(request)
    }

    /// Resolves the outstanding request. Anything but a success response puts the
    /// structure back exactly as it was before the drag.
    pub fn settle(&mut self, response: Result<ApiResponse, String>) -> Option<Notice> {
        let in_flight = self.in_flight.take()?;

        match response {
            Ok(response) if response.status == Status::Success => Some(Notice::Success(response.message)),
            Ok(response) => {
                tracing::debug!(message = %response.message, "reorder refused, rolling back");
                self.chapters = in_flight.snapshot;
                Some(Notice::Error(in_flight.request.failure_notice().to_string()))
            }
            Err(error) => {
                tracing::debug!(%error, "reorder request failed, rolling back");
                self.chapters = in_flight.snapshot;
                Some(Notice::Error(in_flight.request.failure_notice().to_string()))
            }
        }
    }
}
