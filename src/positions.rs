//! Planning side of the position reconciler.
//!
//! Chapters are ordered within their course and lessons within their chapter.
//! For every parent the child positions are exactly `1..=N`. The functions here
//! only compute which rows need which position; `models::structure` applies the
//! result inside a single transaction.

use std::collections::HashSet;

use derive_more::Display;
use thiserror::Error;
use uuid::Uuid;

use crate::errors::ActionError;

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum SiblingKind{
    #[display("chapter")]
    Chapter,
    #[display("lesson")]
    Lesson,
}

impl SiblingKind {
    pub fn table(&self) -> &'static str {
        match self {
            SiblingKind::Chapter => "chapter_table",
            SiblingKind::Lesson => "lesson_table",
        }
    }

    pub fn parent_table(&self) -> &'static str {
        match self {
            SiblingKind::Chapter => "course_table",
            SiblingKind::Lesson => "chapter_table",
        }
    }

    pub fn parent_column(&self) -> &'static str {
        match self {
            SiblingKind::Chapter => "course_id",
            SiblingKind::Lesson => "chapter_id",
        }
    }

    pub fn parent(&self) -> &'static str {
        match self {
            SiblingKind::Chapter => "Course",
            SiblingKind::Lesson => "Chapter",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            SiblingKind::Chapter => "Chapter",
            SiblingKind::Lesson => "Lesson",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::FromRow)]
pub struct Sibling{
    pub id: Uuid,
    pub position: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionUpdate{
    pub id: Uuid,
    pub position: i32,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PositionError{
    #[error("{} not found", .0.title())]
    Missing(SiblingKind),
    #[error("No {0}s provided")]
    Empty(SiblingKind),
    #[error("Duplicate {0} in new order")]
    Duplicate(SiblingKind),
    #[error("New order must list every {kind} of the {parent} exactly once", kind = .0, parent = .0.parent().to_lowercase())]
    Mismatch(SiblingKind),
}

impl From<PositionError> for ActionError {
    fn from(error: PositionError) -> Self {
        match error {
            PositionError::Missing(_) => ActionError::not_found(error.to_string()),
            _ => ActionError::invalid(error.to_string()),
        }
    }
}

/// Position for a newly appended child given the current maximum.
pub fn next_position(max: Option<i32>) -> i32 {
    max.unwrap_or(0) + 1
}

/// Updates needed after removing `target` from `siblings`.
///
/// `siblings` must be sorted by position. Only rows whose position actually
/// changes are returned, so everything in front of the removed row is left alone.
pub fn plan_delete(kind: SiblingKind, siblings: &[Sibling], target: Uuid) -> Result<Vec<PositionUpdate>, PositionError> {
    if !siblings.iter().any(|s| s.id == target) {
        return Err(PositionError::Missing(kind));
    }

    let updates = siblings
        .iter()
        .filter(|s| s.id != target)
        .enumerate()
        .filter_map(|(index, sibling)| {
            let position = index as i32 + 1;
            (sibling.position != position).then_some(PositionUpdate { id: sibling.id, position })
        })
        .collect();

    Ok(updates)
}

/// Positions for an explicit new ordering: `ordered[i]` goes to `i + 1`.
///
/// The ordering has to be a permutation of the current children of the parent.
pub fn plan_reorder(kind: SiblingKind, current: &[Sibling], ordered: &[Uuid]) -> Result<Vec<PositionUpdate>, PositionError> {
    if ordered.is_empty() {
        return Err(PositionError::Empty(kind));
    }

    let mut seen = HashSet::with_capacity(ordered.len());
    if !ordered.iter().all(|id| seen.insert(*id)) {
        return Err(PositionError::Duplicate(kind));
    }

    if ordered.len() != current.len() || !current.iter().all(|s| seen.contains(&s.id)) {
        return Err(PositionError::Mismatch(kind));
    }

    Ok(ordered
        .iter()
        .enumerate()
        .map(|(index, id)| PositionUpdate { id: *id, position: index as i32 + 1 })
        .collect())
}
