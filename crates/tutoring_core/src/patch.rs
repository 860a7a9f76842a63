//! crates/tutoring_core/src/patch.rs
//!
//! Partial updates for owned child resources. Only supplied fields overwrite;
//! omitted fields are preserved. Every applied patch stamps `updated_at`.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::domain::{Feedback, Material, Note};
use crate::ports::{PortError, PortResult};

#[derive(Debug, Clone, Default)]
pub struct MaterialPatch {
    pub title: Option<String>,
    pub image_url: Option<String>,
    pub link: Option<String>,
}

impl MaterialPatch {
    pub fn apply(self, material: &mut Material, now: DateTime<Utc>) {
        if let Some(title) = self.title {
            material.title = title;
        }
        if let Some(image_url) = self.image_url {
            material.image_url = Some(image_url);
        }
        if let Some(link) = self.link {
            material.link = Some(link);
        }
        material.updated_at = now;
    }
}

#[derive(Debug, Clone, Default)]
pub struct NotePatch {
    pub title: Option<String>,
    pub description: Option<String>,
}

impl NotePatch {
    pub fn apply(self, note: &mut Note, now: DateTime<Utc>) {
        if let Some(title) = self.title {
            note.title = title;
        }
        if let Some(description) = self.description {
            note.description = description;
        }
        note.updated_at = now;
    }
}

#[derive(Debug, Clone, Default)]
pub struct FeedbackPatch {
    pub rating: Option<u8>,
    pub comment: Option<String>,
}

impl FeedbackPatch {
    pub fn apply(self, feedback: &mut Feedback, now: DateTime<Utc>) -> PortResult<()> {
        if let Some(rating) = self.rating {
            feedback.rating = validate_rating(rating)?;
        }
        if let Some(comment) = self.comment {
            feedback.comment = comment;
        }
        feedback.updated_at = now;
        Ok(())
    }
}

pub fn validate_rating(rating: u8) -> PortResult<u8> {
    if (1..=5).contains(&rating) {
        Ok(rating)
    } else {
        Err(PortError::Invalid("rating must be between 1 and 5".to_string()))
    }
}

/// Shallow merge of scheduling fields; keys in `update` win. A `null` value
/// removes the key.
pub fn merge_details(current: &mut Map<String, Value>, update: Map<String, Value>) {
    for (key, value) in update {
        if value.is_null() {
            current.remove(&key);
        } else {
            current.insert(key, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use serde_json::json;
    use uuid::Uuid;

    fn note() -> Note {
        let created = Utc::now() - Duration::days(1);
        Note {
            id: Uuid::new_v4(),
            email: "carol@x.com".to_string(),
            title: "Limits".to_string(),
            description: "epsilon-delta".to_string(),
            created_at: created,
            updated_at: created,
        }
    }

    #[test]
    fn test_note_patch_keeps_omitted_fields() {
        let mut note = note();
        let now = Utc::now();
        NotePatch { title: Some("Derivatives".to_string()), description: None }.apply(&mut note, now);

        assert_eq!(note.title, "Derivatives");
        assert_eq!(note.description, "epsilon-delta");
        assert_eq!(note.updated_at, now);
    }

    #[test]
    fn test_feedback_patch_rejects_out_of_range_rating() {
        let now = Utc::now();
        let mut feedback = Feedback {
            id: Uuid::new_v4(),
            session_id: Uuid::new_v4(),
            student_email: "sam@x.com".to_string(),
            rating: 4,
            comment: "good".to_string(),
            created_at: now,
            updated_at: now,
        };
        let patch = FeedbackPatch { rating: Some(9), comment: None };
        assert!(matches!(patch.apply(&mut feedback, now), Err(PortError::Invalid(_))));
        assert_eq!(feedback.rating, 4);
    }

    #[test]
    fn test_merge_details() {
        let mut current = json!({"title": "Algebra", "fee": 10, "room": "A"})
            .as_object()
            .cloned()
            .unwrap_or_default();
        let update = json!({"fee": 15, "room": null})
            .as_object()
            .cloned()
            .unwrap_or_default();

        merge_details(&mut current, update);

        assert_eq!(current.get("title"), Some(&json!("Algebra")));
        assert_eq!(current.get("fee"), Some(&json!(15)));
        assert!(!current.contains_key("room"));
    }
}
