use serde::Deserialize;
use validator::Validate;

use super::repo_types::{NewPost, PostChanges};

/// Request body for `POST /posts`.
#[derive(Debug, Deserialize, Validate)]
pub struct CreatePostRequest {
    #[validate(range(min = 1, message = "The author id must be a positive integer."))]
    pub author_id: i64,
    #[validate(length(min = 5, max = 120, message = "The title must be 5 to 120 characters long."))]
    pub title: String,
    #[validate(length(min = 1, message = "The content must not be empty."))]
    pub content: String,
    #[validate(length(max = 500, message = "The description must be at most 500 characters long."))]
    pub description: Option<String>,
    #[serde(default)]
    pub published: bool,
}

impl From<CreatePostRequest> for NewPost {
    fn from(req: CreatePostRequest) -> Self {
        Self {
            author_id: req.author_id,
            title: req.title.trim().to_string(),
            content: req.content,
            description: req.description,
            published: req.published,
        }
    }
}

/// Request body for `PUT /posts/:id`; absent fields are left unchanged.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdatePostRequest {
    #[validate(length(min = 5, max = 120, message = "The title must be 5 to 120 characters long."))]
    pub title: Option<String>,
    #[validate(length(min = 1, message = "The content must not be empty."))]
    pub content: Option<String>,
    #[validate(length(max = 500, message = "The description must be at most 500 characters long."))]
    pub description: Option<String>,
    pub published: Option<bool>,
}

impl From<UpdatePostRequest> for PostChanges {
    fn from(req: UpdatePostRequest) -> Self {
        Self {
            title: req.title.map(|t| t.trim().to_string()),
            content: req.content,
            description: req.description,
            published: req.published,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_defaults_to_unpublished() {
        let req: CreatePostRequest = serde_json::from_value(serde_json::json!({
            "author_id": 1,
            "title": "Hello world",
            "content": "First post."
        }))
        .unwrap();
        assert!(req.validate().is_ok());
        assert!(!NewPost::from(req).published);
    }

    #[test]
    fn create_rejects_short_title_and_bad_author() {
        let req = CreatePostRequest {
            author_id: 0,
            title: "Hey".into(),
            content: "body".into(),
            description: None,
            published: false,
        };
        let errors = req.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("title"));
        assert!(fields.contains_key("author_id"));
    }

    #[test]
    fn update_accepts_empty_body() {
        assert!(UpdatePostRequest::default().validate().is_ok());
        let changes = PostChanges::from(UpdatePostRequest {
            published: Some(true),
            ..Default::default()
        });
        assert_eq!(changes.published, Some(true));
        assert!(changes.title.is_none());
    }
}
