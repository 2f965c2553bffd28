use axum::{
    async_trait,
    extract::{FromRequest, Request},
    Json,
};
use manual_core::slugify;
use serde::{de::DeserializeOwned, Deserialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use crate::errors::ServerError;

#[derive(Debug, ToSchema, Validate, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginSchema {
    #[validate(length(min = 1, max = 255))]
    pub username: String,
    #[validate(length(max = 128))]
    pub password: String,
}

#[derive(Debug, ToSchema, Validate, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewLabSchema {
    /// The topic the lab belongs to
    pub topic_id: i32,
    /// The slug of the lab is derived from this
    #[validate(length(min = 1, max = 255), custom(function = "validate_title"))]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub commands: Vec<String>,
    #[serde(default)]
    #[validate(length(max = 50))]
    pub difficulty: String,
}

#[derive(Debug, ToSchema, Validate, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdatedLabSchema {
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub commands: Vec<String>,
    #[serde(default)]
    #[validate(length(max = 50))]
    pub difficulty: String,
}

/// A lab title has to produce a slug, otherwise the lab has no address
fn validate_title(title: &str) -> Result<(), ValidationError> {
    if slugify(title).is_empty() {
        return Err(ValidationError::new("title_without_slug")
            .with_message("title must contain at least one letter or digit".into()));
    }

    Ok(())
}

pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = ServerError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let extracted_json: Json<T> = Json::from_request(req, state)
            .await
            .map_err(|e| ServerError::BadRequest(e.body_text()))?;

        extracted_json
            .0
            .validate()
            .map_err(|e| ServerError::BadRequest(e.to_string()))?;

        Ok(Self(extracted_json.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lab_defaults_optional_fields() {
        let lab: NewLabSchema =
            serde_json::from_str(r#"{ "topic_id": 1, "title": "Container Run" }"#).unwrap();

        assert!(lab.validate().is_ok());
        assert!(lab.commands.is_empty());
        assert_eq!(lab.content, "");
    }

    #[test]
    fn empty_title_is_invalid() {
        let lab: NewLabSchema = serde_json::from_str(r#"{ "topic_id": 1, "title": "" }"#).unwrap();

        assert!(lab.validate().is_err());
    }

    #[test]
    fn new_lab_rejects_unknown_fields() {
        let result = serde_json::from_str::<NewLabSchema>(
            r#"{ "topic_id": 1, "title": "Intro", "slug": "custom" }"#,
        );

        assert!(result.is_err());
    }

    #[test]
    fn updated_lab_rejects_unknown_fields() {
        let result = serde_json::from_str::<UpdatedLabSchema>(
            r#"{ "title": "Intro", "slug": "x", "topic_id": 9 }"#,
        );

        assert!(result.is_err());
    }

    #[test]
    fn title_must_produce_a_slug() {
        let lab: NewLabSchema =
            serde_json::from_str(r#"{ "topic_id": 1, "title": "!!!" }"#).unwrap();
        assert!(lab.validate().is_err());

        let lab: NewLabSchema =
            serde_json::from_str(r#"{ "topic_id": 1, "title": "Docker 101!" }"#).unwrap();
        assert!(lab.validate().is_ok());
    }
}
