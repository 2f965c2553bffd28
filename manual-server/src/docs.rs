use axum::Json;
use utoipa::{
    openapi::security::{ApiKey, ApiKeyValue, SecurityScheme},
    Modify, OpenApi,
};

use crate::{
    auth::{self, SESSION_COOKIE},
    labs,
    schemas::{LoginSchema, NewLabSchema, UpdatedLabSchema},
    serialized::{Lab, LoginResult, Message, Metrics, Topic},
    system, topics,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        topics::list_topics,
        topics::topic,
        topics::topic_labs,
        labs::lab,
        labs::create_lab,
        labs::update_lab,
        labs::delete_lab,
        auth::login,
        auth::logout,
        auth::check,
        system::metrics,
        system::health,
    ),
    components(schemas(
        Topic,
        Lab,
        Metrics,
        LoginResult,
        Message,
        LoginSchema,
        NewLabSchema,
        UpdatedLabSchema
    )),
    modifiers(&Security),
    info(description = "Exposes the topics and labs of the DevOps manual")
)]
pub struct ApiDoc;

struct Security;

impl Modify for Security {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            let scheme = ApiKey::Cookie(ApiKeyValue::new(SESSION_COOKIE));

            components.add_security_scheme("session", SecurityScheme::ApiKey(scheme))
        }
    }
}

pub async fn docs() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
