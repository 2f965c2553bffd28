use axum::{
    extract::{Path, State},
    routing::get,
    Json,
};

use crate::{
    errors::ServerResult,
    serialized::{Lab, ToSerialized, Topic},
    Router, ServerContext,
};

#[utoipa::path(
    get,
    path = "/api/topics",
    tag = "topics",
    responses(
        (status = 200, body = Vec<Topic>)
    )
)]
async fn list_topics(State(context): State<ServerContext>) -> ServerResult<Json<Vec<Topic>>> {
    let topics = context.manual.database.list_topics().await?;

    Ok(Json(topics.to_serialized()))
}

#[utoipa::path(
    get,
    path = "/api/topics/{slug}",
    tag = "topics",
    params(("slug" = String, Path, description = "The slug of the topic")),
    responses(
        (status = 200, body = Topic),
        (status = 404, description = "Topic not found")
    )
)]
async fn topic(
    State(context): State<ServerContext>,
    Path(slug): Path<String>,
) -> ServerResult<Json<Topic>> {
    let topic = context.manual.database.topic_by_slug(&slug).await?;

    Ok(Json(topic.to_serialized()))
}

#[utoipa::path(
    get,
    path = "/api/topics/{slug}/labs",
    tag = "topics",
    params(("slug" = String, Path, description = "The slug of the topic")),
    responses(
        (status = 200, body = Vec<Lab>, description = "Newest labs first")
    )
)]
async fn topic_labs(
    State(context): State<ServerContext>,
    Path(slug): Path<String>,
) -> ServerResult<Json<Vec<Lab>>> {
    let labs = context.manual.database.labs_by_topic_slug(&slug).await?;

    Ok(Json(labs.to_serialized()))
}

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_topics))
        .route("/:slug", get(topic))
        .route("/:slug/labs", get(topic_labs))
}
