//! Server-rendered HTML pages

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
};
use log::error;
use manual_core::DatabaseError;
use minijinja::{context, Environment, Value};

use crate::{
    errors::{ServerError, ServerResult},
    serialized::ToSerialized,
    Router, ServerContext,
};

pub type Templates = Arc<Environment<'static>>;

const TEMPLATES: [(&str, &str); 6] = [
    ("base.html", include_str!("../templates/base.html")),
    ("index.html", include_str!("../templates/index.html")),
    ("topic.html", include_str!("../templates/topic.html")),
    ("lab.html", include_str!("../templates/lab.html")),
    ("login.html", include_str!("../templates/login.html")),
    (
        "not_found.html",
        include_str!("../templates/not_found.html"),
    ),
];

/// Builds the template environment with every page template loaded
pub fn templates() -> Result<Environment<'static>, minijinja::Error> {
    let mut env = Environment::new();

    for (name, source) in TEMPLATES {
        env.add_template(name, source)?;
    }

    Ok(env)
}

fn render(templates: &Templates, name: &str, ctx: Value) -> ServerResult<Html<String>> {
    templates
        .get_template(name)
        .and_then(|t| t.render(ctx))
        .map(Html)
        .map_err(|e| ServerError::Unknown(e.to_string()))
}

fn not_found(templates: &Templates) -> ServerResult<Response> {
    let page = render(
        templates,
        "not_found.html",
        context! { title => "Not found" },
    )?;

    Ok((StatusCode::NOT_FOUND, page).into_response())
}

async fn index(State(context): State<ServerContext>) -> ServerResult<Html<String>> {
    let topics = context
        .manual
        .database
        .list_topics()
        .await
        .unwrap_or_else(|e| {
            error!("Could not list topics: {}", e);
            Vec::new()
        });

    render(
        &context.templates,
        "index.html",
        context! {
            title => "DevOps Manual",
            topics => topics.to_serialized(),
        },
    )
}

async fn topic_page(
    State(context): State<ServerContext>,
    Path(slug): Path<String>,
) -> ServerResult<Response> {
    let database = &context.manual.database;

    let topic = match database.topic_by_slug(&slug).await {
        Ok(topic) => topic,
        Err(DatabaseError::NotFound { .. }) => return not_found(&context.templates),
        Err(e) => return Err(e.into()),
    };

    let labs = database.labs_by_topic_slug(&slug).await?;

    let page = render(
        &context.templates,
        "topic.html",
        context! {
            title => topic.title.clone(),
            topic => topic.to_serialized(),
            labs => labs.to_serialized(),
        },
    )?;

    Ok(page.into_response())
}

async fn lab_page(
    State(context): State<ServerContext>,
    Path((topic_slug, lab_slug)): Path<(String, String)>,
) -> ServerResult<Response> {
    let lab = match context
        .manual
        .database
        .lab_by_slug(&topic_slug, &lab_slug)
        .await
    {
        Ok(lab) => lab,
        Err(DatabaseError::NotFound { .. }) => return not_found(&context.templates),
        Err(e) => return Err(e.into()),
    };

    let page = render(
        &context.templates,
        "lab.html",
        context! {
            title => lab.title.clone(),
            lab => lab.to_serialized(),
        },
    )?;

    Ok(page.into_response())
}

async fn login_page(State(templates): State<Templates>) -> ServerResult<Html<String>> {
    render(&templates, "login.html", context! { title => "Login" })
}

pub fn router() -> Router {
    Router::new()
        .route("/", get(index))
        .route("/topic/:slug", get(topic_page))
        .route("/lab/:topic/:lab", get(lab_page))
        .route("/login", get(login_page))
}
