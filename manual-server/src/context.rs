use std::sync::Arc;

use axum::extract::FromRef;
use manual_core::Manual;

use crate::pages::{self, Templates};

#[derive(Clone, FromRef)]
pub struct ServerContext {
    pub manual: Arc<Manual>,
    pub templates: Templates,
}

impl ServerContext {
    pub fn new(manual: Manual) -> Result<Self, minijinja::Error> {
        Ok(Self {
            manual: Arc::new(manual),
            templates: Arc::new(pages::templates()?),
        })
    }
}
