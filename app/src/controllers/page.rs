//! Pages rendered by the view layer rather than served as JSON

use serde_json::{json, Value};
use std::sync::Arc;
use trellis::{Arguments, Controller, ControllerBuilder, FrameworkError};

#[derive(Default)]
pub struct PageController;

impl PageController {
    async fn home(self: Arc<Self>, _args: Arguments) -> Result<Value, FrameworkError> {
        Ok(json!({ "title": "Welcome to trellis" }))
    }

    async fn about(self: Arc<Self>, args: Arguments) -> Result<Value, FrameworkError> {
        let section = args.optional(0)?.cloned().unwrap_or(json!("team"));
        Ok(json!({ "title": "About", "section": section }))
    }
}

impl Controller for PageController {
    fn routes(c: &mut ControllerBuilder<Self>) {
        c.get("/", "home", Self::home).view("Home");
        c.get("/about", "about", Self::about)
            .query_param("section")
            .view("About");
    }
}

trellis::register_controller!(PageController);
