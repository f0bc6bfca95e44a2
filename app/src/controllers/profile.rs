use serde_json::{json, Value};
use std::sync::Arc;
use trellis::{Arguments, Controller, ControllerBuilder, FrameworkError};

#[derive(Default)]
pub struct ProfileController;

impl ProfileController {
    async fn show(self: Arc<Self>, args: Arguments) -> Result<Value, FrameworkError> {
        let ctx = args.context(0)?;
        Ok(json!({
            "id": 1,
            "name": "Ada",
            "authenticated": ctx.state("authenticated").is_some(),
        }))
    }
}

impl Controller for ProfileController {
    const PREFIX: &'static str = "/profile";

    fn routes(c: &mut ControllerBuilder<Self>) {
        c.get("", "show", Self::show).ctx();
    }
}

trellis::register_controller!(ProfileController);
