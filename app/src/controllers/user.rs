use crate::middleware::{RequestLog, RequireToken};
use crate::store::{NewUser, User, UserStore};
use serde_json::{json, Value};
use std::sync::Arc;
use trellis::{
    AppError, Arguments, Context, Controller, ControllerBuilder, FrameworkError, Json,
};

#[derive(Default)]
pub struct UserController {
    store: Arc<UserStore>,
}

impl UserController {
    pub fn new(store: Arc<UserStore>) -> Self {
        Self { store }
    }

    async fn index(self: Arc<Self>, args: Arguments) -> Result<Json<Vec<User>>, FrameworkError> {
        let limit = match args.optional(0)? {
            Some(_) => args.deserialize::<usize>(0)?,
            None => usize::MAX,
        };
        Ok(Json(self.store.all().into_iter().take(limit).collect()))
    }

    async fn show(self: Arc<Self>, args: Arguments) -> Result<Json<User>, FrameworkError> {
        let id: u64 = args.deserialize(0)?;
        self.store
            .find(id)
            .map(Json)
            .ok_or_else(|| AppError::not_found(format!("User {} not found", id)).into())
    }

    async fn store(self: Arc<Self>, args: Arguments) -> Result<Json<User>, FrameworkError> {
        let new: NewUser = args.deserialize(0)?;
        if new.name.trim().is_empty() || !new.email.contains('@') {
            return Err(AppError::bad_request("A name and a valid email are required").into());
        }
        Ok(Json(self.store.insert(new)))
    }

    async fn destroy(self: Arc<Self>, args: Arguments) -> Result<Value, FrameworkError> {
        let id: u64 = args.deserialize(0)?;
        self.store
            .remove(id)
            .map(|user| json!({ "deleted": user.id }))
            .ok_or_else(|| AppError::not_found(format!("User {} not found", id)).into())
    }
}

async fn created(ctx: Context, user: Option<Value>) -> Result<(), FrameworkError> {
    let user = user.unwrap_or(Value::Null);
    if let Some(id) = user.get("id") {
        ctx.set_header("Location", format!("/users/{}", id));
    }
    ctx.set_status(201);
    ctx.set_body(json!({ "data": user }));
    Ok(())
}

impl Controller for UserController {
    const PREFIX: &'static str = "/users";

    fn routes(c: &mut ControllerBuilder<Self>) {
        c.middleware(RequestLog::new("users"));

        c.get("", "index", Self::index).query_param("limit");
        c.get("/:id", "show", Self::show).param("id");
        c.post("", "store", Self::store)
            .middleware(RequireToken::from_env())
            .body()
            .response(created);
        c.delete("/:id", "destroy", Self::destroy)
            .middleware(RequireToken::from_env())
            .param("id");
    }
}

trellis::register_controller!(UserController);
