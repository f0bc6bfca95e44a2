//! Minimal page renderer for view routes
//!
//! View routes never reach the router through the binder. This renderer
//! mounts each one itself and answers with the page component plus the
//! controller's data as props. The view's own middleware runs inside
//! `ViewDescriptor::invoke`, before the controller method.

use serde_json::json;
use trellis::{
    async_trait, middleware::into_boxed, Context, FrameworkError, HandlerResult, Middleware, Next,
    RouteRegistrar, ViewDescriptor,
};

pub struct PageRenderer {
    view: ViewDescriptor,
}

#[async_trait]
impl Middleware for PageRenderer {
    async fn handle(&self, ctx: Context, _next: Next) -> HandlerResult {
        let props = self.view.invoke(ctx.clone()).await?;
        let page = json!({
            "component": self.view.component,
            "url": ctx.path(),
            "props": props,
        });
        ctx.set_body(page.clone());
        Ok(Some(page))
    }
}

/// Register a renderer for every view
pub fn mount<R: RouteRegistrar + ?Sized>(
    router: &mut R,
    views: Vec<ViewDescriptor>,
) -> Result<(), FrameworkError> {
    for view in views {
        let (method, path) = (view.method, view.path.clone());
        router.register(method, &path, vec![into_boxed(PageRenderer { view })])?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controllers::PageController;
    use trellis::testing::RecordingRouter;
    use trellis::{bind_routes, definition, HttpMethod};

    #[tokio::test]
    async fn pages_render_component_and_props() {
        let mut router = RecordingRouter::new();
        let views = bind_routes(&mut router, &[definition::<PageController>().unwrap()], None)
            .unwrap();
        assert!(router.registrations().is_empty());

        mount(&mut router, views).unwrap();
        let ctx = Context::builder()
            .path("/about")
            .query("section", "history")
            .build();
        router.invoke(HttpMethod::Get, "/about", ctx.clone()).await.unwrap();

        assert_eq!(
            ctx.body(),
            Some(json!({
                "component": "About",
                "url": "/about",
                "props": {"title": "About", "section": "history"},
            }))
        );
    }
}
