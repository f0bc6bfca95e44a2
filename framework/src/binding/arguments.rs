use crate::controller::{Arguments, Injected, ParamExtractor};
use crate::http::Context;
use crate::middleware::Next;

/// Resolve a method's arguments for one invocation
///
/// Without extractors the method receives `[context, next]`. Otherwise each
/// extractor contributes exactly one value, in ascending index order.
pub fn resolve_arguments(params: &[ParamExtractor], ctx: &Context, next: &Next) -> Arguments {
    if params.is_empty() {
        return Arguments::new(vec![
            Injected::Context(ctx.clone()),
            Injected::Next(next.clone()),
        ]);
    }

    let mut ordered: Vec<&ParamExtractor> = params.iter().collect();
    ordered.sort_by_key(|param| param.index);

    ordered.into_iter().map(|param| param.extract(ctx)).collect::<Vec<_>>().into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::extract;
    use crate::http::UploadedFile;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn param(index: usize, f: crate::controller::ExtractFn) -> ParamExtractor {
        ParamExtractor::new(index, "action", f)
    }

    #[test]
    fn no_extractors_means_context_and_next() {
        let ctx = Context::builder().build();
        let next = Next::end();

        let args = resolve_arguments(&[], &ctx, &next);
        assert_eq!(
            args.into_vec(),
            vec![Injected::Context(ctx), Injected::Next(next)]
        );
    }

    #[test]
    fn query_values_resolve_in_index_order() {
        let ctx = Context::builder().query("id", "5").query("name", "x").build();
        let params = vec![
            param(1, extract::query_param(Some("name"))),
            param(0, extract::query_param(Some("id"))),
        ];

        let args = resolve_arguments(&params, &ctx, &Next::end());
        assert_eq!(
            args.into_vec(),
            vec![Injected::Value(json!("5")), Injected::Value(json!("x"))]
        );
    }

    #[test]
    fn one_value_per_extractor_even_when_missing() {
        let ctx = Context::builder().build();
        let params = vec![
            param(0, extract::query_param(Some("absent"))),
            param(1, extract::path_param(Some("absent"))),
        ];

        let args = resolve_arguments(&params, &ctx, &Next::end());
        assert_eq!(args.len(), 2);
        assert!(args.as_slice().iter().all(Injected::is_missing));
    }

    #[test]
    fn ties_keep_declaration_order() {
        let ctx = Context::builder().build();
        let params = vec![
            param(0, extract::custom(|_| Injected::Value(json!("first")))),
            param(0, extract::custom(|_| Injected::Value(json!("second")))),
        ];

        let args = resolve_arguments(&params, &ctx, &Next::end());
        assert_eq!(args.value(0).unwrap(), &json!("first"));
        assert_eq!(args.value(1).unwrap(), &json!("second"));
    }

    #[test]
    fn single_file_parameter() {
        let params = vec![param(0, extract::file())];

        let empty = Context::builder().build();
        let args = resolve_arguments(&params, &empty, &Next::end());
        assert_eq!(args.into_vec(), vec![Injected::Files(vec![])]);

        let upload = UploadedFile::new("avatar", "me.png", 512);
        let one = Context::builder().file(upload.clone()).build();
        let args = resolve_arguments(&params, &one, &Next::end());
        assert_eq!(args.into_vec(), vec![Injected::File(upload)]);
    }
}
