mod body;
mod context;
mod request;
mod response;

pub use body::{collect_body, parse_body};
pub use context::{Context, ContextBuilder, ResponseState};
pub use request::{RequestData, UploadedFile};
pub use response::HttpResponse;
