use async_trait::async_trait;
use futures::future::BoxFuture;

use crate::protocol::{HandlerError, Request};
use crate::response::ResponseWriter;

/// The application seam of the wire layer.
///
/// A connection hands the parsed request to its handler together with the
/// response writer for that connection. The handler owns the request;
/// whatever it does not send before returning is never sent.
#[async_trait]
pub trait Handler {
    async fn handle(&self, request: Request, response: &mut ResponseWriter) -> Result<(), HandlerError>;
}

/// A [`Handler`] built from a closure, see [`make_handler`].
#[derive(Debug)]
pub struct HandlerFn<F> {
    f: F,
}

#[async_trait]
impl<F> Handler for HandlerFn<F>
where
    F: for<'a> Fn(Request, &'a mut ResponseWriter) -> BoxFuture<'a, Result<(), HandlerError>> + Send + Sync,
{
    async fn handle(&self, request: Request, response: &mut ResponseWriter) -> Result<(), HandlerError> {
        (self.f)(request, response).await
    }
}

/// Wraps an async closure as a [`Handler`].
///
/// The closure must box its future, which keeps the borrow of the response
/// writer inside the returned future:
///
/// ```no_run
/// use weft_http::handler::make_handler;
///
/// let handler = make_handler(|request, response| {
///     Box::pin(async move {
///         response.send_text(format!("hello from {}", request.path())).await?;
///         Ok(())
///     })
/// });
/// ```
pub fn make_handler<F>(f: F) -> HandlerFn<F>
where
    F: for<'a> Fn(Request, &'a mut ResponseWriter) -> BoxFuture<'a, Result<(), HandlerError>> + Send + Sync,
{
    HandlerFn { f }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::Method;
    use tokio::io::{duplex, AsyncReadExt};

    #[tokio::test]
    async fn closure_handler_sees_request_and_writes_response() {
        let handler = make_handler(|request: Request, response| {
            Box::pin(async move {
                response.send_text(format!("path={}", request.path())).await?;
                Ok(())
            })
        });

        let (tx, mut rx) = duplex(4096);
        let mut response = ResponseWriter::new(tx);
        let request = Request::builder().method(Method::Get).path("/ping").build();

        handler.handle(request, &mut response).await.unwrap();
        drop(response);

        let mut out = Vec::new();
        rx.read_to_end(&mut out).await.unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.ends_with("path=/ping"));
    }
}
