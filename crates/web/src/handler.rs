use async_trait::async_trait;
use futures::future::BoxFuture;

use weft_http::protocol::{HandlerError, Request};
use weft_http::response::ResponseWriter;

/// The terminal handler of a route.
///
/// Handlers borrow the request, since the dispatch layer keeps ownership
/// for the whole middleware chain, and write their response through the
/// connection's [`ResponseWriter`].
#[async_trait]
pub trait RouteHandler: Send + Sync {
    async fn handle(&self, request: &Request, response: &mut ResponseWriter) -> Result<(), HandlerError>;
}

/// Invoked when a handler or middleware returned an error and the response
/// has not been sent yet.
///
/// The error handler owns the failure; returning `Err` gives up on the
/// connection, which then closes without a response.
#[async_trait]
pub trait ErrorHandler: Send + Sync {
    async fn handle(&self, request: &Request, response: &mut ResponseWriter, error: HandlerError) -> Result<(), HandlerError>;
}

/// a `RouteHandler` built from an async closure, see [`handler_fn`]
#[derive(Debug)]
pub struct FnHandler<F> {
    f: F,
}

#[async_trait]
impl<F> RouteHandler for FnHandler<F>
where
    F: for<'a> Fn(&'a Request, &'a mut ResponseWriter) -> BoxFuture<'a, Result<(), HandlerError>> + Send + Sync,
{
    async fn handle(&self, request: &Request, response: &mut ResponseWriter) -> Result<(), HandlerError> {
        (self.f)(request, response).await
    }
}

/// Wraps an async closure as a [`RouteHandler`].
///
/// The closure boxes its future so the borrows of the request and the
/// response writer can live inside it:
///
/// ```no_run
/// use weft_web::handler_fn;
///
/// let hello = handler_fn(|request, response| {
///     Box::pin(async move {
///         let name = request.query_param("name").unwrap_or("world");
///         response.send_text(format!("hello, {name}!")).await?;
///         Ok(())
///     })
/// });
/// ```
pub fn handler_fn<F>(f: F) -> FnHandler<F>
where
    F: for<'a> Fn(&'a Request, &'a mut ResponseWriter) -> BoxFuture<'a, Result<(), HandlerError>> + Send + Sync,
{
    FnHandler { f }
}

/// an `ErrorHandler` built from an async closure, see [`error_handler_fn`]
#[derive(Debug)]
pub struct FnErrorHandler<F> {
    f: F,
}

#[async_trait]
impl<F> ErrorHandler for FnErrorHandler<F>
where
    F: for<'a> Fn(&'a Request, &'a mut ResponseWriter, HandlerError) -> BoxFuture<'a, Result<(), HandlerError>> + Send + Sync,
{
    async fn handle(&self, request: &Request, response: &mut ResponseWriter, error: HandlerError) -> Result<(), HandlerError> {
        (self.f)(request, response, error).await
    }
}

/// Wraps an async closure as an [`ErrorHandler`].
pub fn error_handler_fn<F>(f: F) -> FnErrorHandler<F>
where
    F: for<'a> Fn(&'a Request, &'a mut ResponseWriter, HandlerError) -> BoxFuture<'a, Result<(), HandlerError>> + Send + Sync,
{
    FnErrorHandler { f }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{duplex, AsyncReadExt};
    use weft_http::protocol::Method;

    fn assert_is_handler<T: RouteHandler>(_handler: &T) {
        // no op
    }

    fn assert_is_error_handler<T: ErrorHandler>(_handler: &T) {
        // no op
    }

    #[test]
    fn closures_satisfy_the_handler_traits() {
        let handler = handler_fn(|_request, response| {
            Box::pin(async move {
                response.send_text("ok").await?;
                Ok(())
            })
        });
        assert_is_handler(&handler);

        let error_handler = error_handler_fn(|_request, response, error| {
            Box::pin(async move {
                response.send_custom(500, mime::TEXT_PLAIN.as_ref(), error.to_string().as_bytes()).await?;
                Ok(())
            })
        });
        assert_is_error_handler(&error_handler);
    }

    #[tokio::test]
    async fn handler_reads_request_and_writes_response() {
        let handler = handler_fn(|request, response| {
            Box::pin(async move {
                response.send_text(format!("{} {}", request.method(), request.path())).await?;
                Ok(())
            })
        });

        let (tx, mut rx) = duplex(4096);
        let mut response = ResponseWriter::new(tx);
        let request = Request::builder().method(Method::Post).path("/answers").build();

        handler.handle(&request, &mut response).await.unwrap();
        drop(response);

        let mut out = Vec::new();
        rx.read_to_end(&mut out).await.unwrap();
        assert!(String::from_utf8(out).unwrap().ends_with("POST /answers"));
    }

    #[tokio::test]
    async fn error_handler_receives_the_failure() {
        let error_handler = error_handler_fn(|_request, response, error| {
            Box::pin(async move {
                response.send_custom(500, mime::TEXT_PLAIN.as_ref(), error.to_string().as_bytes()).await?;
                Ok(())
            })
        });

        let (tx, mut rx) = duplex(4096);
        let mut response = ResponseWriter::new(tx);
        let request = Request::builder().build();

        error_handler.handle(&request, &mut response, "database is down".into()).await.unwrap();
        drop(response);

        let mut out = Vec::new();
        rx.read_to_end(&mut out).await.unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("HTTP/1.1 500 Internal Server Error\r\n"));
        assert!(text.ends_with("database is down"));
    }
}
