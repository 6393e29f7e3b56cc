use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use weft_http::protocol::{HandlerError, Request};
use weft_http::response::ResponseWriter;
use weft_web::{error_handler_fn, handler_fn, Chain, Middleware, Router, Server};

#[derive(Serialize, Deserialize, Debug)]
pub struct User {
    name: String,
    zip: String,
}

/// Logs every request before handing it down the chain.
struct Logger;

#[async_trait]
impl Middleware for Logger {
    async fn handle(
        &self,
        request: &Request,
        response: &mut ResponseWriter,
        chain: &mut Chain<'_>,
    ) -> Result<(), HandlerError> {
        info!("{} {}", request.method(), request.path());
        chain.next(request, response).await
    }
}

/// Rejects requests that don't carry the right `X-Api-Key` header.
struct ApiKey(&'static str);

#[async_trait]
impl Middleware for ApiKey {
    async fn handle(
        &self,
        request: &Request,
        response: &mut ResponseWriter,
        chain: &mut Chain<'_>,
    ) -> Result<(), HandlerError> {
        if request.header("X-Api-Key") != Some(self.0) {
            response.send_custom(403, mime::TEXT_PLAIN.as_ref(), b"wrong api key\r\n").await?;
            return Ok(());
        }
        chain.next(request, response).await
    }
}

#[tokio::main]
async fn main() {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::INFO).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let mut server = Server::builder()
        .http_port(8080)
        .not_found_handler(handler_fn(|request, response| {
            Box::pin(async move {
                let body = format!("no route for {}\r\n", request.path());
                response.send_custom(404, mime::TEXT_PLAIN.as_ref(), body.as_bytes()).await?;
                Ok(())
            })
        }))
        .error_handler(error_handler_fn(|_request, response, error| {
            Box::pin(async move {
                let body = format!("internal error: {error}\r\n");
                response.send_custom(500, mime::TEXT_PLAIN.as_ref(), body.as_bytes()).await?;
                Ok(())
            })
        }))
        .build()
        .unwrap();

    server.add_middleware(Logger);

    // curl -v http://127.0.0.1:8080/
    server.get(
        "/",
        handler_fn(|request, response| {
            Box::pin(async move {
                let greeting = request.query_param("name").unwrap_or("world");
                response.send_text(format!("hello {greeting}\r\n")).await?;
                Ok(())
            })
        }),
    );

    // curl -v http://127.0.0.1:8080/api/users/42
    // curl -v -H 'Content-Type: application/json' -d '{"name":"hello","zip":"world"}' http://127.0.0.1:8080/api/users
    let mut api = Router::new();
    api.get(
        "/users/:id",
        handler_fn(|request, response| {
            Box::pin(async move {
                let id = request.path_param("id").unwrap_or_default().to_string();
                let user = User { name: format!("user-{id}"), zip: "10115".to_string() };
                response.send_json(&user).await?;
                Ok(())
            })
        }),
    );
    api.post(
        "/users",
        handler_fn(|request, response| {
            Box::pin(async move {
                let user: User = request.json()?;
                info!("created user {} in {}", user.name, user.zip);
                response.set_status(201);
                response.send_json(&user).await?;
                Ok(())
            })
        }),
    );
    server.mount("/api", &api);

    // curl -v -H 'X-Api-Key: letmein' http://127.0.0.1:8080/admin
    server
        .get(
            "/admin",
            handler_fn(|_request, response| {
                Box::pin(async move {
                    response.send_text("admin area\r\n").await?;
                    Ok(())
                })
            }),
        )
        .with(ApiKey("letmein"));

    // curl -v http://127.0.0.1:8080/assets/app.css
    server.serve_static("/assets", "static");

    server.listen().await.unwrap();
}
