use weft_web::{handler_fn, Server};

#[tokio::main]
async fn main() {
    let mut server = Server::builder().http_port(3000).build().unwrap();

    server.get(
        "/",
        handler_fn(|_request, response| {
            Box::pin(async move {
                response.send_text("hello world").await?;
                Ok(())
            })
        }),
    );

    server.listen().await.unwrap();
}
