//! Serves the same routes over plain HTTP and TLS.
//!
//! Generate a self-signed certificate first:
//!
//! ```text
//! openssl req -x509 -newkey rsa:2048 -keyout key.pem -out cert.pem \
//!     -days 365 -nodes -subj "/CN=localhost"
//! ```

use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use weft_web::{handler_fn, Server};

#[tokio::main]
async fn main() {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::DEBUG).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let mut server = Server::builder()
        .http_port(8080)
        .https_port(8443)
        .private_key("key.pem")
        .certificate("cert.pem")
        .build()
        .unwrap();

    // curl -vk https://127.0.0.1:8443/
    server.get(
        "/",
        handler_fn(|request, response| {
            Box::pin(async move {
                let peer = request.remote_addr().map(|addr| addr.to_string()).unwrap_or_default();
                response.send_text(format!("hello {peer}\r\n")).await?;
                Ok(())
            })
        }),
    );

    server.listen().await.unwrap();
}
