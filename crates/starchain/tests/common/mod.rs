use std::sync::Arc;

use starchain::http::StarApi;
use starchain::{Blockchain, Clock, ManualClock};
use tokio::net::TcpListener;

/// 2020-06-14T17:46:32Z
pub const T0: i64 = 1_592_156_792;

/// A running API server backed by a manually driven clock.
pub struct TestApp {
    pub base_url: String,
    pub clock: Arc<ManualClock>,
    pub chain: Arc<Blockchain>,
}

/// Bind to port 0 and return the listener + the OS-assigned port.
async fn random_listener() -> (TcpListener, u16) {
    let listener = TcpListener::bind(("127.0.0.1", 0))
        .await
        .expect("TcpListener bind to port 0");
    let port = listener.local_addr().expect("local_addr").port();
    (listener, port)
}

/// Spawns the API on an OS-assigned port.
pub async fn spawn_app() -> TestApp {
    let (listener, port) = random_listener().await;

    let clock = Arc::new(ManualClock::new(T0));
    let chain = Arc::new(Blockchain::new(Arc::clone(&clock) as Arc<dyn Clock>));

    let api = StarApi::new(Arc::clone(&chain));
    tokio::spawn(async move { api.run(listener).await });

    TestApp {
        base_url: format!("http://127.0.0.1:{port}"),
        clock,
        chain,
    }
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}
