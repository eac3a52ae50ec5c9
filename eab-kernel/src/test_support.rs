// Outils partagés par les tests : faux webhook local + attente des tâches détachées

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use serde_json::Value;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

/// Faux webhook local qui renvoie `status` et transmet les corps reçus
pub async fn fake_webhook(status: StatusCode) -> (String, mpsc::UnboundedReceiver<Value>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let app = Router::new()
        .route(
            "/hook",
            post(move |State(tx): State<mpsc::UnboundedSender<Value>>, Json(body): Json<Value>| async move {
                let _ = tx.send(body);
                status
            }),
        )
        .with_state(tx);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}/hook"), rx)
}

/// Attend qu'une condition devienne vraie (tâche détachée terminée), 5s max
pub async fn wait_until<F: Fn() -> bool>(cond: F) -> bool {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while tokio::time::Instant::now() < deadline {
        if cond() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    cond()
}

/// Prochain corps reçu par le faux webhook, `None` si rien dans `within`
pub async fn next_body(rx: &mut mpsc::UnboundedReceiver<Value>, within: Duration) -> Option<Value> {
    tokio::time::timeout(within, rx.recv()).await.ok().flatten()
}
