//! HTTP ingestion endpoint for Seal Chain.
//!
//! Every request path is percent-decoded into one entry and handed to the
//! block assembler's intake. The response reports the current block number.

pub mod config;
pub mod error;
pub mod handler;
pub mod router;
pub mod server;

pub use config::{ServerConfig, DEFAULT_PORT};
pub use error::{ServerError, ServerResult};
pub use handler::AppState;
pub use server::SealServer;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use seal_ledger::InMemoryLedger;
    use seal_node::{Node, NodeConfig};
    use seal_types::Entry;
    use tower::util::ServiceExt;

    fn node(ledger: InMemoryLedger) -> seal_node::NodeHandle {
        let config = NodeConfig {
            block_size: 2,
            buffer_size: 4,
            difficulty: 1,
            resume: false,
            ..Default::default()
        };
        Node::start(config, ledger).unwrap()
    }

    fn state(node: &seal_node::NodeHandle) -> AppState {
        AppState {
            intake: node.intake(),
            tip: node.tip(),
        }
    }

    async fn get(app: axum::Router, uri: &str) -> (StatusCode, String) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn ingest_reports_block_number() {
        let ledger = InMemoryLedger::new();
        let node = node(ledger.clone());
        let app = router::build_router(state(&node));

        let (status, body) = get(app, "/hello").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "Block Number is 0\n");
        node.finished().await.unwrap();
    }

    #[tokio::test]
    async fn two_requests_seal_one_block_in_order() {
        let ledger = InMemoryLedger::new();
        let node = node(ledger.clone());
        let app = router::build_router(state(&node));

        assert_eq!(get(app.clone(), "/x").await.0, StatusCode::OK);
        assert_eq!(get(app.clone(), "/y").await.0, StatusCode::OK);
        drop(app);

        let report = node.finished().await.unwrap();
        assert_eq!(report.blocks_sealed, 1);
        assert_eq!(ledger.blocks()[0].entries(), &[Entry::from("x"), Entry::from("y")]);
    }

    #[tokio::test]
    async fn path_is_percent_decoded() {
        let ledger = InMemoryLedger::new();
        let node = node(ledger.clone());
        let app = router::build_router(state(&node));

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/a%20b/c?ignored=1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(get(app.clone(), "/").await.0, StatusCode::OK);
        assert_eq!(get(app.clone(), "/%FF%41").await.0, StatusCode::OK);
        assert_eq!(get(app.clone(), "/%2F").await.0, StatusCode::OK);
        drop(app);

        node.finished().await.unwrap();
        let blocks = ledger.blocks();
        assert_eq!(blocks[0].entries(), &[Entry::from("a b/c"), Entry::from("")]);
        assert_eq!(
            blocks[1].entries(),
            &[Entry::from(vec![0xff, b'A']), Entry::from("/")]
        );
    }

    #[tokio::test]
    async fn encoded_line_break_is_rejected() {
        let ledger = InMemoryLedger::new();
        let node = node(ledger.clone());
        let app = router::build_router(state(&node));

        let (status, _) = get(app, "/a%0Ab").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let report = node.finished().await.unwrap();
        assert_eq!(report.unsealed_entries, 0);
        assert!(ledger.is_empty());
    }

    #[tokio::test]
    async fn stopped_worker_yields_service_unavailable() {
        let (intake, stream) = seal_node::intake::channel(1);
        drop(stream);
        let tip = std::sync::Arc::new(seal_node::TipView::new(seal_node::ChainTip::genesis(
            seal_types::Digest::zero(),
        )));
        let app = router::build_router(AppState { intake, tip });

        let (status, _) = get(app, "/late").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }
}
