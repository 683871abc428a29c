use quotecrab::transport::http::router;
use quotecrab::{AllocationTracker, ApiKeyGate, AppState, Metrics, Quote, QuoteStore};
use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::Arc;

const API_KEY: &str = "integration-key";

struct TestServer {
    addr: SocketAddr,
    state: Arc<AppState>,
    client: reqwest::Client,
}

impl TestServer {
    async fn start(content: &str) -> Self {
        let quotes = Arc::new(QuoteStore::parse(content).unwrap());
        let state = Arc::new(AppState::new(
            AllocationTracker::new(quotes),
            ApiKeyGate::new(Some(API_KEY.to_string())),
            Arc::new(Metrics::new()),
        ));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = router(state.clone());
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            state,
            client: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    async fn get(&self, path: &str, key: Option<&str>) -> reqwest::Response {
        let mut request = self.client.get(self.url(path));
        if let Some(key) = key {
            request = request.header("X-API-Key", key);
        }
        request.send().await.unwrap()
    }
}

#[tokio::test]
async fn test_daily_allocation_scenario() {
    let server = TestServer::start("A\tQ1\nB\tQ2\nC\tQ3").await;

    let mut received = Vec::new();
    for _ in 0..3 {
        let resp = server.get("/random?clientId=c1", Some(API_KEY)).await;
        assert_eq!(resp.status(), 200);
        received.push(resp.json::<Quote>().await.unwrap());
    }

    let texts: HashSet<&str> = received.iter().map(|q| q.text.as_str()).collect();
    assert_eq!(texts, HashSet::from(["Q1", "Q2", "Q3"]));
    for quote in &received {
        let expected_author = match quote.text.as_str() {
            "Q1" => "A",
            "Q2" => "B",
            _ => "C",
        };
        assert_eq!(quote.author, expected_author);
    }

    let resp = server.get("/random?clientId=c1", Some(API_KEY)).await;
    assert_eq!(resp.status(), 429);
    assert_eq!(
        resp.text().await.unwrap(),
        r#"{"error":"no more quotes for today"}"#
    );

    // Another client is unaffected
    let resp = server.get("/random?clientId=c2", Some(API_KEY)).await;
    assert_eq!(resp.status(), 200);

    server.state.tracker.reset_all();
    let resp = server.get("/random?clientId=c1", Some(API_KEY)).await;
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn test_quotes_listing_and_auth() {
    let server = TestServer::start("A\tQ1\nmalformed\nB\tQ2").await;

    let resp = server.get("/quotes", None).await;
    assert_eq!(resp.status(), 401);
    assert_eq!(resp.text().await.unwrap(), r#"{"error":"unauthorized"}"#);

    let resp = server.get("/quotes", Some("wrong")).await;
    assert_eq!(resp.status(), 401);

    let resp = server.get("/quotes", Some(API_KEY)).await;
    assert_eq!(resp.status(), 200);
    let quotes: Vec<Quote> = resp.json().await.unwrap();
    assert_eq!(quotes, vec![Quote::new("A", "Q1"), Quote::new("B", "Q2")]);
}

#[tokio::test]
async fn test_concurrent_clients_over_http() {
    let corpus: String = (0..10).map(|i| format!("Author {i}\tQuote {i}\n")).collect();
    let server = Arc::new(TestServer::start(&corpus).await);

    let mut handles = vec![];
    for _ in 0..15 {
        let server = server.clone();
        handles.push(tokio::spawn(async move {
            let resp = server.get("/random?clientId=shared", Some(API_KEY)).await;
            let status = resp.status().as_u16();
            let quote = if status == 200 {
                Some(resp.json::<Quote>().await.unwrap())
            } else {
                None
            };
            (status, quote)
        }));
    }

    let mut texts = HashSet::new();
    let mut limited = 0;
    for h in handles {
        match h.await.unwrap() {
            (200, Some(quote)) => assert!(texts.insert(quote.text)),
            (429, None) => limited += 1,
            other => panic!("unexpected response {other:?}"),
        }
    }

    assert_eq!(texts.len(), 10);
    assert_eq!(limited, 5);
    assert_eq!(server.state.tracker.client_count(), 1);
}
