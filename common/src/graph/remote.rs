use std::{path::Path, time::Duration};

use async_trait::async_trait;
use reqwest::{multipart, Client, RequestBuilder, Response};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;
use url::Url;

use super::{GraphBackend, SearchHit, SourceRef};
use crate::{error::AppError, utils::config::AppConfig};

const SEARCH_TYPE: &str = "GRAPH_COMPLETION";
const ERROR_BODY_LIMIT: usize = 512;
const TEXT_FIELDS: [&str; 3] = ["answer", "text", "content"];

/// Graph backend reached over the knowledge-graph service's REST API.
pub struct RemoteGraphBackend {
    client: Client,
    base_url: Url,
    api_key: Option<String>,
    dataset: String,
}

#[derive(Serialize)]
struct PruneRequest {
    data: bool,
    system: bool,
    metadata: bool,
}

#[derive(Serialize)]
struct CognifyRequest<'a> {
    datasets: [&'a str; 1],
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchRequest<'a> {
    search_type: &'a str,
    query: &'a str,
    datasets: [&'a str; 1],
}

impl RemoteGraphBackend {
    pub fn new(
        base_url: &str,
        api_key: Option<String>,
        dataset: String,
        timeout: Duration,
    ) -> Result<Self, AppError> {
        let mut base_url = Url::parse(base_url).map_err(|e| {
            AppError::Validation(format!("Invalid graph service url {base_url}: {e}"))
        })?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url,
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            dataset,
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, AppError> {
        Self::new(
            &config.graph_service_url,
            config.graph_service_api_key.clone(),
            config.graph_dataset.clone(),
            Duration::from_secs(config.graph_request_timeout_secs),
        )
    }

    fn endpoint(&self, path: &str) -> Result<Url, AppError> {
        self.base_url
            .join(path)
            .map_err(|e| AppError::InternalError(format!("Invalid graph endpoint {path}: {e}")))
    }

    fn post(&self, path: &str) -> Result<RequestBuilder, AppError> {
        let request = self.client.post(self.endpoint(path)?);
        Ok(match &self.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        })
    }

    async fn send(request: RequestBuilder, operation: &str) -> Result<Response, AppError> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let excerpt: String = body.chars().take(ERROR_BODY_LIMIT).collect();
        Err(AppError::Graph(format!("{operation} failed with {status}: {excerpt}")))
    }
}

#[async_trait]
impl GraphBackend for RemoteGraphBackend {
    async fn reset(&self) -> Result<(), AppError> {
        let request = self.post("api/v1/prune")?.json(&PruneRequest {
            data: true,
            system: true,
            metadata: true,
        });
        Self::send(request, "prune").await?;
        Ok(())
    }

    async fn ingest(&self, source: &Path) -> Result<(), AppError> {
        let bytes = tokio::fs::read(source).await?;
        let file_name = source
            .file_name()
            .map_or_else(|| "corpus.txt".to_string(), |name| name.to_string_lossy().into_owned());
        debug!(file = %file_name, bytes = bytes.len(), "uploading corpus to graph service");

        let part = multipart::Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("text/plain")?;
        let form = multipart::Form::new()
            .part("data", part)
            .text("datasetName", self.dataset.clone());

        Self::send(self.post("api/v1/add")?.multipart(form), "add").await?;
        Ok(())
    }

    async fn build_graph(&self) -> Result<(), AppError> {
        let request = self.post("api/v1/cognify")?.json(&CognifyRequest {
            datasets: [self.dataset.as_str()],
        });
        Self::send(request, "cognify").await?;
        Ok(())
    }

    async fn query(&self, question: &str) -> Result<Vec<SearchHit>, AppError> {
        let request = self.post("api/v1/search")?.json(&SearchRequest {
            search_type: SEARCH_TYPE,
            query: question,
            datasets: [self.dataset.as_str()],
        });
        let body: Value = Self::send(request, "search").await?.json().await?;

        Ok(parse_search_hits(body))
    }
}

/// Flattens a search response into hits. Strings are answer text; objects may
/// carry text and a citation.
pub(crate) fn parse_search_hits(body: Value) -> Vec<SearchHit> {
    let items = match body {
        Value::Array(items) => items,
        Value::Null => Vec::new(),
        other => vec![other],
    };

    items.into_iter().map(parse_hit).collect()
}

fn parse_hit(item: Value) -> SearchHit {
    match item {
        Value::String(text) => SearchHit {
            text: Some(text),
            source: None,
        },
        Value::Object(fields) => {
            let text = TEXT_FIELDS
                .iter()
                .find_map(|key| fields.get(*key).and_then(Value::as_str))
                .map(str::to_string);
            let source = fields
                .get("title")
                .and_then(Value::as_str)
                .map(|title| SourceRef {
                    title: title.to_string(),
                    url: fields.get("url").and_then(Value::as_str).map(str::to_string),
                });
            SearchHit { text, source }
        }
        Value::Null => SearchHit::default(),
        other => SearchHit {
            text: Some(other.to_string()),
            source: None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{io::Write, sync::Arc};

    use axum::{
        extract::Multipart,
        http::{header::AUTHORIZATION, HeaderMap, StatusCode},
        routing::post,
        Json, Router,
    };
    use serde_json::json;
    use tokio::sync::Mutex;

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind graph stub");
        let addr = listener.local_addr().expect("stub addr");
        tokio::spawn(async move {
            axum::serve(listener, router).await.ok();
        });
        format!("http://{addr}")
    }

    fn backend_at(base_url: &str, api_key: Option<&str>) -> RemoteGraphBackend {
        RemoteGraphBackend::new(
            base_url,
            api_key.map(str::to_string),
            "books".into(),
            Duration::from_secs(5),
        )
        .expect("valid backend")
    }

    #[tokio::test]
    async fn non_success_status_becomes_graph_error_with_truncated_body() {
        let router = Router::new().route(
            "/api/v1/prune",
            post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "x".repeat(2000)) }),
        );
        let backend = backend_at(&serve(router).await, None);

        let err = backend.reset().await.expect_err("prune should fail");
        let message = match err {
            AppError::Graph(message) => message,
            other => panic!("expected graph error, got {other:?}"),
        };
        assert!(message.starts_with("prune failed with 500"), "{message}");
        assert_eq!(message.matches('x').count(), ERROR_BODY_LIMIT);
    }

    #[tokio::test]
    async fn bearer_header_is_sent_only_when_a_key_is_configured() {
        let seen: Arc<Mutex<Vec<(Option<String>, Value)>>> = Arc::default();
        let recorder = Arc::clone(&seen);
        let router = Router::new().route(
            "/api/v1/cognify",
            post(move |headers: HeaderMap, Json(body): Json<Value>| {
                let recorder = Arc::clone(&recorder);
                async move {
                    let auth = headers
                        .get(AUTHORIZATION)
                        .and_then(|value| value.to_str().ok())
                        .map(str::to_string);
                    recorder.lock().await.push((auth, body));
                    StatusCode::OK
                }
            }),
        );
        let base_url = serve(router).await;

        backend_at(&base_url, Some("graph-secret"))
            .build_graph()
            .await
            .expect("cognify with key");
        backend_at(&base_url, None)
            .build_graph()
            .await
            .expect("cognify without key");

        let seen = seen.lock().await;
        let auth: Vec<Option<&str>> = seen.iter().map(|(auth, _)| auth.as_deref()).collect();
        assert_eq!(auth, vec![Some("Bearer graph-secret"), None]);
        for (_, body) in seen.iter() {
            assert_eq!(*body, json!({"datasets": ["books"]}));
        }
    }

    #[tokio::test]
    async fn ingest_uploads_corpus_as_multipart_with_dataset_name() {
        let seen: Arc<Mutex<Vec<(String, String)>>> = Arc::default();
        let recorder = Arc::clone(&seen);
        let router = Router::new().route(
            "/api/v1/add",
            post(move |mut multipart: Multipart| {
                let recorder = Arc::clone(&recorder);
                async move {
                    while let Ok(Some(field)) = multipart.next_field().await {
                        let name = field.name().unwrap_or_default().to_string();
                        let text = field.text().await.unwrap_or_default();
                        recorder.lock().await.push((name, text));
                    }
                    StatusCode::OK
                }
            }),
        );
        let backend = backend_at(&serve(router).await, None);

        let mut corpus = tempfile::NamedTempFile::new().expect("corpus file");
        write!(corpus, "The boy who lived.").expect("write corpus");
        backend.ingest(corpus.path()).await.expect("add succeeds");

        assert_eq!(
            *seen.lock().await,
            vec![
                ("data".to_string(), "The boy who lived.".to_string()),
                ("datasetName".to_string(), "books".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn search_sends_camel_case_body_and_parses_hits() {
        let seen: Arc<Mutex<Vec<Value>>> = Arc::default();
        let recorder = Arc::clone(&seen);
        let router = Router::new().route(
            "/api/v1/search",
            post(move |Json(body): Json<Value>| {
                let recorder = Arc::clone(&recorder);
                async move {
                    recorder.lock().await.push(body);
                    Json(json!([
                        "Hagrid delivered the letter.",
                        {"answer": "On his eleventh birthday.", "title": "Book 1"}
                    ]))
                }
            }),
        );
        let backend = backend_at(&serve(router).await, None);

        let hits = backend.query("Who delivered the letter?").await.expect("search");

        assert_eq!(
            *seen.lock().await,
            vec![json!({
                "searchType": "GRAPH_COMPLETION",
                "query": "Who delivered the letter?",
                "datasets": ["books"]
            })]
        );
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].text.as_deref(), Some("Hagrid delivered the letter."));
        assert_eq!(hits[1].text.as_deref(), Some("On his eleventh birthday."));
        assert_eq!(
            hits[1].source,
            Some(SourceRef {
                title: "Book 1".into(),
                url: None
            })
        );
    }

    #[test]
    fn string_results_become_text_hits() {
        let hits = parse_search_hits(json!(["Hagrid delivered the letter.", "second"]));
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].text.as_deref(), Some("Hagrid delivered the letter."));
        assert!(hits[0].source.is_none());
    }

    #[test]
    fn object_results_carry_text_and_source() {
        let hits = parse_search_hits(json!([
            {"content": "Platform nine and three-quarters", "title": "Book 1", "url": "https://example.com/1"},
            {"title": "Book 2"},
            {"unrelated": 3}
        ]));

        assert_eq!(hits[0].text.as_deref(), Some("Platform nine and three-quarters"));
        assert_eq!(
            hits[0].source,
            Some(SourceRef {
                title: "Book 1".into(),
                url: Some("https://example.com/1".into())
            })
        );
        assert!(hits[1].text.is_none());
        assert_eq!(hits[1].source.as_ref().map(|s| s.url.clone()), Some(None));
        assert_eq!(hits[2], SearchHit::default());
    }

    #[test]
    fn non_array_bodies_are_wrapped() {
        assert!(parse_search_hits(Value::Null).is_empty());

        let hits = parse_search_hits(json!("single answer"));
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].text.as_deref(), Some("single answer"));

        let hits = parse_search_hits(json!([42]));
        assert_eq!(hits[0].text.as_deref(), Some("42"));
    }

    #[test]
    fn base_url_gains_trailing_slash_for_joins() {
        let backend = RemoteGraphBackend::new(
            "http://graph.internal:8000/prefix",
            Some("  ".into()),
            "books".into(),
            Duration::from_secs(5),
        )
        .expect("valid url");

        let endpoint = backend.endpoint("api/v1/search").expect("joined endpoint");
        assert_eq!(
            endpoint.as_str(),
            "http://graph.internal:8000/prefix/api/v1/search"
        );
        assert!(backend.api_key.is_none());
    }

    #[test]
    fn invalid_base_url_is_a_validation_error() {
        let result = RemoteGraphBackend::new("not a url", None, "books".into(), Duration::from_secs(1));
        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}
