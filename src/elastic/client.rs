//! HTTP client wrapper for interacting with Elasticsearch.

use crate::config::Config;
use crate::elastic::types::{
    AggregationResponse, CountResponse, ElasticError, IndexDocumentResponse, SearchResponse,
    TERMS_AGGREGATION_NAME, TermsBucket,
};
use reqwest::{Client, Method, Url};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Map, Value, json};

/// Lightweight HTTP client for the handful of Elasticsearch APIs the service proxies.
///
/// Index names, field names, and document ids are used exactly as supplied. Each one becomes a
/// single percent-encoded path segment (or a JSON key), and the engine decides whether it is
/// acceptable.
pub struct ElasticService {
    pub(crate) client: Client,
    pub(crate) base_url: Url,
    pub(crate) api_key: Option<String>,
}

impl ElasticService {
    /// Construct a new client from the loaded configuration.
    pub fn new(config: &Config) -> Result<Self, ElasticError> {
        let client = Client::builder().user_agent("employee-search/0.1").build()?;
        let base_url = normalize_base_url(&config.elasticsearch_url)?;
        tracing::debug!(
            url = %base_url,
            has_api_key = config
                .elasticsearch_api_key
                .as_deref()
                .is_some_and(|value| !value.is_empty()),
            "Initialized Elasticsearch HTTP client"
        );

        Ok(Self {
            client,
            base_url,
            api_key: config.elasticsearch_api_key.clone(),
        })
    }

    /// Probe the cluster root endpoint.
    pub async fn ping(&self) -> Result<(), ElasticError> {
        let response = self.request(Method::GET, &[])?.send().await?;
        self.ensure_success(response, || {
            tracing::debug!(url = %self.base_url, "Elasticsearch reachable");
        })
        .await
    }

    /// Create an empty index. Fails when the index already exists.
    pub async fn create_index(&self, index: &str) -> Result<(), ElasticError> {
        let response = self.request(Method::PUT, &[index])?.send().await?;
        self.ensure_success(response, || {
            tracing::debug!(index, "Index created");
        })
        .await
    }

    /// Persist one document and return the identifier assigned by the engine.
    pub async fn index_document<T>(&self, index: &str, document: &T) -> Result<String, ElasticError>
    where
        T: Serialize + ?Sized,
    {
        let response = self
            .request(Method::POST, &[index, "_doc"])?
            .json(document)
            .send()
            .await?;
        let IndexDocumentResponse { id } = self.read_json(response).await?;
        tracing::debug!(index, id = %id, "Document indexed");
        Ok(id)
    }

    /// Run a `match` query of `value` against `field` and return the raw hit objects.
    pub async fn search_match(
        &self,
        index: &str,
        field: &str,
        value: &str,
    ) -> Result<Vec<Value>, ElasticError> {
        let mut clause = Map::new();
        clause.insert(field.to_string(), Value::String(value.to_string()));
        let body = json!({ "query": { "match": clause } });

        let response = self
            .request(Method::POST, &[index, "_search"])?
            .json(&body)
            .send()
            .await?;
        let SearchResponse { hits } = self.read_json(response).await?;
        tracing::debug!(index, field, hits = hits.hits.len(), "Match query completed");
        Ok(hits.hits)
    }

    /// Return the number of documents stored in `index`.
    pub async fn count(&self, index: &str) -> Result<u64, ElasticError> {
        let response = self
            .request(Method::GET, &[index, "_count"])?
            .send()
            .await?;
        let CountResponse { count } = self.read_json(response).await?;
        Ok(count)
    }

    /// Delete one document by id. A missing document is reported as an error.
    pub async fn delete_document(&self, index: &str, id: &str) -> Result<(), ElasticError> {
        let response = self
            .request(Method::DELETE, &[index, "_doc", id])?
            .send()
            .await?;
        self.ensure_success(response, || {
            tracing::debug!(index, id, "Document deleted");
        })
        .await
    }

    /// Group documents by the keyword sub-field of `field` and return the buckets in engine
    /// order (descending document count).
    pub async fn terms_aggregation(
        &self,
        index: &str,
        field: &str,
    ) -> Result<Vec<TermsBucket>, ElasticError> {
        let mut aggregations = Map::new();
        aggregations.insert(
            TERMS_AGGREGATION_NAME.to_string(),
            json!({ "terms": { "field": format!("{field}.keyword") } }),
        );
        let body = json!({ "size": 0, "aggs": aggregations });

        let response = self
            .request(Method::POST, &[index, "_search"])?
            .json(&body)
            .send()
            .await?;
        let AggregationResponse { aggregations } = self.read_json(response).await?;
        Ok(aggregations.department_count.buckets)
    }

    fn request(
        &self,
        method: Method,
        segments: &[&str],
    ) -> Result<reqwest::RequestBuilder, ElasticError> {
        let url = endpoint(&self.base_url, segments)?;
        let mut req = self.client.request(method, url);
        if let Some(api_key) = &self.api_key
            && !api_key.is_empty()
        {
            req = req.header(reqwest::header::AUTHORIZATION, format!("ApiKey {api_key}"));
        }
        Ok(req)
    }

    async fn ensure_success<F>(
        &self,
        response: reqwest::Response,
        on_success: F,
    ) -> Result<(), ElasticError>
    where
        F: FnOnce(),
    {
        if response.status().is_success() {
            on_success();
            Ok(())
        } else {
            Err(failure(response).await)
        }
    }

    async fn read_json<T>(&self, response: reqwest::Response) -> Result<T, ElasticError>
    where
        T: DeserializeOwned,
    {
        if !response.status().is_success() {
            return Err(failure(response).await);
        }
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|err| {
            let error = ElasticError::Decode(err.to_string());
            tracing::error!(error = %error, "Elasticsearch response did not match expected shape");
            error
        })
    }
}

async fn failure(response: reqwest::Response) -> ElasticError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let error = ElasticError::UnexpectedStatus { status, body };
    tracing::error!(error = %error, "Elasticsearch request failed");
    error
}

fn normalize_base_url(url: &str) -> Result<Url, ElasticError> {
    let mut parsed = Url::parse(url).map_err(|err| ElasticError::InvalidUrl(err.to_string()))?;
    if parsed.cannot_be_a_base() {
        return Err(ElasticError::InvalidUrl(format!(
            "{url} cannot be used as a base URL"
        )));
    }
    let path = parsed.path().trim_end_matches('/').to_string();
    parsed.set_path(&path);
    Ok(parsed)
}

fn endpoint(base: &Url, segments: &[&str]) -> Result<Url, ElasticError> {
    // Percent-encoding does not help: `%2e%2e` is normalized exactly like `..`.
    if let Some(segment) = segments
        .iter()
        .find(|segment| matches!(**segment, "." | ".."))
    {
        return Err(ElasticError::DotSegment((*segment).to_string()));
    }
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|()| ElasticError::InvalidUrl(base.to_string()))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::{
        Method::{DELETE, GET, POST, PUT},
        MockServer,
    };
    use reqwest::StatusCode;

    fn service_for(server: &MockServer) -> ElasticService {
        let config = Config {
            elasticsearch_url: server.base_url(),
            ..Config::default()
        };
        ElasticService::new(&config).expect("client")
    }

    #[test]
    fn endpoint_encodes_each_segment() {
        let base = normalize_base_url("http://localhost:9200/").expect("base");
        let url = endpoint(&base, &["team a", "_doc", "x/y"]).expect("url");
        assert_eq!(url.as_str(), "http://localhost:9200/team%20a/_doc/x%2Fy");
    }

    #[test]
    fn endpoint_rejects_dot_segments() {
        let base = normalize_base_url("http://localhost:9200").expect("base");
        for segment in [".", ".."] {
            match endpoint(&base, &[segment, "_count"]) {
                Err(ElasticError::DotSegment(name)) => assert_eq!(name, segment),
                other => panic!("expected dot segment error for {segment:?}, got {other:?}"),
            }
        }
        let url = endpoint(&base, &["...", ".hidden"]).expect("url");
        assert_eq!(url.as_str(), "http://localhost:9200/.../.hidden");
    }

    #[tokio::test]
    async fn dot_index_names_never_reach_cluster_wide_apis() {
        let server = MockServer::start_async().await;
        let cluster_count = server
            .mock_async(|when, then| {
                when.method(GET).path("/_count");
                then.status(200).json_body(json!({ "count": 999 }));
            })
            .await;
        let cluster_search = server
            .mock_async(|when, then| {
                when.method(POST).path("/_search");
                then.status(200).json_body(json!({ "hits": { "hits": [] } }));
            })
            .await;

        let elastic = service_for(&server);
        for index in [".", ".."] {
            assert!(matches!(
                elastic.count(index).await,
                Err(ElasticError::DotSegment(_))
            ));
            assert!(matches!(
                elastic.search_match(index, "Name", "Ada").await,
                Err(ElasticError::DotSegment(_))
            ));
            assert!(matches!(
                elastic.terms_aggregation(index, "Department").await,
                Err(ElasticError::DotSegment(_))
            ));
            assert!(matches!(
                elastic.delete_document("employees", index).await,
                Err(ElasticError::DotSegment(_))
            ));
        }
        cluster_count.assert_hits_async(0).await;
        cluster_search.assert_hits_async(0).await;
    }

    #[test]
    fn endpoint_keeps_base_path_prefix() {
        let base = normalize_base_url("http://proxy.local/es/").expect("base");
        let url = endpoint(&base, &["employees", "_count"]).expect("url");
        assert_eq!(url.as_str(), "http://proxy.local/es/employees/_count");
    }

    #[test]
    fn rejects_unparsable_base_url() {
        let config = Config {
            elasticsearch_url: "not a url".into(),
            ..Config::default()
        };
        assert!(matches!(
            ElasticService::new(&config),
            Err(ElasticError::InvalidUrl(_))
        ));
    }

    #[tokio::test]
    async fn create_index_issues_put() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(PUT).path("/employees");
                then.status(200).json_body(json!({
                    "acknowledged": true,
                    "shards_acknowledged": true,
                    "index": "employees"
                }));
            })
            .await;

        service_for(&server)
            .create_index("employees")
            .await
            .expect("create index");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn create_index_surfaces_existing_index_conflict() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(PUT).path("/employees");
                then.status(400).json_body(json!({
                    "error": {
                        "type": "resource_already_exists_exception",
                        "reason": "index [employees/abc] already exists"
                    },
                    "status": 400
                }));
            })
            .await;

        let err = service_for(&server)
            .create_index("employees")
            .await
            .expect_err("conflict");
        match err {
            ElasticError::UnexpectedStatus { status, body } => {
                assert_eq!(status, StatusCode::BAD_REQUEST);
                assert!(body.contains("resource_already_exists_exception"));
            }
            other => panic!("expected status error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn index_document_returns_assigned_id() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/employees/_doc")
                    .json_body(json!({ "Name": "Ada", "Department": "Eng" }));
                then.status(201).json_body(json!({
                    "_index": "employees",
                    "_id": "doc-1",
                    "result": "created"
                }));
            })
            .await;

        let id = service_for(&server)
            .index_document(
                "employees",
                &json!({ "Name": "Ada", "Department": "Eng" }),
            )
            .await
            .expect("index document");

        mock.assert_async().await;
        assert_eq!(id, "doc-1");
    }

    #[tokio::test]
    async fn search_match_sends_match_query_and_returns_raw_hits() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/employees/_search")
                    .json_body(json!({ "query": { "match": { "Department": "Eng" } } }));
                then.status(200).json_body(json!({
                    "took": 1,
                    "hits": {
                        "total": { "value": 1, "relation": "eq" },
                        "hits": [
                            {
                                "_index": "employees",
                                "_id": "doc-1",
                                "_score": 0.69,
                                "_source": { "Name": "Ada", "Department": "Eng" }
                            }
                        ]
                    }
                }));
            })
            .await;

        let hits = service_for(&server)
            .search_match("employees", "Department", "Eng")
            .await
            .expect("search");

        mock.assert_async().await;
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0]["_id"], "doc-1");
        assert_eq!(hits[0]["_source"]["Name"], "Ada");
    }

    #[tokio::test]
    async fn count_reads_count_field() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/employees/_count");
                then.status(200).json_body(json!({
                    "count": 42,
                    "_shards": { "total": 1, "successful": 1, "skipped": 0, "failed": 0 }
                }));
            })
            .await;

        let count = service_for(&server)
            .count("employees")
            .await
            .expect("count");
        assert_eq!(count, 42);
    }

    #[tokio::test]
    async fn delete_missing_document_is_an_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(DELETE).path("/employees/_doc/missing");
                then.status(404).json_body(json!({
                    "_index": "employees",
                    "_id": "missing",
                    "result": "not_found"
                }));
            })
            .await;

        let err = service_for(&server)
            .delete_document("employees", "missing")
            .await
            .expect_err("missing document");
        match err {
            ElasticError::UnexpectedStatus { status, body } => {
                assert_eq!(status, StatusCode::NOT_FOUND);
                assert!(body.contains("not_found"));
            }
            other => panic!("expected status error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn terms_aggregation_targets_keyword_subfield() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/employees/_search").json_body(json!({
                    "size": 0,
                    "aggs": {
                        "department_count": {
                            "terms": { "field": "Department.keyword" }
                        }
                    }
                }));
                then.status(200).json_body(json!({
                    "hits": { "hits": [] },
                    "aggregations": {
                        "department_count": {
                            "doc_count_error_upper_bound": 0,
                            "sum_other_doc_count": 0,
                            "buckets": [
                                { "key": "Eng", "doc_count": 3 },
                                { "key": "Sales", "doc_count": 2 }
                            ]
                        }
                    }
                }));
            })
            .await;

        let buckets = service_for(&server)
            .terms_aggregation("employees", "Department")
            .await
            .expect("aggregation");

        mock.assert_async().await;
        assert_eq!(
            buckets,
            vec![
                TermsBucket {
                    key: json!("Eng"),
                    doc_count: 3
                },
                TermsBucket {
                    key: json!("Sales"),
                    doc_count: 2
                },
            ]
        );
    }

    #[tokio::test]
    async fn api_key_is_sent_as_authorization_header() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/").header("authorization", "ApiKey secret");
                then.status(200).json_body(json!({ "tagline": "You Know, for Search" }));
            })
            .await;

        let config = Config {
            elasticsearch_url: server.base_url(),
            elasticsearch_api_key: Some("secret".into()),
            ..Config::default()
        };
        ElasticService::new(&config)
            .expect("client")
            .ping()
            .await
            .expect("ping");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn unexpected_success_shape_is_a_decode_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/employees/_count");
                then.status(200).json_body(json!({ "unexpected": true }));
            })
            .await;

        let err = service_for(&server)
            .count("employees")
            .await
            .expect_err("decode failure");
        assert!(matches!(err, ElasticError::Decode(_)));
    }

    #[tokio::test]
    async fn unreachable_engine_is_an_http_error() {
        let config = Config {
            elasticsearch_url: "http://127.0.0.1:1".into(),
            ..Config::default()
        };
        let err = ElasticService::new(&config)
            .expect("client")
            .count("employees")
            .await
            .expect_err("connection refused");
        assert!(matches!(err, ElasticError::Http(_)));
    }
}
