use std::{env, time::Duration};

use employee_search::{
    config::Config,
    elastic::ElasticService,
    processing::{EmployeeService, Record},
};
use uuid::Uuid;

fn live_config() -> Config {
    Config {
        elasticsearch_url: env::var("ELASTICSEARCH_URL")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| "http://127.0.0.1:9200".into()),
        ..Config::default()
    }
}

#[tokio::test]
#[ignore = "Requires live Elasticsearch"]
async fn live_create_index_count_roundtrip() {
    let config = live_config();
    let elastic = ElasticService::new(&config).expect("client");
    let index = format!("employee-search-live-{}", Uuid::new_v4());

    elastic.create_index(&index).await.expect("create index");
    let record: Record = [("Name", "Ada"), ("Department", "Eng")]
        .into_iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect();
    let id = elastic
        .index_document(&index, &record)
        .await
        .expect("index document");
    assert!(!id.is_empty());

    // New documents become visible to _count after the next refresh.
    let mut count = 0;
    for _ in 0..20 {
        count = elastic.count(&index).await.expect("count");
        if count == 1 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(250)).await;
    }
    assert_eq!(count, 1);

    elastic
        .delete_document(&index, &id)
        .await
        .expect("delete document");
    assert!(elastic.delete_document(&index, &id).await.is_err());
}

#[tokio::test]
#[ignore = "Requires live Elasticsearch"]
async fn live_engine_answers_ping() {
    let service = EmployeeService::new(&live_config()).expect("service");
    service.ping().await.expect("Elasticsearch should be reachable");
}
