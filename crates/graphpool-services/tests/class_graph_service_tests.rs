//! Class graph service tests against a recording mock driver

mod common;

use std::time::Duration;

use common::{Event, RecordingConnector, pool_with};
use graphpool_connection::PoolError;
use graphpool_core::{Params, Value};
use graphpool_services::{
    ClassGraphService, ClassKind, ClassNode, MethodCall, PropertyNode, ServiceError, WriteSummary,
};
use pretty_assertions::assert_eq;

fn order_service() -> ClassNode {
    ClassNode {
        name: "OrderService".into(),
        package: "com.shop.orders".into(),
        file_path: "src/main/java/com/shop/orders/OrderService.java".into(),
        kind: ClassKind::Class,
        properties: vec![
            PropertyNode {
                name: "repository".into(),
                type_name: "OrderRepository".into(),
            },
            PropertyNode {
                name: "clock".into(),
                type_name: "Clock".into(),
            },
        ],
        calls: vec![MethodCall {
            source_package: "com.shop.orders".into(),
            source_class: "OrderService".into(),
            source_method: "place".into(),
            target_package: "com.shop.data".into(),
            target_class: "OrderRepository".into(),
            target_method: "save".into(),
        }],
    }
}

fn bare_class(name: &str) -> ClassNode {
    ClassNode {
        name: name.into(),
        package: "com.shop".into(),
        file_path: format!("{}.java", name),
        kind: ClassKind::Interface,
        properties: Vec::new(),
        calls: Vec::new(),
    }
}

fn run_params(events: &[Event], index: usize) -> Params {
    let runs: Vec<_> = events
        .iter()
        .filter_map(|event| match event {
            Event::Run(_, params) => Some(params.clone()),
            _ => None,
        })
        .collect();
    runs[index].clone()
}

#[tokio::test]
async fn add_class_writes_class_properties_and_calls_in_one_session() {
    let connector = RecordingConnector::new();
    let log = connector.log.clone();
    let pool = pool_with(connector, 2).await;
    let service = ClassGraphService::new(pool.clone());

    service.add_class(&order_service()).await.unwrap();

    let events = log.events();
    assert_eq!(events.first(), Some(&Event::Begin("csadb01".into())));
    assert_eq!(events.last(), Some(&Event::Commit));
    assert_eq!(log.count(&Event::Rollback), 0);

    let queries = log.queries();
    assert_eq!(queries.len(), 4);
    assert!(queries[0].starts_with("MERGE (c:Class"));
    assert!(queries[1].contains("HAS_PROPERTY"));
    assert!(queries[2].contains("HAS_PROPERTY"));
    assert!(queries[3].contains("CALLS"));

    let class = run_params(&events, 0);
    assert_eq!(class.get("name"), Some(&Value::from("OrderService")));
    assert_eq!(class.get("type"), Some(&Value::from("class")));

    let property = run_params(&events, 2);
    assert_eq!(property.get("class_name"), Some(&Value::from("OrderService")));
    assert_eq!(property.get("prop_name"), Some(&Value::from("clock")));
    assert_eq!(property.get("prop_type"), Some(&Value::from("Clock")));

    let call = run_params(&events, 3);
    assert_eq!(call.get("source_method"), Some(&Value::from("place")));
    assert_eq!(call.get("target_class"), Some(&Value::from("OrderRepository")));
    assert_eq!(call.get("target_method"), Some(&Value::from("save")));
    assert_eq!(call.len(), 8);

    assert_eq!(pool.stats().available(), 2);
}

#[tokio::test]
async fn failed_statement_rolls_back_and_returns_the_connection() {
    let connector = RecordingConnector::failing_on("CALLS");
    let log = connector.log.clone();
    let pool = pool_with(connector, 1).await;
    let service = ClassGraphService::new(pool.clone());

    let err = service.add_class(&order_service()).await.unwrap_err();

    assert!(matches!(err, ServiceError::Graph(_)));
    assert!(!err.is_retryable());
    assert_eq!(log.events().last(), Some(&Event::Rollback));
    assert_eq!(log.count(&Event::Commit), 0);

    let stats = pool.stats();
    assert_eq!(stats.available(), 1);
    assert_eq!(stats.held(), 0);
}

#[tokio::test]
async fn unnamed_class_is_rejected_without_touching_the_pool() {
    let connector = RecordingConnector::new();
    let log = connector.log.clone();
    let pool = pool_with(connector, 1).await;
    let service = ClassGraphService::new(pool);

    let err = service.add_class(&bare_class("  ")).await.unwrap_err();

    assert!(matches!(err, ServiceError::InvalidEntity(_)));
    assert!(log.events().is_empty());
}

#[tokio::test]
async fn add_classes_commits_every_class_and_sums_the_batch() {
    let connector = RecordingConnector::new();
    let log = connector.log.clone();
    let pool = pool_with(connector, 3).await;
    let service = ClassGraphService::new(pool.clone());

    let mut classes: Vec<_> = (0..7).map(|i| bare_class(&format!("Port{}", i))).collect();
    classes.push(order_service());

    let summary = service.add_classes(&classes).await.unwrap();

    assert_eq!(
        summary,
        WriteSummary {
            classes: 8,
            properties: 2,
            calls: 1,
        }
    );
    assert_eq!(log.count(&Event::Commit), 8);
    assert_eq!(log.count(&Event::Begin("csadb01".into())), 8);
    assert_eq!(log.queries().len(), 8 + 2 + 1);
    assert_eq!(pool.stats().available(), 3);
}

#[tokio::test]
async fn add_classes_stops_on_the_first_failure() {
    let connector = RecordingConnector::failing_on("HAS_PROPERTY");
    let pool = pool_with(connector, 2).await;
    let service = ClassGraphService::new(pool.clone());

    let classes = vec![bare_class("Cart"), order_service(), bare_class("Basket")];
    let result = service.add_classes(&classes).await;

    assert!(matches!(result, Err(ServiceError::Graph(_))));
    assert_eq!(pool.stats().held(), 0);
}

#[tokio::test]
async fn clear_graph_detaches_and_deletes_everything() {
    let connector = RecordingConnector::new();
    let log = connector.log.clone();
    let pool = pool_with(connector, 1).await;
    let service = ClassGraphService::new(pool);

    service.clear_graph().await.unwrap();

    assert_eq!(
        log.events(),
        vec![
            Event::Begin("csadb01".into()),
            Event::Run("MATCH (n) DETACH DELETE n".into(), Params::new()),
            Event::Commit,
        ]
    );
}

#[tokio::test]
async fn exhausted_pool_surfaces_a_retryable_error() {
    let pool = pool_with(RecordingConnector::new(), 1).await;
    let held = pool.acquire(Duration::from_secs(1)).await.unwrap();
    let service = ClassGraphService::new(pool.clone()).with_acquire_timeout(Duration::ZERO);

    let err = service.add_class(&bare_class("Cart")).await.unwrap_err();

    assert!(matches!(err, ServiceError::Pool(PoolError::PoolExhausted { .. })));
    assert!(err.is_retryable());

    pool.release(held).unwrap();
    service.add_class(&bare_class("Cart")).await.unwrap();
}

#[tokio::test]
async fn writes_after_shutdown_fail_with_pool_closed() {
    let pool = pool_with(RecordingConnector::new(), 1).await;
    let service = ClassGraphService::new(pool.clone());

    pool.shutdown().await;
    let err = service.add_class(&bare_class("Cart")).await.unwrap_err();

    assert!(matches!(err, ServiceError::Pool(PoolError::PoolClosed)));
}
