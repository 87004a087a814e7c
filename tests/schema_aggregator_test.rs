//! Integration tests for schema introspection.
//!
//! The aggregator and the schema tool handler run against an in-memory
//! catalog that applies the table filter the way the catalog query does.

mod common;

use common::{CapturedLogs, StubCatalog};
use postgres_mcp_server::db::SchemaAggregator;
use postgres_mcp_server::error::{DbError, ErrorKind};
use postgres_mcp_server::models::{SchemaEnvelope, SchemaRow};
use postgres_mcp_server::tools::{SchemaInfoInput, SchemaToolHandler, to_tool_result};
use serde_json::json;
use std::future::pending;
use std::time::Duration;

fn shop_catalog() -> Vec<SchemaRow> {
    vec![
        SchemaRow::new("orders", "id", "bigint", "NO")
            .with_default("nextval('orders_id_seq'::regclass)")
            .with_constraint("PRIMARY KEY"),
        SchemaRow::new("orders", "customer_id", "integer", "NO").with_constraint("FOREIGN KEY"),
        SchemaRow::new("orders", "note", "text", "YES"),
        SchemaRow::new("customers", "id", "integer", "NO").with_constraint("PRIMARY KEY"),
        SchemaRow::new("customers", "email", "character varying", "NO")
            .with_constraint("UNIQUE"),
    ]
}

fn aggregator(catalog: StubCatalog) -> SchemaAggregator<StubCatalog> {
    SchemaAggregator::new(catalog, "public")
}

#[tokio::test]
async fn test_empty_schema_message() {
    let aggregator = aggregator(StubCatalog::new(vec![]));
    let envelope = aggregator.describe(None, pending()).await.unwrap();
    assert_eq!(
        serde_json::to_value(&envelope).unwrap(),
        json!({"message": "No tables found in the database."})
    );
}

#[tokio::test]
async fn test_unknown_table_message() {
    let aggregator = aggregator(StubCatalog::new(shop_catalog()));
    let envelope = aggregator.describe(Some("ghost"), pending()).await.unwrap();
    assert_eq!(
        envelope,
        SchemaEnvelope::Empty {
            message: "Table 'ghost' not found.".to_string()
        }
    );
}

#[tokio::test]
async fn test_tables_sorted_columns_in_position_order() {
    let aggregator = aggregator(StubCatalog::new(shop_catalog()));
    let envelope = aggregator.describe(None, pending()).await.unwrap();
    let value = serde_json::to_value(&envelope).unwrap();

    let tables = value["tables"].as_array().unwrap();
    assert_eq!(tables.len(), 2);
    assert_eq!(tables[0]["table_name"], "customers");
    assert_eq!(tables[1]["table_name"], "orders");

    let orders = &tables[1]["columns"];
    assert_eq!(
        orders[0],
        json!({
            "column_name": "id",
            "data_type": "bigint",
            "is_nullable": false,
            "default_value": "nextval('orders_id_seq'::regclass)",
            "constraint": "PRIMARY KEY"
        })
    );
    assert_eq!(orders[1]["column_name"], "customer_id");
    assert_eq!(
        orders[2],
        json!({"column_name": "note", "data_type": "text", "is_nullable": true})
    );
}

#[tokio::test]
async fn test_single_table_filter() {
    let aggregator = aggregator(StubCatalog::new(shop_catalog()));
    let envelope = aggregator.describe(Some("customers"), pending()).await.unwrap();

    assert_eq!(envelope.table_count(), 1);
    let value = serde_json::to_value(&envelope).unwrap();
    assert_eq!(value["tables"][0]["table_name"], "customers");
    assert_eq!(
        aggregator.source().requests(),
        [("public".to_string(), Some("customers".to_string()))]
    );
}

#[tokio::test]
async fn test_blank_filter_means_all_tables() {
    for filter in ["", "   "] {
        let aggregator = aggregator(StubCatalog::new(shop_catalog()));
        let envelope = aggregator.describe(Some(filter), pending()).await.unwrap();
        assert_eq!(envelope.table_count(), 2);
        assert_eq!(aggregator.source().requests(), [("public".to_string(), None)]);
    }
}

#[tokio::test]
async fn test_configured_schema_is_queried() {
    let aggregator = SchemaAggregator::new(StubCatalog::new(vec![]), "inventory");
    aggregator.describe(None, pending()).await.unwrap();
    assert_eq!(aggregator.source().requests(), [("inventory".to_string(), None)]);
}

#[tokio::test]
async fn test_stream_failure_fails_whole_call() {
    let aggregator = aggregator(StubCatalog::new(shop_catalog()).failing_after(2));
    let err = aggregator.describe(None, pending()).await.unwrap_err();
    assert!(matches!(err, DbError::Connection { .. }));
    assert_eq!(err.kind(), ErrorKind::Execution);
}

#[tokio::test]
async fn test_cancelled_describe() {
    let aggregator = aggregator(StubCatalog::new(shop_catalog()).hanging());
    let err = aggregator
        .describe(None, tokio::time::sleep(Duration::from_millis(20)))
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::Cancelled { .. }));
}

#[tokio::test]
async fn test_describe_times_out() {
    let aggregator = SchemaAggregator::with_timeout(
        StubCatalog::new(shop_catalog()).hanging(),
        "public",
        Duration::from_millis(20),
    );
    let err = aggregator.describe(None, pending()).await.unwrap_err();
    assert!(matches!(err, DbError::Timeout { .. }));
}

#[tokio::test]
async fn test_handler_success_result() {
    let handler = SchemaToolHandler::new(aggregator(StubCatalog::new(shop_catalog())));
    let input: SchemaInfoInput = serde_json::from_value(json!({"table": "orders"})).unwrap();

    let result = to_tool_result(handler.schema_info(input, pending()).await);
    assert_ne!(result.is_error, Some(true));
    let data = result.structured_content.unwrap();
    assert_eq!(data["tables"][0]["columns"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_handler_failure_result() {
    let handler = SchemaToolHandler::new(aggregator(
        StubCatalog::new(shop_catalog()).failing_after(0),
    ));

    let result = to_tool_result(handler.schema_info(SchemaInfoInput::default(), pending()).await);
    assert_eq!(result.is_error, Some(true));
    assert_eq!(result.structured_content.unwrap()["kind"], "execution");
}

#[tokio::test]
async fn test_handler_logs_one_completion_line() {
    let handler = SchemaToolHandler::new(aggregator(StubCatalog::new(shop_catalog())));

    let (logs, _guard) = CapturedLogs::install();
    handler
        .schema_info(SchemaInfoInput::default(), pending())
        .await
        .unwrap();

    let info = logs.info_lines();
    assert_eq!(info.len(), 1, "logs: {}", logs.text());
    assert!(info[0].contains("Schema described"));
    assert!(info[0].contains("tables=2"));
}
