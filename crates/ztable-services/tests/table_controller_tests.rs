//! Integration tests for TableController
//!
//! Drives a full table instance (reactor, debouncer, persistence writer) against a mock
//! transport with a paused clock.

mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use common::{MockTransport, row_ids, users};
use futures::FutureExt;
use pretty_assertions::assert_eq;
use serde_json::json;
use ztable_core::{ColumnDef, FieldType, Filter, FilterOperator};
use ztable_persistence::{KeyValueStorage, LocationBar, MemoryLocation, MemoryStorage, parse_query, query_value};
use ztable_services::{
    CommitOutcome, CustomFacetFetcher, FacetStatus, FetchOutcome, ServiceError, TableController,
    TableOptions, TableTransport,
};
use ztable_state::CellRef;

fn columns() -> Vec<ColumnDef> {
    vec![
        ColumnDef::new("profile.firstName", FieldType::Text),
        ColumnDef::new("work.department", FieldType::Text).editable(),
        ColumnDef::new("work.title", FieldType::Text).editable(),
        ColumnDef::new("finance.salary", FieldType::Number).editable(),
        ColumnDef::new("isActive", FieldType::Boolean).editable(),
    ]
}

fn remote(mock: &Arc<MockTransport>) -> TableOptions {
    TableOptions::remote(mock.clone()).with_columns(columns())
}

// ============ Fetch Tests ============

#[tokio::test(start_paused = true)]
async fn initial_fetch_loads_first_page() {
    let mock = Arc::new(MockTransport::new(users(23)));
    let table = TableController::new(remote(&mock));
    table.settled().await;

    let state = table.state();
    assert_eq!(state.total_rows, 23);
    assert_eq!(state.total_pages, 3);
    assert_eq!(row_ids(&state), (1..=10).collect::<Vec<_>>());
    assert!(!state.loading);
    assert_eq!(state.error, None);
    assert_eq!(mock.requested_pages(), vec![1]);
}

#[tokio::test(start_paused = true)]
async fn page_beyond_filtered_range_is_clamped() {
    let mock = Arc::new(MockTransport::new(users(23)));
    let table = TableController::new(remote(&mock));
    table.settled().await;
    assert_eq!(table.state().total_pages, 3);

    table
        .set_filters(vec![Filter::new("work.department", FilterOperator::Is, "Sales")])
        .expect("filter should be valid");
    table.settled().await;
    assert_eq!(table.state().total_rows, 12);
    assert_eq!(table.state().total_pages, 2);

    table.set_page(4);
    table.settled().await;

    let state = table.state();
    assert_eq!(state.current_page, 2);
    assert_eq!(row_ids(&state), vec![11, 12]);
    assert_eq!(mock.requested_pages(), vec![1, 1, 4, 2]);
}

#[tokio::test(start_paused = true)]
async fn search_burst_issues_one_request() {
    let mock = Arc::new(MockTransport::new(users(23)));
    let table = TableController::new(remote(&mock));
    table.settled().await;

    for tokens in [vec!["senior"], vec!["senior", "eng"], vec!["senior", "engineer"]] {
        table.set_search_tokens(tokens.into_iter().map(String::from).collect());
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    table.settled().await;

    assert_eq!(mock.requested_searches(), vec!["", "senior engineer"]);
    let state = table.state();
    assert_eq!(state.debounced_search_term, "senior engineer");
    assert_eq!(state.total_rows, 11);
}

#[tokio::test(start_paused = true)]
async fn slow_superseded_request_never_overwrites_newer_one() {
    let mock = Arc::new(
        MockTransport::new(users(23)).with_page_delay(2, Duration::from_millis(300)),
    );
    let table = TableController::new(remote(&mock));
    table.settled().await;

    table.set_page(2);
    tokio::time::sleep(Duration::from_millis(10)).await;
    table.set_page(3);
    table.settled().await;
    assert_eq!(row_ids(&table.state()), vec![21, 22, 23]);

    tokio::time::sleep(Duration::from_secs(1)).await;
    let state = table.state();
    assert_eq!(state.current_page, 3);
    assert_eq!(row_ids(&state), vec![21, 22, 23]);
    assert_eq!(state.error, None);
    assert_eq!(mock.requested_pages(), vec![1, 2, 3]);
}

#[tokio::test(start_paused = true)]
async fn transport_failure_keeps_previous_rows() {
    let mock = Arc::new(MockTransport::new(users(23)));
    let table = TableController::new(remote(&mock));
    table.settled().await;

    mock.set_failing(true);
    let err = table.refresh().await.expect_err("refresh should fail");
    assert!(matches!(err, ServiceError::Transport(_)));

    let state = table.state();
    assert_eq!(state.error.as_deref(), Some("API Error: 503"));
    assert!(!state.loading);
    assert_eq!(state.data.len(), 10);

    mock.set_failing(false);
    assert_eq!(table.refresh().await.unwrap(), FetchOutcome::Committed);
    assert_eq!(table.state().error, None);
}

#[tokio::test(start_paused = true)]
async fn missing_source_is_misconfiguration_until_reconfigured() {
    let table = TableController::new(TableOptions::default());
    table.settled().await;

    let state = table.state();
    assert!(state.error.as_deref().unwrap_or_default().starts_with("Misconfiguration"));
    assert!(matches!(table.refresh().await, Err(ServiceError::Misconfigured(_))));

    let mock = Arc::new(MockTransport::new(users(5)));
    assert_eq!(
        table.reconfigure(mock.clone()).await.unwrap(),
        FetchOutcome::Committed
    );
    let state = table.state();
    assert_eq!(state.error, None);
    assert_eq!(state.total_rows, 5);
}

#[tokio::test(start_paused = true)]
async fn static_data_is_evaluated_locally() {
    let table = TableController::new(TableOptions::static_data(users(23)).with_columns(columns()));
    table.settled().await;
    assert_eq!(table.state().data.len(), 23);
    assert_eq!(table.state().total_pages, 1);

    table.set_search_tokens(vec!["support".into()]);
    table.settled().await;
    assert_eq!(row_ids(&table.state()), (13..=23).collect::<Vec<_>>());

    table.toggle_sort("finance.salary");
    table.toggle_sort("finance.salary");
    table.settled().await;
    assert_eq!(row_ids(&table.state())[0], 23);

    assert_eq!(table.ensure_facets("work.department").await, FacetStatus::Loaded(2));
}

// ============ Edit Tests ============

#[tokio::test(start_paused = true)]
async fn unchanged_edit_makes_no_request() {
    let mock = Arc::new(MockTransport::new(users(23)));
    let table = TableController::new(remote(&mock));
    table.settled().await;

    let cell = CellRef::new("1", "finance.salary");
    table.start_edit(cell.clone()).unwrap();
    assert_eq!(table.state().editing_cell, Some(cell.clone()));

    let outcome = table.commit_edit(cell, json!("41000")).await.unwrap();
    assert_eq!(outcome, CommitOutcome::Unchanged);
    assert_eq!(mock.update_count(), 0);
    assert_eq!(table.state().editing_cell, None);
}

#[tokio::test(start_paused = true)]
async fn saved_edit_invalidates_field_facets() {
    let mock = Arc::new(MockTransport::new(users(23)));
    let table = TableController::new(remote(&mock));
    table.settled().await;

    assert_eq!(table.ensure_facets("work.department").await, FacetStatus::Loaded(2));
    assert_eq!(table.ensure_facets("work.department").await, FacetStatus::Cached);
    assert_eq!(mock.facet_count("work.department"), 1);

    let cell = CellRef::new("3", "work.department");
    table.start_edit(cell.clone()).unwrap();
    let outcome = table.commit_edit(cell, json!("Research")).await.unwrap();
    assert!(matches!(outcome, CommitOutcome::Committed(_)));

    let state = table.state();
    assert_eq!(state.data[2]["work"]["department"], "Research");
    assert_eq!(state.facet_cache.get("work.department"), Some(&None));
    assert_eq!(mock.update_log.lock()[0], ("3".to_string(), json!({"work.department": "Research"})));

    assert_eq!(table.ensure_facets("work.department").await, FacetStatus::Loaded(3));
    assert_eq!(table.ensure_facets("work.department").await, FacetStatus::Cached);
    assert_eq!(mock.facet_count("work.department"), 2);
}

#[tokio::test(start_paused = true)]
async fn edit_during_facet_lookup_forces_fresh_fetch() {
    let mock = Arc::new(MockTransport::new(users(23)));
    let lookups = Arc::new(AtomicUsize::new(0));
    let fetcher: CustomFacetFetcher = {
        let mock = mock.clone();
        let lookups = lookups.clone();
        Arc::new(move |field: String, _column: ColumnDef| {
            let mock = mock.clone();
            lookups.fetch_add(1, Ordering::SeqCst);
            async move {
                tokio::time::sleep(Duration::from_millis(100)).await;
                mock.fetch_facets(&field, None).await
            }
            .boxed()
        })
    };
    let table = TableController::new(remote(&mock).with_custom_facet_fetcher(fetcher));
    table.settled().await;

    let cell = CellRef::new("3", "work.department");
    let (status, committed) = tokio::join!(table.ensure_facets("work.department"), async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        table.start_edit(cell.clone())?;
        table.commit_edit(cell.clone(), json!("Research")).await
    });

    assert!(matches!(committed, Ok(CommitOutcome::Committed(_))));
    assert_eq!(status, FacetStatus::Invalidated);
    assert_eq!(table.state().facet_cache.get("work.department"), Some(&None));

    assert_eq!(table.ensure_facets("work.department").await, FacetStatus::Loaded(3));
    assert_eq!(lookups.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn rejected_edit_reverts_cell_only() {
    let mock = Arc::new(MockTransport::new(users(23)).with_update_failure());
    let table = TableController::new(remote(&mock));
    table.settled().await;

    let cell = CellRef::new("1", "work.department");
    table.start_edit(cell.clone()).unwrap();
    let err = table.commit_edit(cell, json!("Ops")).await.unwrap_err();

    assert!(matches!(err, ServiceError::UpdateRejected(_)));
    let state = table.state();
    assert_eq!(state.editing_cell, None);
    assert_eq!(state.error, None);
    assert_eq!(state.data[0]["work"]["department"], "Sales");
}

#[tokio::test(start_paused = true)]
async fn distinct_cells_save_concurrently() {
    let mock = Arc::new(
        MockTransport::new(users(23)).with_update_delay(Duration::from_millis(100)),
    );
    let table = TableController::new(remote(&mock));
    table.settled().await;

    let first = CellRef::new("1", "work.department");
    let second = CellRef::new("2", "work.title");
    table.start_edit(first.clone()).unwrap();

    let (a, b) = tokio::join!(table.commit_edit(first.clone(), json!("Ops")), async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(matches!(
            table.start_edit(first.clone()),
            Err(ServiceError::AlreadySaving(_))
        ));
        table.start_edit(second.clone())?;
        table.commit_edit(second.clone(), json!("Lead")).await
    });

    assert!(matches!(a, Ok(CommitOutcome::Committed(_))));
    assert!(matches!(b, Ok(CommitOutcome::Committed(_))));
    assert_eq!(mock.update_count(), 2);
    let state = table.state();
    assert_eq!(state.data[0]["work"]["department"], "Ops");
    assert_eq!(state.data[1]["work"]["title"], "Lead");
    assert_eq!(state.editing_cell, None);
}

// ============ Persistence Tests ============

#[tokio::test(start_paused = true)]
async fn hydrates_from_location_and_writes_back() {
    let mock = Arc::new(MockTransport::new(users(23)));
    let location = Arc::new(MemoryLocation::new("?page=2&search=senior&hide=work.title"));
    let table = TableController::new(remote(&mock).with_location(location.clone()));
    table.settled().await;

    let first = &mock.request_log()[0];
    assert_eq!(first.page, 2);
    assert_eq!(first.search, "senior");
    assert!(table.state().is_column_hidden("work.title"));

    table.toggle_sort("finance.salary");
    table.settled().await;
    tokio::time::sleep(Duration::from_millis(200)).await;

    let pairs = parse_query(&location.query());
    assert_eq!(query_value(&pairs, "sortBy"), Some("finance.salary"));
    assert_eq!(query_value(&pairs, "sortOrder"), Some("asc"));
    assert_eq!(query_value(&pairs, "page"), None);
    assert_eq!(query_value(&pairs, "search"), Some("senior"));
    assert_eq!(query_value(&pairs, "hide"), Some("work.title"));

    table.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn submitted_searches_are_remembered() {
    let mock = Arc::new(MockTransport::new(users(23)));
    let local: Arc<dyn KeyValueStorage> = Arc::new(MemoryStorage::new());
    let table = TableController::new(remote(&mock).with_local_storage(local.clone()));
    table.settled().await;

    table.submit_search("Sales");
    table.submit_search("  ");
    table.submit_search("sales ");
    table.submit_search("Support");

    assert_eq!(table.recent_searches(), vec!["Support", "sales"]);
    assert_eq!(table.state().search_tokens, vec!["Sales", "sales", "Support"]);
    assert!(local.get("dt_recent_searches").unwrap().is_some());
}

#[tokio::test(start_paused = true)]
async fn accordion_mode_keeps_one_row_open() {
    let mock = Arc::new(MockTransport::new(users(5)));
    let table = TableController::new(remote(&mock).with_accordion_mode(true));
    table.settled().await;

    table.toggle_row_expansion("1");
    table.toggle_row_expansion("2");

    let expanded: Vec<String> = table.state().expanded_rows.iter().cloned().collect();
    assert_eq!(expanded, vec!["2"]);
}
