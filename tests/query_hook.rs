//! Query observer wired around async calls.

use std::borrow::Cow;
use std::time::Duration;

use io_sentry::observability::metrics::{
    QUERY_DURATION_SECONDS, QUERY_ERRORS_TOTAL, QUERY_EXECUTE_TOTAL, SLOW_QUERY_DETAILS,
};
use io_sentry::query::{CallerLocation, ErrorType, QueryCall};

mod common;

#[derive(Debug, PartialEq)]
enum RepoError {
    Deadlock,
    NotFound(u64),
}

impl ErrorType for RepoError {
    fn error_type(&self) -> Cow<'static, str> {
        match self {
            RepoError::Deadlock => "Deadlock".into(),
            RepoError::NotFound(_) => "NotFound".into(),
        }
    }
}

#[tokio::test]
async fn test_successful_call_is_timed_and_counted() {
    let (observer, sink) = common::observer(None);

    let rows: Result<Vec<u32>, RepoError> = observer
        .instrument(QueryCall::new("SELECT id FROM orders"), || async { Ok(vec![1, 2, 3]) })
        .await;

    assert_eq!(rows, Ok(vec![1, 2, 3]));
    assert_eq!(sink.observations(QUERY_DURATION_SECONDS, &[("operation", "SELECT")]).len(), 1);
    assert_eq!(sink.counter(QUERY_EXECUTE_TOTAL, &[("operation", "SELECT")]), 1);
    assert_eq!(sink.counter_total(QUERY_ERRORS_TOTAL), 0);
    assert_eq!(sink.observation_count(SLOW_QUERY_DETAILS), 0);
}

#[tokio::test]
async fn test_failed_call_fires_error_hook_only() {
    let (observer, sink) = common::observer(None);

    let out: Result<(), RepoError> = observer
        .instrument(
            QueryCall::new("update orders set state = 'paid' where id = $1").with_parameters(&[9]),
            || async { Err(RepoError::NotFound(9)) },
        )
        .await;

    assert_eq!(out, Err(RepoError::NotFound(9)));
    assert_eq!(
        sink.counter(QUERY_ERRORS_TOTAL, &[("operation", "UPDATE"), ("error_type", "NotFound")]),
        1
    );
    assert_eq!(sink.counter_total(QUERY_ERRORS_TOTAL), 1);
    assert_eq!(sink.counter_total(QUERY_EXECUTE_TOTAL), 0);
    assert_eq!(sink.observation_count(QUERY_DURATION_SECONDS), 0);
}

#[tokio::test]
async fn test_cancelled_call_is_finalized_as_error() {
    let (observer, sink) = common::observer(None);

    let call = observer.instrument(QueryCall::new("SELECT pg_sleep(30)"), || async {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok::<_, RepoError>(())
    });
    assert!(tokio::time::timeout(Duration::from_millis(20), call).await.is_err());

    assert_eq!(
        sink.counter(QUERY_ERRORS_TOTAL, &[("operation", "SELECT"), ("error_type", "Cancelled")]),
        1
    );
    assert_eq!(sink.counter_total(QUERY_EXECUTE_TOTAL), 0);
}

#[tokio::test]
async fn test_panicking_call_counts_one_error() {
    let (observer, sink) = common::observer(None);

    let task_observer = observer.clone();
    let joined = tokio::spawn(async move {
        task_observer
            .instrument(QueryCall::new("SELECT * FROM orders"), || async {
                let connection_poisoned = true;
                if connection_poisoned {
                    panic!("connection poisoned");
                }
                Ok::<_, RepoError>(())
            })
            .await
    })
    .await;

    assert!(joined.unwrap_err().is_panic());
    assert_eq!(
        sink.counter(QUERY_ERRORS_TOTAL, &[("operation", "SELECT"), ("error_type", "Panicked")]),
        1
    );
    assert_eq!(sink.counter_total(QUERY_ERRORS_TOTAL), 1);
    assert_eq!(sink.counter_total(QUERY_EXECUTE_TOTAL), 0);
    assert_eq!(sink.observation_count(QUERY_DURATION_SECONDS), 0);
}

#[tokio::test]
async fn test_slow_call_emits_sample_with_caller() {
    let (observer, sink) = common::observer(Some("query_hook"));

    let out: Result<u8, RepoError> = observer
        .instrument(
            QueryCall::new("SELECT * FROM ledger")
                .with_parameters(&("2024-01-01", 500))
                .with_caller(CallerLocation::here()),
            || async {
                tokio::time::sleep(Duration::from_millis(1100)).await;
                Ok(1)
            },
        )
        .await;
    assert_eq!(out, Ok(1));

    let durations = sink.observations(QUERY_DURATION_SECONDS, &[("operation", "SELECT")]);
    assert_eq!(durations.len(), 1);
    assert!(durations[0] > 1.0);

    assert_eq!(sink.observation_count(SLOW_QUERY_DETAILS), 1);
    let series = sink.histogram_series(SLOW_QUERY_DETAILS);
    let label = |k: &str| {
        series[0]
            .iter()
            .find(|(key, _)| key == k)
            .map(|(_, v)| v.clone())
            .unwrap()
    };
    assert_eq!(label("query_text"), "SELECT * FROM ledger");
    assert_eq!(label("parameters"), "(\"2024-01-01\", 500)");
    assert!(label("duration").ends_with('s'));
    assert!(label("file_name").contains("query_hook"));
    assert_ne!(label("line_number"), "unknown");
}

#[tokio::test]
async fn test_slow_call_without_matching_caller_is_unknown() {
    let (observer, sink) = common::observer(Some("helpers/query_helpers"));

    let _: Result<(), RepoError> = observer
        .instrument(
            QueryCall::new("DELETE FROM audit").with_caller(CallerLocation::here()),
            || async {
                tokio::time::sleep(Duration::from_millis(1050)).await;
                Ok(())
            },
        )
        .await;

    let series = sink.histogram_series(SLOW_QUERY_DETAILS);
    assert_eq!(series.len(), 1);
    assert!(series[0].contains(&("file_name".to_string(), "unknown".to_string())));
    assert!(series[0].contains(&("line_number".to_string(), "unknown".to_string())));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_calls_each_finalize_once() {
    let (observer, sink) = common::observer(None);

    let mut tasks = Vec::new();
    for i in 0..50u64 {
        let observer = observer.clone();
        tasks.push(tokio::spawn(async move {
            observer
                .instrument(QueryCall::new("select 1"), || async move {
                    if i % 5 == 0 {
                        Err(RepoError::Deadlock)
                    } else {
                        Ok(i)
                    }
                })
                .await
        }));
    }
    for t in tasks {
        let _ = t.await.unwrap();
    }

    assert_eq!(sink.counter(QUERY_EXECUTE_TOTAL, &[("operation", "SELECT")]), 40);
    assert_eq!(
        sink.counter(QUERY_ERRORS_TOTAL, &[("operation", "SELECT"), ("error_type", "Deadlock")]),
        10
    );
}
