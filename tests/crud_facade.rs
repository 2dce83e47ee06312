//! Façade behaviour against in-memory collaborators: classification, access gating,
//! pre-images, caching and audit logging.

mod common;

use common::{caller, row, Harness, RecordingAudit, RecordingExecutor, ScriptedAccess};
use record_crud::domain::access::RoleService;
use record_crud::domain::model::FieldValue;
use record_crud::storage::LogKind;
use record_crud::{Crud, CrudOptions, CrudParams, DynamicModel, ErrorCode, Filter, Record, TaskType};
use serde_json::json;
use std::sync::Arc;

fn open_options() -> CrudOptions {
    CrudOptions {
        check_access: false,
        ..Default::default()
    }
}

fn params() -> CrudParams {
    CrudParams {
        table_name: "orders".into(),
        user_info: caller(),
        ..Default::default()
    }
}

fn record(pairs: &[(&str, &str)]) -> Record {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), FieldValue::from(*v)))
        .collect()
}

fn crud(h: &Harness, params: CrudParams, options: CrudOptions) -> Crud {
    Crud::new(h.deps.clone(), params, options).unwrap()
}

#[tokio::test]
async fn single_record_without_id_is_created() {
    let h = Harness::new(RecordingExecutor::default(), ScriptedAccess::member());
    let mut p = params();
    p.action_params = vec![record(&[("name", "desk")])];

    let res = crud(&h, p, open_options()).save_record().await.unwrap();
    assert_eq!(res.records_count, 1);
    assert_eq!(res.task_type, TaskType::Create);
    assert_eq!(res.record_ids, vec!["new-1".to_string()]);

    let sql = h.executor.sql();
    assert_eq!(sql.len(), 1);
    assert!(sql[0].starts_with("INSERT INTO orders(name, created_by, created_at) VALUES($1, $2, $3)"));
}

#[tokio::test]
async fn single_record_with_id_updates_that_record() {
    let h = Harness::new(RecordingExecutor::returning(&["X"]), ScriptedAccess::member());
    let mut p = params();
    p.action_params = vec![record(&[("id", "X"), ("name", "desk")])];

    let res = crud(&h, p, open_options()).save_record().await.unwrap();
    assert_eq!(res.records_count, 1);
    assert_eq!(res.record_ids, vec!["X".to_string()]);
    assert_eq!(res.task_type, TaskType::Update);

    let sql = h.executor.sql();
    assert_eq!(
        sql,
        vec!["UPDATE orders SET name=$1, updated_by=$2, updated_at=$3 WHERE id=$4 RETURNING id".to_string()]
    );
}

#[tokio::test]
async fn delete_without_selector_is_refused_before_any_sql() {
    let h = Harness::new(RecordingExecutor::default(), ScriptedAccess::admin());
    let err = crud(&h, params(), CrudOptions::default()).delete_record().await.unwrap_err();
    assert_eq!(err.code, ErrorCode::RemoveError);
    assert!(h.executor.sql().is_empty());
}

#[tokio::test]
async fn filter_matching_nothing_is_not_found() {
    let h = Harness::new(RecordingExecutor::default(), ScriptedAccess::member());
    let mut p = params();
    p.query_params.insert("status".into(), FieldValue::from("archived"));

    let err = crud(&h, p, open_options()).get_record().await.unwrap_err();
    assert_eq!(err.code, ErrorCode::NotFound);
    let sql = h.executor.sql();
    assert_eq!(sql[0], "SELECT COUNT(*) AS count FROM orders WHERE status=$1");
    assert_eq!(sql[1], "SELECT * FROM orders WHERE status=$1 LIMIT 10000");
}

#[tokio::test]
async fn save_rejects_mixed_and_empty_batches() {
    let h = Harness::new(RecordingExecutor::default(), ScriptedAccess::admin());
    let mut p = params();
    p.action_params = vec![record(&[("id", "X"), ("name", "a")]), record(&[("name", "b")])];
    let err = crud(&h, p, open_options()).save_record().await.unwrap_err();
    assert_eq!(err.code, ErrorCode::SaveError);

    let err = crud(&h, params(), open_options()).save_record().await.unwrap_err();
    assert_eq!(err.code, ErrorCode::SaveError);
    assert!(h.executor.sql().is_empty());
}

#[tokio::test]
async fn batch_of_existing_records_updates_in_one_call() {
    let h = Harness::new(RecordingExecutor::returning(&["a", "b"]), ScriptedAccess::member());
    let mut p = params();
    p.action_params = vec![record(&[("id", "a"), ("qty", "1")]), record(&[("id", "b"), ("qty", "2")])];

    let res = crud(&h, p, open_options()).save_record().await.unwrap();
    assert_eq!(res.records_count, 2);
    let sql = h.executor.sql();
    assert_eq!(sql.len(), 2);
    assert!(sql.iter().all(|s| s.starts_with("UPDATE orders SET qty=$1")));
}

#[tokio::test]
async fn denied_update_never_reaches_the_database() {
    let h = Harness::new(RecordingExecutor::returning(&["X"]), ScriptedAccess::member());
    let mut p = params();
    p.action_params = vec![record(&[("id", "X"), ("name", "desk")])];

    let err = crud(&h, p, CrudOptions::default()).save_record().await.unwrap_err();
    assert_eq!(err.code, ErrorCode::UnAuthorized);
    assert_eq!(err.value.unwrap()["ownerPermitted"], json!(false));
    assert!(h.executor.sql().is_empty());
}

#[tokio::test]
async fn owner_of_every_target_may_update() {
    let mut access = ScriptedAccess::member();
    access.owned = 2;
    let h = Harness::new(RecordingExecutor::returning(&["a", "b"]), access);
    let mut p = params();
    p.action_params = vec![record(&[("name", "desk")])];
    p.record_ids = vec!["a".into(), "b".into()];

    let res = crud(&h, p, CrudOptions::default()).save_record().await.unwrap();
    assert_eq!(res.record_ids, vec!["a".to_string(), "b".to_string()]);
    assert_eq!(
        h.executor.sql(),
        vec!["UPDATE orders SET name=$1, updated_by=$2, updated_at=$3 WHERE id IN('a', 'b') RETURNING id".to_string()]
    );
}

#[tokio::test]
async fn table_grant_permits_create() {
    let mut access = ScriptedAccess::member();
    access.rows = vec![RoleService {
        role_id: "r1".into(),
        service_id: "svc-orders".into(),
        service_category: "table".into(),
        can_create: true,
        ..Default::default()
    }];
    let h = Harness::new(RecordingExecutor::default(), access);
    let mut p = params();
    p.action_params = vec![record(&[("name", "desk")]), record(&[("name", "lamp")])];

    let res = crud(&h, p, CrudOptions::default()).save_record().await.unwrap();
    assert_eq!(res.records_count, 2);
}

#[tokio::test]
async fn delete_needs_an_existing_pre_image() {
    let h = Harness::new(RecordingExecutor::default(), ScriptedAccess::admin());
    let mut p = params();
    p.record_ids = vec!["X".into()];

    let err = crud(&h, p, open_options()).delete_record().await.unwrap_err();
    assert_eq!(err.code, ErrorCode::NotFound);
    assert!(h.executor.sql().iter().all(|s| !s.starts_with("DELETE")));
}

#[tokio::test]
async fn delete_by_ids_logs_the_pre_image() {
    let rows = vec![row(json!({"id": "a", "name": "desk"})), row(json!({"id": "b", "name": "lamp"}))];
    let h = Harness::new(RecordingExecutor::with_rows(rows), ScriptedAccess::admin());
    let mut p = params();
    p.record_ids = vec!["a".into(), "b".into()];
    let options = CrudOptions {
        log_delete: true,
        ..Default::default()
    };

    let res = crud(&h, p, options).delete_record().await.unwrap();
    assert_eq!(res.records_count, 2);
    assert_eq!(res.task_type, TaskType::Delete);
    assert!(res.log_res.unwrap().ok);
    assert_eq!(h.executor.sql().last().unwrap(), "DELETE FROM orders WHERE id IN('a', 'b')");

    let entries = h.audit.entries.lock().unwrap();
    let (kind, user, entry) = &entries[0];
    assert_eq!(*kind, LogKind::Delete);
    assert_eq!(user, "u1");
    let logged = entry.log_records.as_ref().unwrap();
    assert_eq!(logged["recordIds"], json!(["a", "b"]));
    assert_eq!(logged["logRecords"][1]["name"], json!("lamp"));
}

#[tokio::test]
async fn delete_by_filter_checks_the_matching_ids() {
    let rows = vec![row(json!({"id": "a", "created_by": "u1"}))];
    let mut access = ScriptedAccess::member();
    access.owned = 1;
    let h = Harness::new(RecordingExecutor::with_rows(rows), access);
    let mut p = params();
    p.query_params.insert("status".into(), FieldValue::from("void"));

    let res = crud(&h, p, CrudOptions::default()).delete_record().await.unwrap();
    assert_eq!(res.record_ids, vec!["a".to_string()]);
    let mut expected = Filter::new();
    expected.insert("status".into(), FieldValue::from("void"));
    assert_eq!(res.query_param, expected);
    assert_eq!(h.executor.sql().last().unwrap(), "DELETE FROM orders WHERE status=$1");
}

#[tokio::test]
async fn audit_failure_does_not_fail_the_write() {
    let audit = RecordingAudit {
        fail: true,
        ..Default::default()
    };
    let h = Harness::with_audit(RecordingExecutor::default(), ScriptedAccess::member(), audit);
    let mut p = params();
    p.action_params = vec![record(&[("name", "desk")])];
    let options = CrudOptions {
        log_crud: true,
        ..open_options()
    };

    let res = crud(&h, p, options).save_record().await.unwrap();
    let log = res.log_res.unwrap();
    assert!(!log.ok);
    assert!(log.message.contains("audit table unavailable"));
}

#[tokio::test]
async fn get_without_selector_falls_back_by_role() {
    let rows = vec![row(json!({"id": "a", "created_by": "u1"}))];

    let h = Harness::new(RecordingExecutor::with_rows(rows.clone()), ScriptedAccess::admin());
    let res = crud(&h, params(), CrudOptions::default()).get_record().await.unwrap();
    assert_eq!(res.stats.total_records_count, 1);
    assert_eq!(h.executor.sql().last().unwrap(), "SELECT * FROM orders LIMIT 10000");

    let h = Harness::new(RecordingExecutor::with_rows(rows), ScriptedAccess::member());
    let res = crud(&h, params(), CrudOptions::default()).get_record().await.unwrap();
    assert_eq!(res.records[0]["createdBy"], json!("u1"));
    assert_eq!(res.stats.query_param["createdBy"], FieldValue::from("u1"));
    assert_eq!(
        h.executor.sql().last().unwrap(),
        "SELECT * FROM orders WHERE created_by=$1 LIMIT 10000"
    );

    let mut inactive = ScriptedAccess::member();
    inactive.status = None;
    let h = Harness::new(RecordingExecutor::default(), inactive);
    let err = crud(&h, params(), CrudOptions::default()).get_record().await.unwrap_err();
    assert_eq!(err.code, ErrorCode::UnAuthorized);
}

#[tokio::test]
async fn reads_are_served_from_cache_until_a_write() {
    let rows = vec![row(json!({"id": "a", "total_amount": 12}))];
    let h = Harness::new(RecordingExecutor::with_rows(rows), ScriptedAccess::member());
    let options = CrudOptions {
        cache_result: true,
        ..open_options()
    };
    let mut p = params();
    p.record_ids = vec!["a".into()];
    p.sort_params.insert("createdAt".into(), -1);
    p.limit = 20;

    let first = crud(&h, p.clone(), options.clone()).get_record().await.unwrap();
    assert_eq!(first.records[0]["totalAmount"], json!(12));
    assert_eq!(
        h.executor.sql()[1],
        "SELECT * FROM orders WHERE id=$1 ORDER BY created_at DESC LIMIT 20"
    );
    let executed = h.executor.sql().len();

    let second = crud(&h, p.clone(), options.clone()).get_record().await.unwrap();
    assert_eq!(second, first);
    assert_eq!(h.executor.sql().len(), executed);

    let mut write = params();
    write.action_params = vec![record(&[("name", "desk")])];
    crud(&h, write, options.clone()).save_record().await.unwrap();

    crud(&h, p, options).get_record().await.unwrap();
    assert!(h.executor.sql().len() > executed + 1);
}

#[tokio::test]
async fn cached_table_read_is_not_served_to_the_owner_fallback() {
    let rows = vec![
        row(json!({"id": "a", "created_by": "someone-else"})),
        row(json!({"id": "b", "created_by": "u1"})),
    ];
    let h = Harness::new(RecordingExecutor::with_rows(rows), ScriptedAccess::admin());
    let options = CrudOptions {
        cache_result: true,
        ..Default::default()
    };

    let everything = crud(&h, params(), options.clone()).get_record().await.unwrap();
    assert!(everything.stats.query_param.is_empty());
    let executed = h.executor.sql().len();

    let member = Crud::new(h.deps_for(ScriptedAccess::member()), params(), options).unwrap();
    let own = member.get_record().await.unwrap();
    assert_eq!(own.stats.query_param["createdBy"], FieldValue::from("u1"));
    let sql = h.executor.sql();
    assert!(sql.len() > executed);
    assert_eq!(sql.last().unwrap(), "SELECT * FROM orders WHERE created_by=$1 LIMIT 10000");
}

#[tokio::test]
async fn owner_of_every_target_may_read_and_delete() {
    let rows = vec![row(json!({"id": "a"})), row(json!({"id": "b"}))];
    let mut access = ScriptedAccess::member();
    access.owned = 2;
    let h = Harness::new(RecordingExecutor::with_rows(rows), access);
    let mut p = params();
    p.record_ids = vec!["a".into(), "b".into()];

    let read = crud(&h, p.clone(), CrudOptions::default()).get_record().await.unwrap();
    assert_eq!(read.stats.record_ids, vec!["a".to_string(), "b".to_string()]);

    let removed = crud(&h, p, CrudOptions::default()).delete_record().await.unwrap();
    assert_eq!(removed.task_type, TaskType::Delete);
    assert_eq!(h.executor.sql().last().unwrap(), "DELETE FROM orders WHERE id IN('a', 'b')");
}

#[tokio::test]
async fn owning_some_targets_is_not_enough() {
    let mut access = ScriptedAccess::member();
    access.owned = 1;
    let h = Harness::new(RecordingExecutor::default(), access);
    let mut p = params();
    p.record_ids = vec!["a".into(), "b".into()];

    let err = crud(&h, p, CrudOptions::default()).get_record().await.unwrap_err();
    assert_eq!(err.code, ErrorCode::UnAuthorized);
    assert!(h.executor.sql().is_empty());
}

#[tokio::test]
async fn owned_rows_grant_table_wide_read_only() {
    let rows = vec![row(json!({"id": "a"}))];
    let mut access = ScriptedAccess::member();
    access.owned = 1;
    let h = Harness::new(RecordingExecutor::with_rows(rows), access);
    let c = crud(&h, params(), CrudOptions::default());

    let read = c.task_permission_by_id(TaskType::Read, &[]).await.unwrap();
    assert!(read.ok);
    assert!(read.owner_permitted);

    let err = c.delete_all().await.unwrap_err();
    assert_eq!(err.code, ErrorCode::UnAuthorized);
    assert_eq!(err.value.unwrap()["ownerPermitted"], json!(false));
    assert!(h.executor.sql().is_empty());
}

#[tokio::test]
async fn catalog_types_cast_text_values() {
    let h = Harness::new(RecordingExecutor::returning(&["X"]), ScriptedAccess::member());
    let model = DynamicModel::from_columns(
        "orders".into(),
        vec![
            ("id".into(), "uuid".into()),
            ("due_date".into(), "date".into()),
            ("owner_ref".into(), "text".into()),
            ("updated_by".into(), "text".into()),
            ("updated_at".into(), "timestamptz".into()),
        ],
    );
    let mut p = params();
    let id = "6900d9f9-2ceb-450f-9a9e-527eb66c962f";
    p.action_params = vec![record(&[("dueDate", "2024-05-01")])];
    p.record_ids = vec![id.into()];
    let options = CrudOptions {
        model_options: record_crud::app::ModelOptions {
            time_stamp: false,
            ..Default::default()
        },
        ..open_options()
    };

    crud(&h, p, options.clone())
        .with_model(Arc::new(model))
        .save_record()
        .await
        .unwrap();
    assert_eq!(
        h.executor.sql(),
        vec!["UPDATE orders SET due_date=$1::date, updated_by=$2 WHERE id=$3::uuid RETURNING id".to_string()]
    );

    let mut filtered = params();
    filtered.query_params.insert("ownerRef".into(), FieldValue::from(id));
    let h = Harness::new(RecordingExecutor::with_rows(vec![row(json!({"id": id}))]), ScriptedAccess::member());
    let model = DynamicModel::from_columns("orders".into(), vec![("owner_ref".into(), "text".into())]);
    crud(&h, filtered, options).with_model(Arc::new(model)).get_record().await.unwrap();
    assert_eq!(h.executor.sql()[0], "SELECT COUNT(*) AS count FROM orders WHERE owner_ref=$1");
}

#[tokio::test]
async fn lookup_reads_are_not_gated() {
    let rows = vec![row(json!({"id": "nl", "name": "Netherlands"}))];
    let mut nobody = ScriptedAccess::member();
    nobody.status = None;
    let h = Harness::new(RecordingExecutor::with_rows(rows), nobody);
    let mut p = params();
    p.table_name = "countries".into();
    p.project_params = vec!["id".into(), "name".into()];

    let res = crud(&h, p, CrudOptions::default()).get_records().await.unwrap();
    assert_eq!(res.records.len(), 1);
    assert_eq!(h.executor.sql().last().unwrap(), "SELECT id, name FROM countries LIMIT 10000");
}

#[tokio::test]
async fn records_count_reports_total_and_owned() {
    let rows = vec![row(json!({"id": "a"})), row(json!({"id": "b"}))];
    let h = Harness::new(RecordingExecutor::with_rows(rows), ScriptedAccess::member());
    let counts = crud(&h, params(), open_options()).records_count().await.unwrap();
    assert_eq!(counts.total_records_count, 2);
    assert_eq!(counts.owner_records_count, 2);
    assert_eq!(
        h.executor.sql(),
        vec![
            "SELECT COUNT(*) AS count FROM orders".to_string(),
            "SELECT COUNT(*) AS count FROM orders WHERE created_by=$1".to_string(),
        ]
    );
}

#[tokio::test]
async fn delete_all_is_explicit() {
    let rows = vec![row(json!({"id": "a"}))];
    let h = Harness::new(RecordingExecutor::with_rows(rows), ScriptedAccess::admin());
    let options = CrudOptions {
        log_crud: true,
        ..Default::default()
    };
    let res = crud(&h, params(), options).delete_all().await.unwrap();
    assert_eq!(res.records_count, 1);
    assert_eq!(h.executor.sql(), vec!["DELETE FROM orders".to_string()]);
    let entries = h.audit.entries.lock().unwrap();
    assert_eq!(entries[0].2.log_records, Some(json!({"query": "all"})));
}

#[tokio::test]
async fn missing_table_name_is_a_params_error() {
    let h = Harness::new(RecordingExecutor::default(), ScriptedAccess::admin());
    let mut p = params();
    p.table_name = " ".into();
    let err = Crud::new(h.deps.clone(), p, CrudOptions::default()).err().unwrap();
    assert_eq!(err.code, ErrorCode::ParamsError);
}
