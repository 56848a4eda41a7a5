use formloom_application::{CellWrite, FormRepository};
use formloom_core::{CellId, ColumnId, FormId, RowId};
use formloom_domain::FormSnapshot;
use serde_json::json;
use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;

use super::{ConditionRow, LayoutRow, PostgresFormRepository, condition_from_row, layout_from_row};

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

async fn test_pool() -> Option<PgPool> {
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        return None;
    };

    let pool = match PgPoolOptions::new()
        .max_connections(2)
        .connect(database_url.as_str())
        .await
    {
        Ok(pool) => pool,
        Err(error) => panic!("failed to connect to DATABASE_URL in test: {error}"),
    };

    if let Err(error) = MIGRATOR.run(&pool).await {
        panic!("failed to run migrations for postgres form tests: {error}");
    }

    Some(pool)
}

fn inspection_snapshot(suffix: &str) -> FormSnapshot {
    serde_json::from_value(json!({
        "columns": [
            { "id": format!("voltage-ok-{suffix}"), "name": format!("voltageOk{suffix}"), "type": "checkbox", "schema": {} },
            { "id": format!("reason-{suffix}"), "name": format!("reason{suffix}"), "type": "text", "schema": {} }
        ],
        "layouts": [
            { "id": format!("form-{suffix}"), "type": "group", "name": "Inspection", "schema": {} },
            { "id": format!("ok-input-{suffix}"), "type": "input", "layoutId": format!("form-{suffix}"), "columnId": format!("voltage-ok-{suffix}"), "order": 1 },
            { "id": format!("reason-input-{suffix}"), "type": "input", "layoutId": format!("form-{suffix}"), "columnId": format!("reason-{suffix}"), "order": 2, "required": true }
        ],
        "conditions": [
            {
                "id": format!("cond-{suffix}"),
                "type": "equals",
                "value": "false",
                "valueColumnId": format!("voltage-ok-{suffix}"),
                "effect": "show",
                "effectLayoutId": format!("reason-input-{suffix}")
            }
        ],
        "forms": [ { "id": format!("form-{suffix}"), "name": "Inspection" } ],
        "rows": [ { "id": format!("row-{suffix}"), "formId": format!("form-{suffix}") } ]
    }))
    .unwrap_or_else(|_| unreachable!())
}

#[tokio::test]
async fn imported_snapshot_round_trips_through_load() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let suffix = CellId::generate().to_string();
    let repository = PostgresFormRepository::new(pool);
    let imported = repository
        .import_snapshot(&inspection_snapshot(&suffix))
        .await;
    assert!(imported.is_ok());

    let snapshot = repository.load_snapshot().await;
    assert!(snapshot.is_ok());
    let snapshot = snapshot.unwrap_or_else(|_| unreachable!());

    let reason_input = snapshot
        .layouts
        .iter()
        .find(|layout| layout.id().as_str() == format!("reason-input-{suffix}"));
    assert!(reason_input.is_some_and(|layout| layout.required().is_required()
        && layout.order() == Some(2)));

    let condition = snapshot
        .conditions
        .iter()
        .find(|condition| condition.id().as_str() == format!("cond-{suffix}"));
    assert!(condition.is_some_and(|condition| condition.value() == Some("false")
        && condition.effect().is_some()));

    let form_id = FormId::new(format!("form-{suffix}")).unwrap_or_else(|_| unreachable!());
    assert_eq!(snapshot.rows_for_form(&form_id).len(), 1);
}

#[tokio::test]
async fn save_cell_upserts_on_natural_key() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let suffix = CellId::generate().to_string();
    let repository = PostgresFormRepository::new(pool);
    assert!(
        repository
            .import_snapshot(&inspection_snapshot(&suffix))
            .await
            .is_ok()
    );

    let write = |data: &str| CellWrite {
        form_id: FormId::new(format!("form-{suffix}")).unwrap_or_else(|_| unreachable!()),
        row_id: Some(RowId::new(format!("row-{suffix}")).unwrap_or_else(|_| unreachable!())),
        column_id: ColumnId::new(format!("reason-{suffix}")).unwrap_or_else(|_| unreachable!()),
        data: data.to_owned(),
    };

    let first = repository.save_cell(write("loose wire")).await;
    let second = repository.save_cell(write("replaced fuse")).await;
    assert!(first.is_ok());
    assert!(second.is_ok());

    let first = first.unwrap_or_else(|_| unreachable!());
    let second = second.unwrap_or_else(|_| unreachable!());
    assert_eq!(first.id(), second.id());
    assert_eq!(second.data(), "replaced fuse");
    assert!(second.updated_at().is_some());

    let snapshot = repository.load_snapshot().await;
    assert!(snapshot.is_ok());
    let matching = snapshot
        .unwrap_or_else(|_| unreachable!())
        .cells
        .into_iter()
        .filter(|cell| cell.column_id().as_str() == format!("reason-{suffix}"))
        .count();
    assert_eq!(matching, 1);
}

#[tokio::test]
async fn form_wide_cells_share_one_slot() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let suffix = CellId::generate().to_string();
    let repository = PostgresFormRepository::new(pool);
    assert!(
        repository
            .import_snapshot(&inspection_snapshot(&suffix))
            .await
            .is_ok()
    );

    for data in ["true", "false"] {
        let saved = repository
            .save_cell(CellWrite {
                form_id: FormId::new(format!("form-{suffix}")).unwrap_or_else(|_| unreachable!()),
                row_id: None,
                column_id: ColumnId::new(format!("voltage-ok-{suffix}"))
                    .unwrap_or_else(|_| unreachable!()),
                data: data.to_owned(),
            })
            .await;
        assert!(saved.is_ok());
    }

    let listed = repository.list_forms().await;
    assert!(listed.is_ok());
    assert!(
        listed
            .unwrap_or_else(|_| unreachable!())
            .iter()
            .any(|form| form.id().as_str() == format!("form-{suffix}"))
    );

    let snapshot = repository
        .load_snapshot()
        .await
        .unwrap_or_else(|_| unreachable!());
    let form_wide: Vec<_> = snapshot
        .cells
        .iter()
        .filter(|cell| cell.column_id().as_str() == format!("voltage-ok-{suffix}"))
        .collect();
    assert_eq!(form_wide.len(), 1);
    assert_eq!(form_wide[0].data(), "false");
}

#[test]
fn self_parented_rows_convert_for_the_tree_builder() {
    let layout = layout_from_row(LayoutRow {
        id: "loop".to_owned(),
        name: None,
        layout_type: "group".to_owned(),
        schema: None,
        sort_order: None,
        required: None,
        layout_id: Some("loop".to_owned()),
        column_id: None,
    })
    .unwrap_or_else(|_| unreachable!());
    assert_eq!(layout.parent_id().map(|id| id.as_str()), Some("loop"));

    let condition = condition_from_row(ConditionRow {
        id: "c".to_owned(),
        condition_type: "and".to_owned(),
        value: None,
        value_column_id: None,
        effect: None,
        effect_layout_id: None,
        parent_condition_id: Some("c".to_owned()),
    })
    .unwrap_or_else(|_| unreachable!());
    assert_eq!(condition.parent_id().map(|id| id.as_str()), Some("c"));
}
