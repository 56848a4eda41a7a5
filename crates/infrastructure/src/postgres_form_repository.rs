use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use formloom_application::{CellWrite, FormRepository};
use formloom_core::{
    AppError, AppResult, CellId, ColumnId, ConditionId, FormId, LayoutId, RowId,
};
use formloom_domain::{
    Cell, Column, ColumnSchema, ColumnType, Condition, ConditionType, Effect, EffectDeclaration,
    Form, FormSnapshot, Layout, LayoutKind, LayoutType, RequiredState, Row,
};
use serde_json::Value;
use sqlx::{FromRow, PgPool, Postgres, Transaction};

/// PostgreSQL-backed form repository.
#[derive(Clone)]
pub struct PostgresFormRepository {
    pool: PgPool,
}

impl PostgresFormRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct ColumnRow {
    id: String,
    name: String,
    #[sqlx(rename = "type")]
    column_type: String,
    schema: Value,
}

#[derive(Debug, FromRow)]
struct LayoutRow {
    id: String,
    name: Option<String>,
    #[sqlx(rename = "type")]
    layout_type: String,
    schema: Option<Value>,
    sort_order: Option<i64>,
    required: Option<bool>,
    layout_id: Option<String>,
    column_id: Option<String>,
}

#[derive(Debug, FromRow)]
struct ConditionRow {
    id: String,
    #[sqlx(rename = "type")]
    condition_type: String,
    value: Option<String>,
    value_column_id: Option<String>,
    effect: Option<String>,
    effect_layout_id: Option<String>,
    parent_condition_id: Option<String>,
}

#[derive(Debug, FromRow)]
struct RowRow {
    id: String,
    name: Option<String>,
    form_id: Option<String>,
}

#[derive(Debug, FromRow)]
struct CellRow {
    id: String,
    column_id: String,
    row_id: Option<String>,
    form_id: String,
    data: String,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct FormRow {
    id: String,
    name: Option<String>,
}

fn column_from_row(row: ColumnRow) -> AppResult<Column> {
    let schema = ColumnSchema::from_payload(ColumnType::from_str(&row.column_type)?, row.schema)?;
    Column::new(ColumnId::new(row.id)?, row.name, schema)
}

fn layout_from_row(row: LayoutRow) -> AppResult<Layout> {
    let column_id = row.column_id.map(ColumnId::new).transpose()?;
    let kind = LayoutKind::from_payload(
        LayoutType::from_str(&row.layout_type)?,
        column_id,
        row.schema.unwrap_or(Value::Null),
    )?;

    Ok(Layout::new(
        LayoutId::new(row.id)?,
        row.name,
        kind,
        row.sort_order,
        RequiredState::from(row.required),
        row.layout_id.map(LayoutId::new).transpose()?,
    ))
}

fn condition_from_row(row: ConditionRow) -> AppResult<Condition> {
    let effect = match (row.effect, row.effect_layout_id) {
        (Some(effect), Some(target)) => Some(EffectDeclaration::new(
            Effect::from_str(&effect)?,
            LayoutId::new(target)?,
        )),
        (None, None) => None,
        _ => {
            return Err(AppError::Internal(format!(
                "condition '{}' has an incomplete effect declaration",
                row.id
            )));
        }
    };

    Ok(Condition::new(
        ConditionId::new(row.id)?,
        ConditionType::from_str(&row.condition_type)?,
        row.value,
        row.value_column_id.map(ColumnId::new).transpose()?,
        effect,
        row.parent_condition_id.map(ConditionId::new).transpose()?,
    ))
}

fn row_from_row(row: RowRow) -> AppResult<Row> {
    Ok(Row::new(
        RowId::new(row.id)?,
        row.name,
        row.form_id.map(FormId::new).transpose()?,
    ))
}

fn cell_from_row(row: CellRow) -> AppResult<Cell> {
    Ok(Cell::new(
        CellId::new(row.id)?,
        ColumnId::new(row.column_id)?,
        row.row_id.map(RowId::new).transpose()?,
        FormId::new(row.form_id)?,
        row.data,
    )
    .with_updated_at(Some(row.updated_at)))
}

fn form_from_row(row: FormRow) -> AppResult<Form> {
    Ok(Form::new(FormId::new(row.id)?, row.name))
}

async fn fetch_rows<T>(pool: &PgPool, statement: &'static str, table: &str) -> AppResult<Vec<T>>
where
    T: for<'r> FromRow<'r, sqlx::postgres::PgRow> + Send + Unpin,
{
    sqlx::query_as::<_, T>(statement)
        .fetch_all(pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load {table}: {error}")))
}

impl PostgresFormRepository {
    /// Replaces design-time records and inserts fill-time records from a
    /// snapshot in one transaction.
    pub async fn import_snapshot(&self, snapshot: &FormSnapshot) -> AppResult<()> {
        let mut transaction = self.pool.begin().await.map_err(|error| {
            AppError::Internal(format!("failed to start snapshot import transaction: {error}"))
        })?;

        for column in &snapshot.columns {
            sqlx::query(
                r#"
                INSERT INTO columns (id, name, type, schema)
                VALUES ($1, $2, $3, $4)
                ON CONFLICT (id) DO UPDATE
                SET name = EXCLUDED.name, type = EXCLUDED.type, schema = EXCLUDED.schema
                "#,
            )
            .bind(column.id().as_str())
            .bind(column.name().as_str())
            .bind(column.column_type().as_str())
            .bind(column.schema().to_payload())
            .execute(&mut *transaction)
            .await
            .map_err(|error| import_error("column", column.id().as_str(), error))?;
        }

        for layout in &snapshot.layouts {
            sqlx::query(
                r#"
                INSERT INTO layouts (id, name, type, schema, sort_order, required, layout_id, column_id)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                ON CONFLICT (id) DO UPDATE
                SET name = EXCLUDED.name,
                    type = EXCLUDED.type,
                    schema = EXCLUDED.schema,
                    sort_order = EXCLUDED.sort_order,
                    required = EXCLUDED.required,
                    layout_id = EXCLUDED.layout_id,
                    column_id = EXCLUDED.column_id
                "#,
            )
            .bind(layout.id().as_str())
            .bind(layout.name())
            .bind(layout.layout_type().as_str())
            .bind(layout.kind().to_payload())
            .bind(layout.order())
            .bind(Option::<bool>::from(layout.required()))
            .bind(layout.parent_id().map(|id| id.as_str()))
            .bind(layout.column_id().map(|id| id.as_str()))
            .execute(&mut *transaction)
            .await
            .map_err(|error| import_error("layout", layout.id().as_str(), error))?;
        }

        for condition in &snapshot.conditions {
            insert_condition(&mut transaction, condition).await?;
        }

        for form in &snapshot.forms {
            sqlx::query(
                r#"
                INSERT INTO forms (id, name) VALUES ($1, $2)
                ON CONFLICT (id) DO UPDATE SET name = EXCLUDED.name
                "#,
            )
            .bind(form.id().as_str())
            .bind(form.name())
            .execute(&mut *transaction)
            .await
            .map_err(|error| import_error("form", form.id().as_str(), error))?;
        }

        for row in &snapshot.rows {
            sqlx::query(
                r#"
                INSERT INTO rows (id, name, form_id) VALUES ($1, $2, $3)
                ON CONFLICT (id) DO UPDATE SET name = EXCLUDED.name, form_id = EXCLUDED.form_id
                "#,
            )
            .bind(row.id().as_str())
            .bind(row.name())
            .bind(row.form_id().map(|id| id.as_str()))
            .execute(&mut *transaction)
            .await
            .map_err(|error| import_error("row", row.id().as_str(), error))?;
        }

        for cell in &snapshot.cells {
            upsert_cell(
                &mut *transaction,
                cell.id().as_str(),
                &CellWrite {
                    form_id: cell.form_id().clone(),
                    row_id: cell.row_id().cloned(),
                    column_id: cell.column_id().clone(),
                    data: cell.data().to_owned(),
                },
            )
            .await?;
        }

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit snapshot import: {error}"))
        })
    }
}

fn import_error(kind: &str, id: &str, error: sqlx::Error) -> AppError {
    match &error {
        sqlx::Error::Database(database_error) if database_error.is_foreign_key_violation() => {
            AppError::Validation(format!("{kind} '{id}' references a missing record: {error}"))
        }
        sqlx::Error::Database(database_error) if database_error.is_unique_violation() => {
            AppError::Conflict(format!("{kind} '{id}' conflicts with an existing record: {error}"))
        }
        _ => AppError::Internal(format!("failed to import {kind} '{id}': {error}")),
    }
}

async fn insert_condition(
    transaction: &mut Transaction<'_, Postgres>,
    condition: &Condition,
) -> AppResult<()> {
    sqlx::query(
        r#"
        INSERT INTO conditions (id, type, value, value_column_id, effect, effect_layout_id, parent_condition_id)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        ON CONFLICT (id) DO UPDATE
        SET type = EXCLUDED.type,
            value = EXCLUDED.value,
            value_column_id = EXCLUDED.value_column_id,
            effect = EXCLUDED.effect,
            effect_layout_id = EXCLUDED.effect_layout_id,
            parent_condition_id = EXCLUDED.parent_condition_id
        "#,
    )
    .bind(condition.id().as_str())
    .bind(condition.condition_type().as_str())
    .bind(condition.value())
    .bind(condition.compare_column_id().map(|id| id.as_str()))
    .bind(condition.effect().map(|declaration| declaration.effect().as_str()))
    .bind(
        condition
            .effect()
            .map(|declaration| declaration.target_layout_id().as_str()),
    )
    .bind(condition.parent_id().map(|id| id.as_str()))
    .execute(&mut **transaction)
    .await
    .map_err(|error| import_error("condition", condition.id().as_str(), error))?;

    Ok(())
}

async fn upsert_cell<'e, E>(executor: E, id: &str, write: &CellWrite) -> AppResult<Cell>
where
    E: sqlx::Executor<'e, Database = Postgres>,
{
    let row = sqlx::query_as::<_, CellRow>(
        r#"
        INSERT INTO cells (id, column_id, row_id, form_id, data)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (form_id, (COALESCE(row_id, '')), column_id) DO UPDATE
        SET data = EXCLUDED.data,
            updated_at = now()
        RETURNING id, column_id, row_id, form_id, data, updated_at
        "#,
    )
    .bind(id)
    .bind(write.column_id.as_str())
    .bind(write.row_id.as_ref().map(|row_id| row_id.as_str()))
    .bind(write.form_id.as_str())
    .bind(write.data.as_str())
    .fetch_one(executor)
    .await
    .map_err(|error| {
        AppError::Internal(format!(
            "failed to save cell for column '{}' in form '{}': {error}",
            write.column_id, write.form_id
        ))
    })?;

    cell_from_row(row)
}

#[async_trait]
impl FormRepository for PostgresFormRepository {
    async fn load_snapshot(&self) -> AppResult<FormSnapshot> {
        let columns = fetch_rows::<ColumnRow>(
            &self.pool,
            "SELECT id, name, type, schema FROM columns ORDER BY seq",
            "columns",
        )
        .await?;
        let layouts = fetch_rows::<LayoutRow>(
            &self.pool,
            r#"
            SELECT id, name, type, schema, sort_order, required, layout_id, column_id
            FROM layouts
            ORDER BY seq
            "#,
            "layouts",
        )
        .await?;
        let conditions = fetch_rows::<ConditionRow>(
            &self.pool,
            r#"
            SELECT id, type, value, value_column_id, effect, effect_layout_id, parent_condition_id
            FROM conditions
            ORDER BY seq
            "#,
            "conditions",
        )
        .await?;
        let rows = fetch_rows::<RowRow>(
            &self.pool,
            "SELECT id, name, form_id FROM rows ORDER BY seq",
            "rows",
        )
        .await?;
        let cells = fetch_rows::<CellRow>(
            &self.pool,
            "SELECT id, column_id, row_id, form_id, data, updated_at FROM cells ORDER BY updated_at, id",
            "cells",
        )
        .await?;
        let forms = fetch_rows::<FormRow>(&self.pool, "SELECT id, name FROM forms ORDER BY id", "forms")
            .await?;

        Ok(FormSnapshot {
            columns: columns
                .into_iter()
                .map(column_from_row)
                .collect::<AppResult<_>>()?,
            layouts: layouts
                .into_iter()
                .map(layout_from_row)
                .collect::<AppResult<_>>()?,
            conditions: conditions
                .into_iter()
                .map(condition_from_row)
                .collect::<AppResult<_>>()?,
            rows: rows.into_iter().map(row_from_row).collect::<AppResult<_>>()?,
            cells: cells.into_iter().map(cell_from_row).collect::<AppResult<_>>()?,
            forms: forms.into_iter().map(form_from_row).collect::<AppResult<_>>()?,
        })
    }

    async fn save_cell(&self, write: CellWrite) -> AppResult<Cell> {
        upsert_cell(&self.pool, CellId::generate().as_str(), &write).await
    }

    async fn list_forms(&self) -> AppResult<Vec<Form>> {
        let snapshot = self.load_snapshot().await?;
        Ok(snapshot.forms())
    }
}

#[cfg(test)]
mod tests;
