use std::num::NonZeroUsize;

use formloom_core::{AppError, AppResult, ColumnId, FormId, LayoutId, RowId};
use formloom_domain::{
    ApiCellData, Column, ColumnSchema, ColumnType, FormSnapshot, Layout, LayoutKind,
    RequiredState, decoded_text,
};
use tracing::warn;

use super::{
    ConditionEvaluator, EffectResolver, EffectiveValue, EvaluationScope, FieldState,
    FormEngineError, Forest, ReferenceResolver, ValueStore,
};

/// Effective value attached to an input node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewValue {
    /// No stored value.
    NoValue,
    /// Value stored for the assembled row.
    Row(String),
    /// Form-wide value.
    Form(String),
}

impl ViewValue {
    fn from_effective(value: EffectiveValue<'_>) -> Self {
        match value {
            EffectiveValue::Row(cell) => Self::Row(cell.data().to_owned()),
            EffectiveValue::Form(cell) => Self::Form(cell.data().to_owned()),
            EffectiveValue::NoValue => Self::NoValue,
        }
    }

    /// Returns the stored data.
    #[must_use]
    pub fn data(&self) -> Option<&str> {
        match self {
            Self::Row(data) | Self::Form(data) => Some(data.as_str()),
            Self::NoValue => None,
        }
    }
}

/// Column bound to an input node.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnBinding {
    /// Column id.
    pub column_id: ColumnId,
    /// Unique column name.
    pub name: String,
    /// Column settings.
    pub schema: ColumnSchema,
}

impl ColumnBinding {
    fn from_column(column: &Column) -> Self {
        Self {
            column_id: column.id().clone(),
            name: column.name().as_str().to_owned(),
            schema: column.schema().clone(),
        }
    }

    /// Returns the column type.
    #[must_use]
    pub fn column_type(&self) -> ColumnType {
        self.schema.column_type()
    }
}

/// Annotated layout node ready for rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutView {
    /// Layout id.
    pub layout_id: LayoutId,
    /// Optional display name.
    pub name: Option<String>,
    /// Layout payload.
    pub kind: LayoutKind,
    /// Bound column for input nodes.
    pub column: Option<ColumnBinding>,
    /// Input node whose `ColumnId` names no column.
    pub unresolved_column: bool,
    /// Whether the node is rendered.
    pub visible: bool,
    /// Whether the node accepts edits.
    pub enabled: bool,
    /// Final requiredness.
    pub required: RequiredState,
    /// Effective value for input nodes.
    pub value: ViewValue,
    /// Children in sibling order.
    pub children: Vec<LayoutView>,
}

impl LayoutView {
    fn is_unsatisfied(&self) -> bool {
        if self.required != RequiredState::Required {
            return false;
        }
        if self.unresolved_column {
            return true;
        }
        if !self.visible {
            return false;
        }
        let Some(column) = &self.column else {
            return false;
        };
        let Some(data) = self.value.data() else {
            return true;
        };

        if column.column_type() == ColumnType::Api {
            return !ApiCellData::parse(data).is_ok_and(|payload| payload.has_response());
        }

        decoded_text(data).trim().is_empty()
    }
}

/// Assembled view model of one form for one row.
#[derive(Debug, Clone, PartialEq)]
pub struct FormView {
    /// Assembled form.
    pub form_id: FormId,
    /// Assembled row, `None` for form-wide assembly.
    pub row_id: Option<RowId>,
    /// Top-level layout node.
    pub root: LayoutView,
}

impl FormView {
    /// Returns every node depth-first in sibling order.
    #[must_use]
    pub fn nodes(&self) -> Vec<&LayoutView> {
        let mut ordered = Vec::new();
        let mut stack = vec![&self.root];
        while let Some(node) = stack.pop() {
            ordered.push(node);
            stack.extend(node.children.iter().rev());
        }
        ordered
    }

    /// Returns the node for a layout id.
    #[must_use]
    pub fn find(&self, layout_id: &str) -> Option<&LayoutView> {
        self.nodes()
            .into_iter()
            .find(|node| node.layout_id.as_str() == layout_id)
    }

    /// Lists visible required inputs that still lack a usable value, plus
    /// required inputs bound to an unknown column.
    #[must_use]
    pub fn unsatisfied_required(&self) -> Vec<&LayoutView> {
        self.nodes()
            .into_iter()
            .filter(|node| node.is_unsatisfied())
            .collect()
    }
}

/// Builds per-row view models from one snapshot.
///
/// Trees and indexes are built once; each assembly is a read-only pass, so
/// one assembler can serve many rows concurrently.
#[derive(Debug)]
pub struct FormAssembler<'a> {
    snapshot: &'a FormSnapshot,
    layouts: Forest<'a, Layout>,
    evaluator: ConditionEvaluator<'a>,
    effects: EffectResolver<'a>,
}

impl<'a> FormAssembler<'a> {
    /// Builds layout and condition trees and value indexes for a snapshot.
    pub fn new(snapshot: &'a FormSnapshot) -> Self {
        let layouts = Forest::build(&snapshot.layouts);
        let conditions = Forest::build(&snapshot.conditions);
        let effects = EffectResolver::new(&conditions);
        let resolver =
            ReferenceResolver::new(&snapshot.columns, ValueStore::new(&snapshot.cells));

        for layout in layouts.records() {
            if let Some(column_id) = layout.column_id()
                && resolver.column(column_id).is_none()
            {
                warn!(
                    layout_id = layout.id().as_str(),
                    column_id = column_id.as_str(),
                    "input layout references an unknown column, emitting it hidden"
                );
            }
        }

        Self {
            snapshot,
            layouts,
            evaluator: ConditionEvaluator::new(conditions, resolver),
            effects,
        }
    }

    /// Returns issues found while building the layout and condition trees.
    #[must_use]
    pub fn issues(&self) -> Vec<&FormEngineError> {
        self.layouts
            .issues()
            .iter()
            .chain(self.evaluator.conditions().issues())
            .collect()
    }

    /// Assembles one form for one row, or form-wide when `row_id` is `None`.
    pub fn assemble(&self, form_id: &FormId, row_id: Option<&RowId>) -> AppResult<FormView> {
        let root = self
            .layouts
            .get(form_id.as_str())
            .ok_or_else(|| AppError::NotFound(format!("form '{form_id}' does not exist")))?;
        if !self.layouts.is_root(form_id.as_str()) {
            return Err(AppError::Validation(format!(
                "layout '{form_id}' is not a top-level form"
            )));
        }

        if let Some(row_id) = row_id {
            let row = self
                .snapshot
                .rows
                .iter()
                .find(|row| row.id() == row_id)
                .ok_or_else(|| AppError::NotFound(format!("row '{row_id}' does not exist")))?;
            if !row.belongs_to(form_id) {
                return Err(AppError::Validation(format!(
                    "row '{row_id}' belongs to another form"
                )));
            }
        }

        let scope = EvaluationScope::new(form_id, row_id);
        Ok(FormView {
            form_id: form_id.clone(),
            row_id: row_id.cloned(),
            root: self.assemble_node(root, scope, false),
        })
    }

    /// Assembles many rows of one form in parallel, keeping input order.
    pub fn assemble_rows(&self, form_id: &FormId, row_ids: &[RowId]) -> Vec<AppResult<FormView>> {
        if row_ids.is_empty() {
            return Vec::new();
        }

        let workers = std::thread::available_parallelism()
            .map(NonZeroUsize::get)
            .unwrap_or(1);
        let chunk_size = row_ids.len().div_ceil(workers);

        std::thread::scope(|scope| {
            let handles = row_ids
                .chunks(chunk_size)
                .map(|chunk| {
                    let handle = scope.spawn(move || {
                        chunk
                            .iter()
                            .map(|row_id| self.assemble(form_id, Some(row_id)))
                            .collect::<Vec<_>>()
                    });
                    (chunk.len(), handle)
                })
                .collect::<Vec<_>>();

            handles
                .into_iter()
                .flat_map(|(len, handle)| {
                    handle.join().unwrap_or_else(|_| {
                        (0..len)
                            .map(|_| Err(AppError::Internal("row assembly panicked".to_owned())))
                            .collect()
                    })
                })
                .collect()
        })
    }

    fn assemble_node(
        &self,
        layout: &'a Layout,
        scope: EvaluationScope<'_>,
        inside_hidden: bool,
    ) -> LayoutView {
        let resolver = self.evaluator.resolver();
        let column = layout
            .column_id()
            .and_then(|column_id| resolver.column(column_id));
        let unresolved_column = layout.column_id().is_some() && column.is_none();

        let state = if inside_hidden || unresolved_column {
            FieldState::suppressed(layout)
        } else {
            self.effects.resolve(layout, &self.evaluator, scope)
        };
        let value = column.map_or(ViewValue::NoValue, |column| {
            ViewValue::from_effective(resolver.values().resolve(
                column.id(),
                scope.row_id,
                scope.form_id,
            ))
        });

        let hides_children = inside_hidden || !state.visible;
        let children = self
            .layouts
            .children(layout.id().as_str())
            .map(|child| self.assemble_node(child, scope, hides_children))
            .collect();

        LayoutView {
            layout_id: layout.id().clone(),
            name: layout.name().map(str::to_owned),
            kind: layout.kind().clone(),
            column: column.map(ColumnBinding::from_column),
            unresolved_column,
            visible: state.visible,
            enabled: state.enabled,
            required: state.required,
            value,
            children,
        }
    }
}
