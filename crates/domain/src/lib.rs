//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod cell;
mod column;
mod condition;
mod form;
mod json_schema;
mod layout;
mod reference;
mod row;
mod snapshot;

pub use cell::{ApiCellData, Cell, decoded_text};
pub use column::{
    ApiMethod, ApiRequestSchema, ApiResponseSchema, ApiSchema, CheckboxSchema, Column,
    ColumnSchema, ColumnType, DropdownOption, DropdownSchema, GpsSchema, NumberSchema,
    SignatureSchema, StarSchema, TextSchema,
};
pub use condition::{Condition, ConditionType, Effect, EffectDeclaration};
pub use form::Form;
pub use json_schema::{JsonSchema, SchemaViolation};
pub use layout::{
    AccordionSchema, ContainerSchema, DescriptionSchema, Layout, LayoutKind, LayoutType,
    PictureSchema, RequiredState,
};
pub use reference::{Reference, TemplateSegment, parse_template};
pub use row::Row;
pub use snapshot::FormSnapshot;
