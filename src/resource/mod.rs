//! Resource descriptors: form + table schema bound to one entity, and the
//! registry the generic CRUD engine reads them from.

pub mod descriptor;
pub mod form;
pub mod pages;
pub mod registry;
pub mod table;
pub mod validator;

pub use descriptor::{Navigation, QueryScope, ResourceDescriptor};
pub use form::{FormField, FormSchema, InputType, SelectOption, Widget};
pub use pages::{PageKind, Pages, Redirect};
pub use registry::Registry;
pub use table::{
    BulkAction, ColumnFormat, ColumnKind, DefaultSort, PageSize, Pagination, RowAction, SortDirection, TableColumn,
    TableFilter, FilterKind, TableSchema,
};
pub use validator::validate;
