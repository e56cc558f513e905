//! Schema steps applied to the legacy source database.

mod m001_mapping_columns;

pub use m001_mapping_columns::M001MappingColumns;

use crate::schema::Register;

pub fn create_register() -> Register {
    Register::new("legacy").register(M001MappingColumns)
}
