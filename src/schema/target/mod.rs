//! Schema steps for the target document database.

mod m001_documents;
mod m002_lookup_indexes;

pub use m001_documents::M001Documents;
pub use m002_lookup_indexes::M002LookupIndexes;

use crate::schema::Register;

pub fn create_register() -> Register {
    Register::new("target")
        .register(M001Documents)
        .register(M002LookupIndexes)
}
