//! Fixture-based translation tests.

use crate::model_catalog::{EntityConfig, EntityDescriptor, EntityModel, EntityModelConfig};


/// `SomeEntity` over table `SomeEntities`: an integer key, one typed array,
/// one byte array, and a plain text column.
pub(crate) fn fixture_model() -> EntityModel {
    EntityModelConfig::default()
        .with_entity(
            EntityConfig::new("SomeEntity", "SomeEntities", "Id")
                .property("Id", "integer")
                .property("SomeArray", "integer[]")
                .property("SomeBytea", "bytea")
                .property("SomeText", "text")
                .property("SomeTextArray", "text[]"),
        )
        .to_model()
        .expect("fixture model is valid")
}

pub(crate) fn fixture_entity() -> EntityDescriptor {
    fixture_model()
        .entity("SomeEntity")
        .expect("fixture entity exists")
        .clone()
}
