//! Entity schemas for the single-table design.
//!
//! Every entity type owns one partition of the store. Its schema declares
//! the caller-writable attributes; system attributes (`PK`, `SK`, `id`,
//! timestamps) are assigned by the API and rejected in input.

use serde_json::{Map, Value};

use crate::error::ValidationError;
use crate::types::SYSTEM_ATTRIBUTES;

/// The type of a caller-writable attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrType {
    String,
}

impl AttrType {
    fn name(self) -> &'static str {
        match self {
            AttrType::String => "string",
        }
    }

    fn matches(self, value: &Value) -> bool {
        match self {
            AttrType::String => value.is_string(),
        }
    }
}

/// A caller-writable attribute definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeDef {
    pub name: &'static str,
    pub attr_type: AttrType,
    pub required: bool,
}

const fn required(name: &'static str) -> AttributeDef {
    AttributeDef {
        name,
        attr_type: AttrType::String,
        required: true,
    }
}

const fn optional(name: &'static str) -> AttributeDef {
    AttributeDef {
        name,
        attr_type: AttrType::String,
        required: false,
    }
}

/// Static description of one entity type.
#[derive(Debug, PartialEq, Eq)]
pub struct EntitySchema {
    /// Display name, used in error messages (`Noticia "<id>" not found.`).
    pub name: &'static str,
    /// Plural form accepted when resolving entity names.
    pub plural: &'static str,
    /// Partition key shared by all records of this entity.
    pub partition: &'static str,
    pub attributes: &'static [AttributeDef],
}

pub static NOTICIA: EntitySchema = EntitySchema {
    name: "Noticia",
    plural: "Noticias",
    partition: "Noticia",
    attributes: &[
        required("title"),
        required("subtitle"),
        optional("description"),
        optional("mainImage"),
    ],
};

pub static SLIDER: EntitySchema = EntitySchema {
    name: "Slider",
    plural: "Sliders",
    partition: "Slider",
    attributes: &[
        required("title"),
        optional("description"),
        optional("coverImage"),
    ],
};

/// All entity types served by the API.
pub static ENTITIES: &[&EntitySchema] = &[&NOTICIA, &SLIDER];

/// Resolve an entity by singular or plural name, case-insensitively.
pub fn lookup(name: &str) -> Result<&'static EntitySchema, ValidationError> {
    ENTITIES
        .iter()
        .copied()
        .find(|schema| {
            schema.name.eq_ignore_ascii_case(name) || schema.plural.eq_ignore_ascii_case(name)
        })
        .ok_or_else(|| ValidationError::UnknownEntity(name.to_string()))
}

impl EntitySchema {
    pub fn attribute(&self, name: &str) -> Option<&AttributeDef> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Validate the input of a create operation and return its attributes.
    ///
    /// Null values are dropped; every required attribute must remain.
    pub fn validate_create(&self, input: Value) -> Result<Map<String, Value>, ValidationError> {
        let mut fields = self.validate_fields(input)?;
        fields.retain(|_, v| !v.is_null());
        for attr in self.attributes.iter().filter(|a| a.required) {
            if !fields.contains_key(attr.name) {
                return Err(ValidationError::MissingAttribute {
                    entity: self.name.to_string(),
                    attribute: attr.name.to_string(),
                });
            }
        }
        Ok(fields)
    }

    /// Validate the input of an update operation.
    ///
    /// The returned map may contain nulls, which remove optional attributes
    /// when merged. Required attributes cannot be nulled.
    pub fn validate_update(&self, input: Value) -> Result<Map<String, Value>, ValidationError> {
        let fields = self.validate_fields(input)?;
        for (name, value) in &fields {
            if value.is_null() && self.attribute(name).is_some_and(|a| a.required) {
                return Err(ValidationError::MissingAttribute {
                    entity: self.name.to_string(),
                    attribute: name.clone(),
                });
            }
        }
        Ok(fields)
    }

    fn validate_fields(&self, input: Value) -> Result<Map<String, Value>, ValidationError> {
        let Value::Object(fields) = input else {
            return Err(ValidationError::NotAnObject {
                entity: self.name.to_string(),
            });
        };

        for (name, value) in &fields {
            if SYSTEM_ATTRIBUTES.contains(&name.as_str()) {
                return Err(ValidationError::ReservedAttribute {
                    entity: self.name.to_string(),
                    attribute: name.clone(),
                });
            }
            let attr = self
                .attribute(name)
                .ok_or_else(|| ValidationError::UnknownAttribute {
                    entity: self.name.to_string(),
                    attribute: name.clone(),
                })?;
            if !value.is_null() && !attr.attr_type.matches(value) {
                return Err(ValidationError::TypeMismatch {
                    entity: self.name.to_string(),
                    attribute: name.clone(),
                    expected: attr.attr_type.name(),
                });
            }
        }

        Ok(fields)
    }
}
