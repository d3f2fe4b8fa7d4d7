// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Schema provider capability.
//
// The filter compiler consumes schema metadata through this narrow trait
// only. Implementations must be read-only after construction so a single
// provider can serve any number of concurrent compilations.

use std::sync::Arc;

use crate::{PropertyDescriptor, TypeClass};

/// Read-only source of type metadata.
pub trait SchemaProvider: Send + Sync {
    /// Describe `property` on the named `owner` type, or `None` if the
    /// owner is unknown or has no such property.
    fn describe(&self, owner: &str, property: &str) -> Option<PropertyDescriptor>;

    /// Classification of a named type, `None` when the type is not registered.
    fn type_class(&self, type_name: &str) -> Option<TypeClass>;
}

impl<T: SchemaProvider + ?Sized> SchemaProvider for &T {
    fn describe(&self, owner: &str, property: &str) -> Option<PropertyDescriptor> {
        (**self).describe(owner, property)
    }

    fn type_class(&self, type_name: &str) -> Option<TypeClass> {
        (**self).type_class(type_name)
    }
}

impl<T: SchemaProvider + ?Sized> SchemaProvider for Arc<T> {
    fn describe(&self, owner: &str, property: &str) -> Option<PropertyDescriptor> {
        (**self).describe(owner, property)
    }

    fn type_class(&self, type_name: &str) -> Option<TypeClass> {
        (**self).type_class(type_name)
    }
}
