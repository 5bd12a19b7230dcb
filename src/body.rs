/*! Defines the rigid bodies that are connected by joints */

use crate::RBInertia;

/// Identifier of a body in a [crate::MultiBodyGraph]
pub type BodyId = i32;

/// A named rigid body carrying its spatial inertia (expressed in the body frame).
#[derive(Debug, Clone, PartialEq)]
pub struct Body {
    inertia: RBInertia,
    id: BodyId,
    name: String,
}

impl Body {
    pub fn new(inertia: RBInertia, id: BodyId, name: impl Into<String>) -> Self {
        Self {
            inertia,
            id,
            name: name.into(),
        }
    }

    pub fn id(&self) -> BodyId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn inertia(&self) -> &RBInertia {
        &self.inertia
    }

    /// Same body with a different inertia, used when welded bodies are merged.
    pub(crate) fn with_inertia(&self, inertia: RBInertia) -> Self {
        Self {
            inertia,
            id: self.id,
            name: self.name.clone(),
        }
    }
}
