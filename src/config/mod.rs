pub(crate) mod model;
pub(crate) mod registry;
pub(crate) mod validate;
