pub(crate) mod model;
pub(crate) mod property;
pub(crate) mod stack;
