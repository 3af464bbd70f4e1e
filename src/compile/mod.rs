pub(crate) mod compiler;
pub(crate) mod plan;
