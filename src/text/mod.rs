pub(crate) mod autofit;
pub(crate) mod effects;
pub(crate) mod measure;
pub(crate) mod wrap;
