pub(crate) mod command;
pub(crate) mod editor;
pub(crate) mod gesture;
pub(crate) mod scheduler;
