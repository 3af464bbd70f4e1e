pub(crate) mod layout;
pub(crate) mod prefs;
pub(crate) mod store;
