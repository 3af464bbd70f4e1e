pub(crate) mod encode;
#[cfg(feature = "remote")]
pub(crate) mod http;
pub(crate) mod preset;
pub(crate) mod remote;
