pub(crate) mod coords;
pub(crate) mod fit;
pub(crate) mod shapes;
