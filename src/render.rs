pub(crate) mod animate;
pub(crate) mod headless;
pub(crate) mod item;
pub(crate) mod layout;
pub(crate) mod overlay;
pub(crate) mod surface;
