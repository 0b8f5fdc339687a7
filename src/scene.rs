pub(crate) mod compositor;
pub(crate) mod content;
pub(crate) mod document;
pub(crate) mod model;
pub(crate) mod overlay;
pub(crate) mod scale;
