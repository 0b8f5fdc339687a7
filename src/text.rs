pub(crate) mod layout;
pub(crate) mod measure;
pub(crate) mod ruby;
