pub(crate) mod plusplus;
pub(crate) mod uniform;
