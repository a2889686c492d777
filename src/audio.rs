pub(crate) mod decode;
pub(crate) mod prepare;
pub(crate) mod trim;
