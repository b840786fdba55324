pub(crate) mod aem;
pub(crate) mod da;
pub(crate) mod email;
pub(crate) mod github;
pub(crate) mod ims;
