pub(crate) mod ai;
pub(crate) mod facade;
pub(crate) mod tasks;
