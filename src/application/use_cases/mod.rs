pub mod documents;
pub mod links;
