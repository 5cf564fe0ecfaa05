pub mod get_document;
pub mod index_document;
pub mod search_documents;
pub mod update_score;
