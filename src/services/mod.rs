pub mod auth_service;
pub mod document_service;
pub mod export_service;
pub mod generator_service;
pub mod grading_service;
pub mod parser_service;
pub mod quiz_service;
pub mod quiz_store;
pub mod result_store;
