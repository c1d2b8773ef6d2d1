pub mod document_steps;
