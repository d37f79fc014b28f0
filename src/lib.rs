pub mod app;
pub mod classify;
pub mod config;
pub mod domain;
pub mod ena;
pub mod error;
pub mod jsonld;
pub mod output;
pub mod rdf;
pub mod search;
pub mod sink;
pub mod slug;
pub mod template;
pub mod uniprot;
pub mod validity;
