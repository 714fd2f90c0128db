pub mod app;
pub mod config;
pub mod domain;
pub mod enrich;
pub mod entrez;
pub mod error;
pub mod filter;
pub mod merge;
pub mod outfmt6;
pub mod output;
pub mod pacing;
