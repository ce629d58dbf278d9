pub mod cache;
pub mod classify;
pub mod cms;
pub mod config;
pub mod contact;
pub mod db;
pub mod docid;
pub mod error;
pub mod language;
pub mod pipeline;
pub mod resolve;
pub mod routes;
pub mod security;
pub mod translate;
pub mod upload;
