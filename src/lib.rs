pub mod auth;
pub mod directory;
pub mod error;
pub mod export;
pub mod ids;
pub mod ledger;
pub mod view;
pub mod web;
