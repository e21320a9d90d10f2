pub mod browser;
pub mod fetcher;
pub mod http;
pub mod web;
