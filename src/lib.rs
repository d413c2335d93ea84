pub mod blocking;
pub mod cli {
    pub mod parser;
}
pub mod config;
pub mod dependency;
pub mod github {
    pub mod client;
    pub mod graphql;
    pub mod issues;
    pub mod listing;
    pub mod snapshot;
}
pub mod hierarchy;
pub mod markdown_parser;
pub mod output;
pub mod report;
pub mod repository;
pub mod resolution;
pub mod run;
pub mod status;
pub mod token;
