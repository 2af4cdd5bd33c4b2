// dagster module: GraphQL access to a Dagster web server

pub mod client;
pub mod graphql;

pub use client::DagsterClient;
