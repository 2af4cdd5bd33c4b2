// engine module: Dagster backend engine

pub mod dagster;
mod interface;
mod refresh;
pub mod stub;

pub use dagster::DagsterEngine;
pub use interface::{Engine, EngineHandle, Event, Request};
pub use refresh::{RefreshScheduler, RefreshTarget};
pub use stub::StubEngine;
