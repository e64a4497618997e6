// Library exports for chartforge

pub mod compiler;
pub mod config;
pub mod document;
pub mod error;
pub mod gazetteer;
pub mod hooks;
pub mod logging;
pub mod model;
pub mod normalize;
pub mod notify;
pub mod parser;
pub mod raster;
pub mod region;
pub mod runtime;
pub mod store;
pub mod tools;

pub use compiler::{compile, ConfigTree};
pub use config::AppConfig;
pub use error::{ChartError, Result};
pub use model::{ChartBody, ChartKind, ChartSpec, Labels};
pub use normalize::{normalize, ChartInput};
pub use region::{resolve_map_level, MapLevel};
pub use runtime::{ChartRenderer, RenderOutcome};
pub use tools::{ToolRegistry, ToolResponse};
