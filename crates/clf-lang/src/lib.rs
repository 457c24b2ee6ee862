pub mod auth;
mod checker;
mod compiler;
mod emit;
pub mod endpoint;
mod error;
pub mod explain;
pub mod fluentd;
pub mod ir;
pub mod labels;
pub mod normalize;
pub mod routes;
pub mod template;
pub mod vector;

pub use auth::{AuthState, resolve_auth};
pub use checker::{CheckError, CheckKind, check_dialect, check_forwarder, dialect_supports};
pub use compiler::{check_spec, compile_forwarder};
pub use error::{CompileError, CompileReason, CompileResult};
pub use explain::{RouteExplanation, explain_routes};
pub use normalize::normalize;
pub use routes::{PlanRoutes, plan_routes};
