//! Excuse REST Service
//!
//! Exposes excuse generation and content management as a REST API.
//!
//! ## Endpoints
//!
//! - `GET /api/excuses/random` - Simple excuse
//! - `GET /api/excuses/meme` | `/law` | `/ultra` - Enriched excuses
//! - `GET /api/excuses/role/:role` - Excuse tailored for a role
//! - `GET /api/excuses/daily?date=YYYY-MM-DD` - Excuse of the day
//! - `GET /api/excuses/:id` - Stored excuse, resolved
//! - `GET /api/excuses` / `POST /api/excuses` - List / manual construction
//! - `/api/fragments`, `/api/memes`, `/api/laws` - CRUD with filters
//! - `GET /api/roles`, `GET /api/roles/:role` - Supported roles
//! - `GET /health`, `/health/live`, `/health/ready` - Health probes

pub mod middleware;
pub mod routes;
pub mod state;

pub use middleware::{metrics_middleware, normalize_path, record_excuse_metric};
pub use routes::{create_router, ErrorResponse, ExcuseRefs, ExcuseResponse};
pub use state::ServiceState;
