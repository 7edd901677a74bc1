mod domain;
pub use domain::{Env, ExecContext};

mod error;
pub use error::{ModelError, ModelResult};

mod limit;
pub use limit::{DEFAULT_MERGE_LIMIT, Limit};
