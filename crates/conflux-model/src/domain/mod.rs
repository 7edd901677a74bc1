mod context;
pub use context::ExecContext;

mod env;
pub use env::Env;
