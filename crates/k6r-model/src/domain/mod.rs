mod kv;
pub use kv::KeyValue;

mod env;
pub use env::Env;

mod params;
pub use params::Params;

mod id;
pub use id::RunId;

mod constants;
pub use constants::{ENV_COMPATIBILITY_MODE, ENV_PROM_RW_SERVER_URL, PARAM_BASE_URL};
