mod domain;
pub use domain::{ENV_COMPATIBILITY_MODE, ENV_PROM_RW_SERVER_URL, PARAM_BASE_URL};
pub use domain::{Env, KeyValue, Params, RunId};

mod error;
pub use error::{ModelError, ModelResult};

mod run;
pub use run::{RunOutcome, RunRecord, RunStatus, StartRunRequest};
