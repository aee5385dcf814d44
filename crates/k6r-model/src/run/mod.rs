mod status;
pub use status::RunStatus;

mod outcome;
pub use outcome::RunOutcome;

mod record;
pub use record::RunRecord;

mod request;
pub use request::StartRunRequest;
