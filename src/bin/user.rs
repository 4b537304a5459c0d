use observability_demo::app::{self, BoxError};
use observability_demo::services::Service;

fn main() -> Result<(), BoxError> {
    app::run(Service::User)
}
