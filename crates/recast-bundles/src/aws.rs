//! AWS credentials

use recast_model::{Bundle, Value};

/// `access_key_id`, `secret_access_key` and `region`, all default none
#[must_use]
pub fn with_aws() -> Bundle {
    Bundle::new("WithAws")
        .field("access_key_id", Value::None)
        .field("secret_access_key", Value::None)
        .field("region", Value::None)
}
