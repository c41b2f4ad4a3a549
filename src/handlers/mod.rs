pub mod data;
pub mod find;
pub mod platform;
pub mod system;
pub mod whoami;

/// Fans a collection name out to the matching typed operation, or 404s for
/// names that are not part of the API.
macro_rules! dispatch {
    ($collection:expr, $op:ident($($args:expr),* $(,)?)) => {
        match $collection.as_str() {
            "customers" => $op::<$crate::database::models::Customer>($($args),*).await,
            "appointments" => $op::<$crate::database::models::Appointment>($($args),*).await,
            "services" => $op::<$crate::database::models::Service>($($args),*).await,
            other => Err($crate::error::ApiError::not_found(format!(
                "Unknown collection: {}",
                other
            ))),
        }
    };
}
pub(crate) use dispatch;
