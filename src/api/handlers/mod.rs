pub mod accounts;
pub mod calendar;
pub mod dashboard;
pub mod documentation;
pub mod health;
pub mod metrics;
pub mod screenshots;
pub mod strategies;
pub mod trades;
pub mod users;

use serde::Serialize;

#[derive(Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        ApiResponse {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}
