use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SendMessagePayload {
    #[validate(
        length(min = 1, max = 2000),
        custom(function = "crate::utils::validation::not_blank")
    )]
    pub message: String,
}
