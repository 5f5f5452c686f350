//! 数据模型

mod api;
mod enhance;

pub use api::{CreditsResponse, EnhanceResponse, GrantCreditsRequest};
pub use enhance::{
    EnhanceMode, EnhancementRequest, EnhancementResult, EnhancementSource, FlowAnswers,
    StructuredForm,
};
