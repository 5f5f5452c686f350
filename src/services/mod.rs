//! 服务层模块

mod credit_service;
mod enhance_service;
pub(crate) mod prompt_service;

pub use credit_service::{CreditError, CreditLedger};
pub use enhance_service::{EnhanceError, EnhanceService};
