//! Chart of accounts classification.

pub mod types;

pub use types::{
    ChartAccountStatus, ChartAccountType, ChartOfAccount, ChartUsage, CreateChartAccountInput,
    NormalBalance, UpdateChartAccountInput, validate_code,
};
