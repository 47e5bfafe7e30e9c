use std::error::Error;
use std::fmt::{Display, Formatter};

pub type DojoResult<T> = Result<T, DojoError>;
pub type TableResult<T> = DojoResult<T>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DojoErrorCategory {
    Success,
    InputValidation,
    IoSystem,
    Metadata,
    Internal,
}

impl DojoErrorCategory {
    pub const fn exit_code(self) -> i32 {
        match self {
            Self::Success => 0,
            Self::InputValidation => 2,
            Self::IoSystem => 3,
            Self::Metadata => 4,
            Self::Internal => 5,
        }
    }

    pub const fn category_name(self) -> &'static str {
        match self {
            Self::Success => "Success",
            Self::InputValidation => "InputValidation",
            Self::IoSystem => "IoSystem",
            Self::Metadata => "Metadata",
            Self::Internal => "Internal",
        }
    }

    pub const fn is_fatal(self) -> bool {
        !matches!(self, Self::Success)
    }
}

/// Library-wide error with a stable dotted diagnostic code, e.g.
/// `IO.TABLE_SCAN` or `META.DJREPO_SCHEMA`. The code is what CLI consumers
/// and tests key on; the message is free text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DojoError {
    category: DojoErrorCategory,
    code: &'static str,
    message: String,
}

impl DojoError {
    pub fn new(
        category: DojoErrorCategory,
        code: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self {
            category,
            code,
            message: message.into(),
        }
    }

    pub fn input_validation(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(DojoErrorCategory::InputValidation, code, message)
    }

    pub fn io_system(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(DojoErrorCategory::IoSystem, code, message)
    }

    pub fn metadata(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(DojoErrorCategory::Metadata, code, message)
    }

    pub fn internal(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(DojoErrorCategory::Internal, code, message)
    }

    pub const fn category(&self) -> DojoErrorCategory {
        self.category
    }

    pub const fn code(&self) -> &'static str {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn exit_code(&self) -> i32 {
        self.category.exit_code()
    }

    pub fn diagnostic_line(&self) -> String {
        let severity = if self.category.is_fatal() {
            "ERROR"
        } else {
            "INFO"
        };
        format!("{}: [{}] {}", severity, self.code, self.message)
    }
}

impl Display for DojoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} [{}] {}",
            self.category.category_name(),
            self.code,
            self.message
        )
    }
}

impl Error for DojoError {}
