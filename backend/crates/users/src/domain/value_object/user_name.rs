//! User Name Value Object
//!
//! ユーザー名は、ユーザーレコードに付く**表示名**。
//! 一覧表示とレコード作成時の入力に使用される。
//!
//! ## 設計方針
//! - 検証は入力を変換しない（純粋なチェック）
//! - 保存する値（入力そのまま / 前後空白除去）は [`NamePolicy`] で決める
//! - 長さは Unicode スカラー値（`char`）単位で数える
//!
//! ## 不変条件
//! - 前後の空白を除いて空でないこと
//! - 長さ: 最大50文字（空白除去前の入力で判定）

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Constants
// ============================================================================

/// Maximum length for user name (in characters)
pub const USER_NAME_MAX_LENGTH: usize = 50;

// ============================================================================
// Error Types
// ============================================================================

/// Error returned when user name validation fails
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserNameError {
    /// Empty, or whitespace only
    Required,

    /// Longer than USER_NAME_MAX_LENGTH
    TooLong { length: usize, max: usize },
}

impl fmt::Display for UserNameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Required => write!(f, "name required"),
            Self::TooLong { .. } => write!(f, "name too long"),
        }
    }
}

impl std::error::Error for UserNameError {}

// ============================================================================
// Name Policy
// ============================================================================

/// What gets persisted once a name passes validation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NamePolicy {
    /// Store the input exactly as given
    #[default]
    Raw,
    /// Store the input with surrounding whitespace removed
    Trimmed,
}

impl NamePolicy {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "raw" => Some(Self::Raw),
            "trimmed" | "trim" => Some(Self::Trimmed),
            _ => None,
        }
    }
}

// ============================================================================
// UserName Value Object
// ============================================================================

/// Validated user name
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserName(String);

impl UserName {
    /// Validate raw input and keep it unchanged
    pub fn new(input: impl Into<String>) -> Result<Self, UserNameError> {
        let input = input.into();
        Self::validate(&input)?;
        Ok(Self(input))
    }

    /// Validate raw input, then apply the storage policy
    pub fn with_policy(input: impl Into<String>, policy: NamePolicy) -> Result<Self, UserNameError> {
        let name = Self::new(input)?;
        Ok(match policy {
            NamePolicy::Raw => name,
            NamePolicy::Trimmed => Self(name.0.trim().to_string()),
        })
    }

    /// Check a candidate name without building a value
    pub fn validate(input: &str) -> Result<(), UserNameError> {
        if input.trim().is_empty() {
            return Err(UserNameError::Required);
        }

        let length = input.chars().count();
        if length > USER_NAME_MAX_LENGTH {
            return Err(UserNameError::TooLong {
                length,
                max: USER_NAME_MAX_LENGTH,
            });
        }

        Ok(())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[inline]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Debug for UserName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("UserName").field(&self.0).finish()
    }
}

impl fmt::Display for UserName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for UserName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for UserName {
    type Error = UserNameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for UserName {
    type Error = UserNameError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<UserName> for String {
    fn from(name: UserName) -> Self {
        name.0
    }
}

// ============================================================================
// Tests
// ============================================================================
