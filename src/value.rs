use std::borrow::Cow;

/// A context value.
///
/// Context entries are plain strings; this type only collects the
/// conversions that produce them.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContextValue(pub(crate) String);

impl ContextValue {
    /// Creates a value from the [`Display`](std::fmt::Display) form of `value`.
    pub fn display<T>(value: T) -> Self
    where
        T: std::fmt::Display,
    {
        Self(value.to_string())
    }

    /// Creates a value from the [`Debug`] form of `value`.
    pub fn debug<T>(value: T) -> Self
    where
        T: std::fmt::Debug,
    {
        Self(format!("{value:?}"))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for ContextValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ContextValue {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for ContextValue {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<Cow<'_, str>> for ContextValue {
    fn from(value: Cow<'_, str>) -> Self {
        Self(value.into_owned())
    }
}

macro_rules! impl_from_display {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for ContextValue {
                fn from(value: $ty) -> Self {
                    Self(value.to_string())
                }
            }
        )*
    };
}

impl_from_display!(bool, char, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);
